//! Events emitted by the client for subscribers to consume.

use crate::message::Message;

/// One line of a WHO reply, accumulated per channel and delivered as a batch
/// when the end-of-WHO marker arrives.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhoEntry {
    /// Nick on the network.
    pub nick: String,
    /// Ident.
    pub user: String,
    /// Real name.
    pub name: String,
    /// Host the user connects from.
    pub host: String,
    /// Server the user is attached to.
    pub server: String,
    /// Hop count to that server.
    pub hops: u32,
    /// Whether the user is a network operator.
    pub operator: bool,
}

/// Events delivered to subscribers, in the order the triggering lines
/// arrived. Variants that exist in a self/other pair (`Joined`/`UserJoined`,
/// `Kicked`/`UserKicked`, …) distinguish things happening to this client
/// from things happening to someone else in a channel we are in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// The transport is open.
    Connected { server: String, port: u16 },
    /// RPL_WELCOME received; commands are admissible from here on.
    LoggedIn,
    /// The connection is gone (server hangup or our own quit).
    Disconnected,

    /// We joined a channel.
    Joined { channel: String },
    /// Someone else joined a channel we are in.
    UserJoined { channel: String, nick: String },
    /// We left a channel.
    Parted { channel: String },
    /// Someone else left a channel we are in.
    UserParted { channel: String, nick: String },

    /// Topic set or changed.
    TopicChanged { channel: String, topic: String },

    /// Our own nick changed (server confirmed).
    NickChanged { nick: String },
    /// Someone else changed nick.
    UserRenamed { old: String, new: String },

    /// A mode change we observed (roster is not altered).
    ModeChanged {
        target: String,
        modes: String,
        user: String,
    },

    /// We were invited to a channel.
    Invited { by: String, channel: String },
    /// We were kicked from a channel.
    Kicked { by: String, channel: String },
    /// Someone else was kicked from a channel we are in.
    UserKicked {
        nick: String,
        by: String,
        channel: String,
    },

    /// Private message addressed to us.
    PrivateMessage { from: String, text: String },
    /// Message to a channel we are in.
    ChannelMessage {
        from: String,
        channel: String,
        text: String,
    },
    /// A channel message that contains our nick.
    Mentioned {
        from: String,
        channel: String,
        text: String,
    },
    /// CTCP ACTION ("/me") in a channel.
    Action {
        from: String,
        channel: String,
        text: String,
    },

    /// A complete WHO listing for a channel.
    Who {
        channel: String,
        entries: Vec<WhoEntry>,
    },

    /// A parsed line no transition or extension claimed.
    Unhandled { message: Message },
}
