//! The sans-IO dispatch core.
//!
//! [`Session`] consumes parsed messages and produces a [`Transition`]:
//! events to fan out and replies to put on the wire. It performs no I/O
//! itself, so the whole state machine is testable by feeding it lines.

use std::collections::HashMap;
use std::time::SystemTime;

use tracing::warn;

use crate::command::Command;
use crate::ctcp::CtcpStatus;
use crate::event::{Event, WhoEntry};
use crate::ext::ExtensionRegistry;
use crate::isupport::Isupport;
use crate::message::Message;
use crate::response::Response;
use crate::roster::Roster;
use crate::casemap::{irc_eq, irc_lower};

/// Everything observable about one connection.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionState {
    /// Server host as given to `connect`.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Whether the connection uses TLS.
    pub tls: bool,
    /// Our nick; updated when the server confirms a change.
    pub nick: String,
    /// Ident sent at logon.
    pub user: String,
    /// Real name sent at logon.
    pub realname: String,
    /// Server password sent at logon (empty for none).
    pub pass: String,
    /// Transport is open.
    pub connected: bool,
    /// RPL_WELCOME received.
    pub logged_on: bool,
    /// Answer server PINGs automatically.
    pub autoping: bool,
    /// Surface malformed CTCP frames as events instead of dropping them.
    pub debug: bool,
    /// Set on the first RPL_WELCOME of the connection.
    pub login_time: Option<SystemTime>,
    /// Network name from ISUPPORT.
    pub network: String,
    /// Channel name sigils, from ISUPPORT CHANTYPES.
    pub channel_prefixes: String,
    /// Occupant rank sigils, from ISUPPORT PREFIX.
    pub user_prefixes: String,
    /// Joined channels and their occupants.
    pub channels: Roster,
    /// Per-channel WHO accumulation, keyed by folded channel name.
    pub who_buffers: HashMap<String, Vec<WhoEntry>>,
}

impl Default for SessionState {
    fn default() -> SessionState {
        SessionState {
            server: String::new(),
            port: 0,
            tls: false,
            nick: String::new(),
            user: String::new(),
            realname: String::new(),
            pass: String::new(),
            connected: false,
            logged_on: false,
            autoping: true,
            debug: false,
            login_time: None,
            network: String::new(),
            channel_prefixes: "#&".to_string(),
            user_prefixes: "@+".to_string(),
            channels: Roster::new(),
            who_buffers: HashMap::new(),
        }
    }
}

impl SessionState {
    /// Drop per-connection state. Credentials and ISUPPORT-derived values
    /// survive so a later reconnect starts from the same configuration.
    pub fn reset_connection(&mut self) {
        self.connected = false;
        self.logged_on = false;
        self.login_time = None;
        self.channels.clear();
        self.who_buffers.clear();
    }
}

/// Snapshot of the observable session fields.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateSnapshot {
    pub server: String,
    pub port: u16,
    pub tls: bool,
    pub nick: String,
    pub connected: bool,
    pub logged_on: bool,
    pub autoping: bool,
    pub debug: bool,
    pub login_time: Option<SystemTime>,
    pub network: String,
    pub channel_prefixes: String,
    pub user_prefixes: String,
    pub channels: Vec<String>,
}

/// What one inbound line amounts to: events for subscribers and replies
/// for the wire.
#[derive(Debug, Default)]
pub struct Transition {
    pub events: Vec<Event>,
    pub replies: Vec<Command>,
}

/// The state machine: session state plus the extension registry consulted
/// for unmatched messages.
pub struct Session {
    pub state: SessionState,
    extensions: ExtensionRegistry,
}

impl Session {
    pub fn new(state: SessionState, extensions: ExtensionRegistry) -> Session {
        Session { state, extensions }
    }

    /// Snapshot of the observable fields.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            server: self.state.server.clone(),
            port: self.state.port,
            tls: self.state.tls,
            nick: self.state.nick.clone(),
            connected: self.state.connected,
            logged_on: self.state.logged_on,
            autoping: self.state.autoping,
            debug: self.state.debug,
            login_time: self.state.login_time,
            network: self.state.network.clone(),
            channel_prefixes: self.state.channel_prefixes.clone(),
            user_prefixes: self.state.user_prefixes.clone(),
            channels: self.state.channels.channels(),
        }
    }

    /// Parse and dispatch one wire line. A line that does not parse is
    /// dropped with a warning; the next line is independent of it.
    pub fn apply_line(&mut self, line: &str) -> Transition {
        match Message::parse(line) {
            Ok(msg) => self.apply(msg),
            Err(err) => {
                warn!(%err, line, "dropping unparseable line");
                Transition::default()
            }
        }
    }

    /// Dispatch one parsed message.
    pub fn apply(&mut self, msg: Message) -> Transition {
        let mut tr = Transition::default();

        if msg.ctcp == CtcpStatus::Invalid {
            if self.state.debug {
                tr.events.push(Event::Unhandled { message: msg });
            } else {
                warn!(raw = %msg.raw, "dropping malformed ctcp frame");
            }
            return tr;
        }

        if self.builtin(&msg, &mut tr) {
            return tr;
        }

        if let Some(updated) = self.extensions.dispatch(&msg, &self.state) {
            self.state = updated;
        } else {
            tr.events.push(Event::Unhandled { message: msg });
        }
        tr
    }

    /// Built-in transitions. Returns false when the message should go to
    /// the extension hooks instead.
    fn builtin(&mut self, msg: &Message, tr: &mut Transition) -> bool {
        let st = &mut self.state;
        let args = &msg.args;

        if let Ok(numeric) = msg.cmd.parse::<Response>() {
            return match numeric {
                Response::RPL_WELCOME => {
                    if st.logged_on {
                        return false;
                    }
                    st.logged_on = true;
                    st.login_time = Some(SystemTime::now());
                    tr.events.push(Event::LoggedIn);
                    true
                }
                Response::RPL_ISUPPORT => {
                    let isupport = Isupport::from_args(args);
                    if let Some(network) = isupport.network() {
                        st.network = network.to_string();
                    }
                    if let Some(chantypes) = isupport.chantypes() {
                        st.channel_prefixes = chantypes.to_string();
                    }
                    if let Some(prefixes) = isupport.prefix_chars() {
                        st.user_prefixes = prefixes.to_string();
                    }
                    true
                }
                Response::RPL_TOPIC => {
                    let (channel, topic) = match args.as_slice() {
                        [_, channel, topic] => (channel, topic),
                        [channel, topic] => (channel, topic),
                        _ => return false,
                    };
                    st.channels.set_topic(channel, topic);
                    tr.events.push(Event::TopicChanged {
                        channel: channel.clone(),
                        topic: topic.clone(),
                    });
                    true
                }
                Response::RPL_NAMREPLY => {
                    let (kind, channel, names) = match args.as_slice() {
                        [_, kind, channel, names] => (kind, channel, names),
                        [kind, channel, names] => (kind, channel, names),
                        _ => return false,
                    };
                    let prefixes = st.user_prefixes.clone();
                    st.channels
                        .users_join(channel, names.split_whitespace(), &prefixes);
                    if let Some(kind) = kind.chars().next() {
                        st.channels.set_kind(channel, kind);
                    }
                    true
                }
                Response::RPL_WHOREPLY => {
                    let [_, channel, user, host, server, nick, mode, tail] = args.as_slice()
                    else {
                        return false;
                    };
                    let (hops, name) = match tail.split_once(' ') {
                        Some((hops, name)) => (hops, name),
                        None => (tail.as_str(), ""),
                    };
                    let entry = WhoEntry {
                        nick: nick.clone(),
                        user: user.clone(),
                        name: name.to_string(),
                        host: host.clone(),
                        server: server.clone(),
                        hops: hops.parse().unwrap_or(0),
                        operator: mode.contains('@'),
                    };
                    st.who_buffers
                        .entry(irc_lower(channel))
                        .or_default()
                        .push(entry);
                    true
                }
                Response::RPL_ENDOFWHO => {
                    let Some(channel) = (if args.len() >= 3 {
                        args.get(1)
                    } else {
                        args.first()
                    }) else {
                        return false;
                    };
                    let entries = st.who_buffers.remove(&irc_lower(channel)).unwrap_or_default();
                    tr.events.push(Event::Who {
                        channel: channel.clone(),
                        entries,
                    });
                    true
                }
                // Parsed for completeness; carries nothing the roster needs.
                Response::RPL_ENDOFNAMES => false,
            };
        }

        let from = msg.source_nick();
        let from_self = from.is_some_and(|n| irc_eq(n, &st.nick));

        match msg.cmd.as_str() {
            "JOIN" => {
                let Some(channel) = args.first() else {
                    return false;
                };
                if from_self {
                    st.channels.join(channel);
                    tr.events.push(Event::Joined {
                        channel: channel.clone(),
                    });
                } else if let Some(nick) = from {
                    st.channels.user_join(channel, nick);
                    tr.events.push(Event::UserJoined {
                        channel: channel.clone(),
                        nick: nick.to_string(),
                    });
                } else {
                    return false;
                }
                true
            }
            "PART" => {
                let Some(channel) = args.first() else {
                    return false;
                };
                if from_self {
                    st.channels.part(channel);
                    tr.events.push(Event::Parted {
                        channel: channel.clone(),
                    });
                } else if let Some(nick) = from {
                    st.channels.user_part(channel, nick);
                    tr.events.push(Event::UserParted {
                        channel: channel.clone(),
                        nick: nick.to_string(),
                    });
                } else {
                    return false;
                }
                true
            }
            "TOPIC" => {
                let [channel, topic] = args.as_slice() else {
                    return false;
                };
                st.channels.set_topic(channel, topic);
                tr.events.push(Event::TopicChanged {
                    channel: channel.clone(),
                    topic: topic.clone(),
                });
                true
            }
            "NICK" => {
                let (Some(new), Some(old)) = (args.first(), from) else {
                    return false;
                };
                if from_self {
                    st.nick = new.clone();
                    tr.events.push(Event::NickChanged { nick: new.clone() });
                } else {
                    st.channels.user_rename(old, new);
                    tr.events.push(Event::UserRenamed {
                        old: old.to_string(),
                        new: new.clone(),
                    });
                }
                true
            }
            "MODE" => {
                let [target, modes, user] = args.as_slice() else {
                    return false;
                };
                tr.events.push(Event::ModeChanged {
                    target: target.clone(),
                    modes: modes.clone(),
                    user: user.clone(),
                });
                true
            }
            "PING" => {
                if !st.autoping {
                    return false;
                }
                let reply = match args.first() {
                    Some(origin) => Command::PONG(Some(st.nick.clone()), origin.clone()),
                    None => Command::PONG(None, st.nick.clone()),
                };
                tr.replies.push(reply);
                true
            }
            "INVITE" => {
                let ([target, channel], Some(by)) = (args.as_slice(), from) else {
                    return false;
                };
                if !irc_eq(target, &st.nick) {
                    return false;
                }
                tr.events.push(Event::Invited {
                    by: by.to_string(),
                    channel: channel.clone(),
                });
                true
            }
            "KICK" => {
                let (Some(channel), Some(victim), Some(by)) =
                    (args.first(), args.get(1), from)
                else {
                    return false;
                };
                if irc_eq(victim, &st.nick) {
                    st.channels.part(channel);
                    tr.events.push(Event::Kicked {
                        by: by.to_string(),
                        channel: channel.clone(),
                    });
                } else {
                    st.channels.user_part(channel, victim);
                    tr.events.push(Event::UserKicked {
                        nick: victim.clone(),
                        by: by.to_string(),
                        channel: channel.clone(),
                    });
                }
                true
            }
            "PRIVMSG" if msg.ctcp == CtcpStatus::None => {
                let ([target, text], Some(from)) = (args.as_slice(), from) else {
                    return false;
                };
                if irc_eq(target, &st.nick) {
                    tr.events.push(Event::PrivateMessage {
                        from: from.to_string(),
                        text: text.clone(),
                    });
                } else {
                    tr.events.push(Event::ChannelMessage {
                        from: from.to_string(),
                        channel: target.clone(),
                        text: text.clone(),
                    });
                    if !st.nick.is_empty() && text.contains(&st.nick) {
                        tr.events.push(Event::Mentioned {
                            from: from.to_string(),
                            channel: target.clone(),
                            text: text.clone(),
                        });
                    }
                }
                true
            }
            "ACTION" => {
                let ([channel, text], Some(from)) = (args.as_slice(), from) else {
                    return false;
                };
                tr.events.push(Event::Action {
                    from: from.to_string(),
                    channel: channel.clone(),
                    text: text.clone(),
                });
                true
            }
            _ => false,
        }
    }
}
