//! The channel roster: the client's view of joined channels and occupants.
//!
//! A [`Roster`] is a plain value owned by the session; every transition is a
//! method on the value and nothing else aliases it, so interleaved joins,
//! parts, kicks, and renames can be replayed deterministically in tests.
//! Channels are keyed by their rfc1459-folded name; the display form as first
//! seen is kept alongside.

use std::collections::{BTreeMap, BTreeSet};

use crate::casemap::irc_lower;

/// Queries on an absent channel fail with this, distinct from an empty
/// result on a channel we are in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotFound;

/// One joined channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Display form of the channel name, as first received.
    pub name: String,
    /// Channel visibility marker from RPL_NAMREPLY (`=`, `*`, `@`), when known.
    pub kind: Option<char>,
    /// Current topic; empty until a topic reply or change arrives.
    pub topic: String,
    /// Occupant nicks, rank prefixes stripped.
    pub users: BTreeSet<String>,
}

/// All joined channels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    channels: BTreeMap<String, Channel>,
}

impl Roster {
    /// Empty roster.
    pub fn new() -> Roster {
        Roster::default()
    }

    /// Record our own join: insert an empty channel if absent.
    pub fn join(&mut self, channel: &str) {
        self.channels
            .entry(irc_lower(channel))
            .or_insert_with(|| Channel {
                name: channel.to_string(),
                ..Channel::default()
            });
    }

    /// Record our own part (or being kicked): drop the channel.
    pub fn part(&mut self, channel: &str) {
        self.channels.remove(&irc_lower(channel));
    }

    /// Another user joined; no-op if we are not in the channel.
    pub fn user_join(&mut self, channel: &str, nick: &str) {
        if let Some(chan) = self.channels.get_mut(&irc_lower(channel)) {
            chan.users.insert(nick.to_string());
        }
    }

    /// Another user left (or was kicked).
    pub fn user_part(&mut self, channel: &str, nick: &str) {
        if let Some(chan) = self.channels.get_mut(&irc_lower(channel)) {
            chan.users.remove(nick);
        }
    }

    /// Bulk-add users from a NAMES reply, stripping leading rank characters
    /// (`@`, `+`, … per the server's user prefixes).
    pub fn users_join<'a, I>(&mut self, channel: &str, nicks: I, rank_prefixes: &str)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(chan) = self.channels.get_mut(&irc_lower(channel)) else {
            return;
        };
        for nick in nicks {
            let bare = nick.trim_start_matches(|c| rank_prefixes.contains(c));
            if !bare.is_empty() {
                chan.users.insert(bare.to_string());
            }
        }
    }

    /// A user changed nick: rename across every channel containing them.
    pub fn user_rename(&mut self, old: &str, new: &str) {
        for chan in self.channels.values_mut() {
            if chan.users.remove(old) {
                chan.users.insert(new.to_string());
            }
        }
    }

    /// Set the topic; no-op if we are not in the channel.
    pub fn set_topic(&mut self, channel: &str, topic: &str) {
        if let Some(chan) = self.channels.get_mut(&irc_lower(channel)) {
            chan.topic = topic.to_string();
        }
    }

    /// Set the channel visibility marker; no-op if we are not in the channel.
    pub fn set_kind(&mut self, channel: &str, kind: char) {
        if let Some(chan) = self.channels.get_mut(&irc_lower(channel)) {
            chan.kind = Some(kind);
        }
    }

    /// Display names of all joined channels.
    pub fn channels(&self) -> Vec<String> {
        self.channels.values().map(|c| c.name.clone()).collect()
    }

    /// Occupants of a channel, sorted.
    pub fn users(&self, channel: &str) -> Result<Vec<String>, NotFound> {
        self.get(channel)
            .map(|c| c.users.iter().cloned().collect())
    }

    /// Topic of a channel.
    pub fn topic(&self, channel: &str) -> Result<String, NotFound> {
        self.get(channel).map(|c| c.topic.clone())
    }

    /// Visibility marker of a channel, `None` until a NAMES reply arrives.
    pub fn kind(&self, channel: &str) -> Result<Option<char>, NotFound> {
        self.get(channel).map(|c| c.kind)
    }

    /// Whether a nick is present in a channel.
    pub fn has_user(&self, channel: &str, nick: &str) -> Result<bool, NotFound> {
        self.get(channel).map(|c| c.users.contains(nick))
    }

    /// Number of joined channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are joined.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Drop every channel (connection lost).
    pub fn clear(&mut self) {
        self.channels.clear();
    }

    fn get(&self, channel: &str) -> Result<&Channel, NotFound> {
        self.channels.get(&irc_lower(channel)).ok_or(NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_idempotent() {
        let mut roster = Roster::new();
        roster.join("#room");
        roster.user_join("#room", "alice");
        roster.join("#room");
        assert_eq!(roster.users("#room").unwrap(), vec!["alice"]);
    }

    #[test]
    fn test_case_insensitive_lookup_preserves_display() {
        let mut roster = Roster::new();
        roster.join("#Room");
        roster.user_join("#ROOM", "alice");
        assert_eq!(roster.users("#room").unwrap(), vec!["alice"]);
        assert_eq!(roster.channels(), vec!["#Room"]);
    }

    #[test]
    fn test_user_join_unknown_channel_is_noop() {
        let mut roster = Roster::new();
        roster.user_join("#nowhere", "alice");
        assert_eq!(roster.users("#nowhere"), Err(NotFound));
    }

    #[test]
    fn test_users_join_strips_rank_prefixes() {
        let mut roster = Roster::new();
        roster.join("#room");
        roster.users_join("#room", ["@alice", "+bob", "carol"], "@+");
        assert_eq!(
            roster.users("#room").unwrap(),
            vec!["alice", "bob", "carol"]
        );
    }

    #[test]
    fn test_rename_spans_channels() {
        let mut roster = Roster::new();
        roster.join("#a");
        roster.join("#b");
        roster.user_join("#a", "alice");
        roster.user_join("#b", "alice");
        roster.user_join("#b", "bob");
        roster.user_rename("alice", "alice2");
        assert_eq!(roster.users("#a").unwrap(), vec!["alice2"]);
        assert_eq!(roster.users("#b").unwrap(), vec!["alice2", "bob"]);
    }

    #[test]
    fn test_rename_absent_nick_is_noop() {
        let mut roster = Roster::new();
        roster.join("#a");
        roster.user_join("#a", "bob");
        roster.user_rename("alice", "alice2");
        assert_eq!(roster.users("#a").unwrap(), vec!["bob"]);
    }

    #[test]
    fn test_part_removes_channel() {
        let mut roster = Roster::new();
        roster.join("#room");
        roster.part("#room");
        assert_eq!(roster.topic("#room"), Err(NotFound));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_topic_and_kind() {
        let mut roster = Roster::new();
        roster.join("#room");
        roster.set_topic("#room", "hello world");
        roster.set_kind("#room", '=');
        assert_eq!(roster.topic("#room").unwrap(), "hello world");
        assert_eq!(roster.kind("#room").unwrap(), Some('='));
    }

    #[test]
    fn test_empty_channel_distinct_from_absent() {
        let mut roster = Roster::new();
        roster.join("#room");
        assert_eq!(roster.users("#room").unwrap(), Vec::<String>::new());
        assert_eq!(roster.users("#other"), Err(NotFound));
        assert_eq!(roster.has_user("#room", "alice"), Ok(false));
        assert_eq!(roster.has_user("#other", "alice"), Err(NotFound));
    }
}
