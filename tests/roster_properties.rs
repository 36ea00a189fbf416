//! Property tests for the dispatch core.
//!
//! The roster is checked against a reference model: both sides replay the
//! same randomized interleaving of joins, parts, kicks, renames, and NAMES
//! replies, and must agree on every channel's user set afterwards.
//!
//! Run with: `cargo test --test roster_properties`

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use slirc_client::ext::ExtensionRegistry;
use slirc_client::session::{Session, SessionState};
use slirc_client::{Event, Message};

const SELF_NICK: &str = "me";
const CHANNELS: &[&str] = &["#a", "#B", "&c"];
const NICKS: &[&str] = &["alice", "bob2", "carol", "dave"];

fn fold(s: &str) -> String {
    slirc_client::casemap::irc_lower(s)
}

#[derive(Clone, Debug)]
enum Op {
    SelfJoin(String),
    SelfPart(String),
    OtherJoin(String, String),
    OtherPart(String, String),
    KickOther(String, String),
    KickSelf(String),
    Rename(String, String),
    Names(String, Vec<(bool, String)>),
}

fn chan_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(CHANNELS).prop_map(|s| s.to_string())
}

fn nick_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(NICKS).prop_map(|s| s.to_string())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        chan_strategy().prop_map(Op::SelfJoin),
        chan_strategy().prop_map(Op::SelfPart),
        (chan_strategy(), nick_strategy()).prop_map(|(c, n)| Op::OtherJoin(c, n)),
        (chan_strategy(), nick_strategy()).prop_map(|(c, n)| Op::OtherPart(c, n)),
        (chan_strategy(), nick_strategy()).prop_map(|(c, n)| Op::KickOther(c, n)),
        chan_strategy().prop_map(Op::KickSelf),
        (nick_strategy(), nick_strategy()).prop_map(|(old, new)| Op::Rename(old, new)),
        (
            chan_strategy(),
            prop::collection::vec((any::<bool>(), nick_strategy()), 0..4)
        )
            .prop_map(|(c, nicks)| Op::Names(c, nicks)),
    ]
}

fn wire_line(op: &Op) -> String {
    match op {
        Op::SelfJoin(c) => format!(":{SELF_NICK}!u@h JOIN :{c}"),
        Op::SelfPart(c) => format!(":{SELF_NICK}!u@h PART {c}"),
        Op::OtherJoin(c, n) => format!(":{n}!u@h JOIN :{c}"),
        Op::OtherPart(c, n) => format!(":{n}!u@h PART {c}"),
        Op::KickOther(c, n) => format!(":op!u@h KICK {c} {n} :enough"),
        Op::KickSelf(c) => format!(":op!u@h KICK {c} {SELF_NICK} :enough"),
        Op::Rename(old, new) => format!(":{old}!u@h NICK :{new}"),
        Op::Names(c, nicks) => {
            let names: Vec<String> = nicks
                .iter()
                .map(|(ranked, n)| {
                    if *ranked {
                        format!("@{n}")
                    } else {
                        n.clone()
                    }
                })
                .collect();
            format!(":irc 353 {SELF_NICK} = {c} :{}", names.join(" "))
        }
    }
}

/// Reference roster: folded channel name → user set.
#[derive(Default)]
struct Model {
    channels: HashMap<String, BTreeSet<String>>,
}

impl Model {
    fn apply(&mut self, op: &Op) {
        match op {
            Op::SelfJoin(c) => {
                self.channels.entry(fold(c)).or_default();
            }
            Op::SelfPart(c) | Op::KickSelf(c) => {
                self.channels.remove(&fold(c));
            }
            Op::OtherJoin(c, n) => {
                if let Some(users) = self.channels.get_mut(&fold(c)) {
                    users.insert(n.clone());
                }
            }
            Op::OtherPart(c, n) | Op::KickOther(c, n) => {
                if let Some(users) = self.channels.get_mut(&fold(c)) {
                    users.remove(n);
                }
            }
            Op::Rename(old, new) => {
                for users in self.channels.values_mut() {
                    if users.remove(old) {
                        users.insert(new.clone());
                    }
                }
            }
            Op::Names(c, nicks) => {
                if let Some(users) = self.channels.get_mut(&fold(c)) {
                    for (_, n) in nicks {
                        users.insert(n.clone());
                    }
                }
            }
        }
    }
}

fn fresh_session() -> Session {
    let state = SessionState {
        nick: SELF_NICK.to_string(),
        connected: true,
        logged_on: true,
        ..SessionState::default()
    };
    Session::new(state, ExtensionRegistry::default())
}

proptest! {
    /// Replaying any interleaving of membership transitions leaves the
    /// roster in agreement with the reference model.
    #[test]
    fn roster_agrees_with_reference_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut session = fresh_session();
        let mut model = Model::default();

        for op in &ops {
            session.apply_line(&wire_line(op));
            model.apply(op);
        }

        for chan in CHANNELS {
            match session.state.channels.users(chan) {
                Ok(users) => {
                    let expected = model
                        .channels
                        .get(&fold(chan))
                        .unwrap_or_else(|| panic!("roster has {chan}, model does not"));
                    let got: BTreeSet<String> = users.into_iter().collect();
                    prop_assert_eq!(&got, expected);
                }
                Err(_) => {
                    prop_assert!(!model.channels.contains_key(&fold(chan)));
                }
            }
        }
    }

    /// k WHO replies followed by one end-of-WHO produce exactly one event
    /// with the k entries in arrival order, and leave the buffer empty.
    #[test]
    fn who_buffer_flushes_once_in_order(k in 0usize..8, chan in chan_strategy()) {
        let mut session = fresh_session();

        for i in 0..k {
            let tr = session.apply_line(&format!(
                ":irc 352 {SELF_NICK} {chan} user{i} host{i} srv nick{i} H :{i} Real {i}"
            ));
            prop_assert!(tr.events.is_empty());
        }

        let tr = session.apply_line(&format!(":irc 315 {SELF_NICK} {chan} :End of /WHO list"));
        prop_assert_eq!(tr.events.len(), 1);
        let Event::Who { channel, entries } = &tr.events[0] else {
            panic!("expected a Who event, got {:?}", tr.events[0]);
        };
        prop_assert_eq!(channel, &chan);
        prop_assert_eq!(entries.len(), k);
        for (i, entry) in entries.iter().enumerate() {
            prop_assert_eq!(&entry.nick, &format!("nick{i}"));
            prop_assert_eq!(entry.hops, i as u32);
        }
        prop_assert!(session.state.who_buffers.is_empty());
    }

    /// The line parser is total: it may reject, it must not panic.
    #[test]
    fn parser_never_panics(line in ".*") {
        let _ = Message::parse(&line);
    }
}
