//! Outbound IRC commands and their wire rendering.
//!
//! Each variant renders to exactly one line (without the CRLF terminator,
//! which the line codec appends). Variant names follow the wire verbs.

#![allow(clippy::upper_case_acronyms)]

use crate::ctcp;

/// An outbound command.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// `PASS password`
    PASS(String),
    /// `NICK nickname`
    NICK(String),
    /// `USER username 0 * :realname`
    USER(String, String),
    /// `JOIN channel [key]`
    JOIN(String, Option<String>),
    /// `PART channel [:reason]`
    PART(String, Option<String>),
    /// `PRIVMSG target :text`
    PRIVMSG(String, String),
    /// `NOTICE target :text`
    NOTICE(String, String),
    /// `PRIVMSG target :\x01ACTION text\x01`
    ACTION(String, String),
    /// `NOTICE target :\x01payload\x01`
    CTCP(String, String),
    /// `KICK channel nick [:message]`
    KICK(String, String, Option<String>),
    /// `NAMES channel`
    NAMES(String),
    /// `WHO channel`
    WHO(String),
    /// `MODE target flags [args]`
    MODE(String, String, Option<String>),
    /// `INVITE nick channel`
    INVITE(String, String),
    /// `QUIT [:message]`
    QUIT(Option<String>),
    /// `PONG :from` or `PONG nick :from`
    PONG(Option<String>, String),
    /// A raw line, passed through untouched.
    Raw(String),
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::PASS(pass) => write!(f, "PASS {pass}"),
            Command::NICK(nick) => write!(f, "NICK {nick}"),
            Command::USER(user, realname) => write!(f, "USER {user} 0 * :{realname}"),
            Command::JOIN(chan, None) => write!(f, "JOIN {chan}"),
            Command::JOIN(chan, Some(key)) => write!(f, "JOIN {chan} {key}"),
            Command::PART(chan, None) => write!(f, "PART {chan}"),
            Command::PART(chan, Some(reason)) => write!(f, "PART {chan} :{reason}"),
            Command::PRIVMSG(target, text) => write!(f, "PRIVMSG {target} :{text}"),
            Command::NOTICE(target, text) => write!(f, "NOTICE {target} :{text}"),
            Command::ACTION(target, text) => {
                write!(f, "PRIVMSG {target} :{}", ctcp::encode_action(text))
            }
            Command::CTCP(target, payload) => {
                write!(f, "NOTICE {target} :{}", ctcp::encode_ctcp(payload))
            }
            Command::KICK(chan, nick, None) => write!(f, "KICK {chan} {nick}"),
            Command::KICK(chan, nick, Some(msg)) => write!(f, "KICK {chan} {nick} :{msg}"),
            Command::NAMES(chan) => write!(f, "NAMES {chan}"),
            Command::WHO(chan) => write!(f, "WHO {chan}"),
            Command::MODE(target, flags, None) => write!(f, "MODE {target} {flags}"),
            Command::MODE(target, flags, Some(args)) => {
                write!(f, "MODE {target} {flags} {args}")
            }
            Command::INVITE(nick, chan) => write!(f, "INVITE {nick} {chan}"),
            Command::QUIT(None) => write!(f, "QUIT"),
            Command::QUIT(Some(msg)) => write!(f, "QUIT :{msg}"),
            Command::PONG(None, from) => write!(f, "PONG :{from}"),
            Command::PONG(Some(nick), from) => write!(f, "PONG {nick} :{from}"),
            Command::Raw(line) => write!(f, "{line}"),
        }
    }
}
