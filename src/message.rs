//! Inbound wire-line parsing.
//!
//! A [`Message`] is one server line split into prefix, command, and
//! arguments. IRCv3 tag sections are accepted on the wire and discarded;
//! CTCP framing in the trailing argument is decoded here so the dispatcher
//! only ever sees plain text (an ACTION frame is rewritten to the `ACTION`
//! command, matching how the rest of the crate treats it as its own verb).

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::opt,
    sequence::preceded,
    IResult,
};

use crate::ctcp::{self, CtcpFrame, CtcpStatus};
use crate::error::MessageParseError;
use crate::prefix::Prefix;

/// A parsed inbound IRC line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Message source, when the line carried a `:prefix`.
    pub prefix: Option<Prefix>,
    /// Uppercase verb (`JOIN`, `PRIVMSG`, …) or three-digit numeric string.
    pub cmd: String,
    /// Middle parameters followed by the trailing parameter, in order.
    pub args: Vec<String>,
    /// CTCP framing status of the trailing argument.
    pub ctcp: CtcpStatus,
    /// The raw line as received, CR/LF stripped.
    pub raw: String,
}

fn tags_section(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_while(|c| c != ' '))(input)
}

fn prefix_section(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

fn command_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric())(input)
}

fn spaces(input: &str) -> IResult<&str, &str> {
    take_while(|c| c == ' ')(input)
}

/// (tags, prefix, command, params), with the trailing argument as the last
/// param.
type SplitLine<'a> = (Option<&'a str>, Option<&'a str>, &'a str, Vec<&'a str>);

fn split_line(input: &str) -> IResult<&str, SplitLine<'_>> {
    let (input, tags) = opt(tags_section)(input)?;
    let (input, _) = spaces(input)?;
    let (input, prefix) = opt(prefix_section)(input)?;
    let (input, _) = spaces(input)?;
    let (mut rest, command) = command_word(input)?;

    let mut params = Vec::new();
    while let Some(stripped) = rest.strip_prefix(' ') {
        rest = stripped;
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            rest = "";
            break;
        }
        let end = rest.find(' ').unwrap_or(rest.len());
        if end > 0 {
            params.push(&rest[..end]);
        }
        rest = &rest[end..];
    }

    Ok((rest, (tags, prefix, command, params)))
}

impl Message {
    /// Parse one wire line. Trailing CR/LF is tolerated.
    pub fn parse(line: &str) -> Result<Message, MessageParseError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        // Recover the byte offset from how much input nom had left, without
        // dragging its error types into our API.
        let (_, (_tags, prefix, command, params)) =
            split_line(trimmed).map_err(|e| match e {
                nom::Err::Error(err) | nom::Err::Failure(err) => MessageParseError::Malformed {
                    position: trimmed.len() - err.input.len(),
                },
                nom::Err::Incomplete(_) => MessageParseError::Malformed {
                    position: trimmed.len(),
                },
            })?;

        if command.is_empty() {
            return Err(MessageParseError::MissingCommand);
        }

        let mut cmd = if command.chars().all(|c| c.is_ascii_digit()) {
            command.to_string()
        } else {
            command.to_ascii_uppercase()
        };
        let mut args: Vec<String> = params.iter().map(|s| s.to_string()).collect();

        // CTCP framing lives in the trailing argument of PRIVMSG/NOTICE.
        let mut ctcp = CtcpStatus::None;
        if matches!(cmd.as_str(), "PRIVMSG" | "NOTICE") {
            if let Some(trailing) = args.last_mut() {
                match ctcp::decode(trailing) {
                    CtcpFrame::Plain => {}
                    CtcpFrame::Action(text) => {
                        cmd = "ACTION".to_string();
                        *trailing = text;
                    }
                    CtcpFrame::Extended(payload) => {
                        ctcp = CtcpStatus::Ctcp;
                        *trailing = payload;
                    }
                    CtcpFrame::Invalid => ctcp = CtcpStatus::Invalid,
                }
            }
        }

        Ok(Message {
            prefix: prefix.map(Prefix::parse),
            cmd,
            args,
            ctcp,
            raw: trimmed.to_string(),
        })
    }

    /// Nick of the message source, when present.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_ref().map(|p| p.nick.as_str())
    }
}
