//! CTCP framing (`\x01`-delimited payloads inside PRIVMSG/NOTICE).

/// CTCP delimiter byte.
pub const DELIM: char = '\u{1}';

/// Whether an inbound trailing argument carried CTCP framing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CtcpStatus {
    /// Plain text, no framing.
    #[default]
    None,
    /// Well-formed CTCP payload (other than ACTION, which is rewritten to
    /// its own command by the parser).
    Ctcp,
    /// A `\x01` opener without a matching closer.
    Invalid,
}

/// Result of decoding a trailing argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CtcpFrame {
    /// No CTCP framing; the text is passed through untouched.
    Plain,
    /// `\x01ACTION <text>\x01`, carrying the inner text with the keyword
    /// stripped.
    Action(String),
    /// Any other well-formed `\x01<payload>\x01`.
    Extended(String),
    /// Malformed framing.
    Invalid,
}

/// Decode the CTCP framing of a trailing argument, if any.
pub fn decode(text: &str) -> CtcpFrame {
    if !text.starts_with(DELIM) {
        return CtcpFrame::Plain;
    }
    let inner = &text[1..];
    let Some(inner) = inner.strip_suffix(DELIM) else {
        return CtcpFrame::Invalid;
    };
    match inner.strip_prefix("ACTION ") {
        Some(action) => CtcpFrame::Action(action.to_string()),
        None => CtcpFrame::Extended(inner.to_string()),
    }
}

/// Frame an ACTION payload for outbound PRIVMSG.
pub fn encode_action(text: &str) -> String {
    format!("{DELIM}ACTION {text}{DELIM}")
}

/// Frame an arbitrary CTCP payload for outbound NOTICE.
pub fn encode_ctcp(payload: &str) -> String {
    format!("{DELIM}{payload}{DELIM}")
}
