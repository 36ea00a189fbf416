//! IRC numeric reply codes consumed by the dispatcher.
//!
//! Servers reply with three-digit numerics; the dispatcher cares about a
//! handful of them. Anything else falls through to the extension hooks.

#![allow(non_camel_case_types)]

use std::str::FromStr;

/// Numeric server replies the client interprets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    /// 001 - Welcome; registration complete
    RPL_WELCOME = 1,
    /// 005 - Server supported features (ISUPPORT)
    RPL_ISUPPORT = 5,
    /// 315 - End of WHO list
    RPL_ENDOFWHO = 315,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 352 - WHO reply line
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply line
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES list
    RPL_ENDOFNAMES = 366,
}

impl Response {
    /// The numeric code.
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

impl FromStr for Response {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "001" => Ok(Response::RPL_WELCOME),
            "005" => Ok(Response::RPL_ISUPPORT),
            "315" => Ok(Response::RPL_ENDOFWHO),
            "332" => Ok(Response::RPL_TOPIC),
            "352" => Ok(Response::RPL_WHOREPLY),
            "353" => Ok(Response::RPL_NAMREPLY),
            "366" => Ok(Response::RPL_ENDOFNAMES),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("001".parse::<Response>(), Ok(Response::RPL_WELCOME));
        assert_eq!("353".parse::<Response>(), Ok(Response::RPL_NAMREPLY));
        assert!("999".parse::<Response>().is_err());
        assert!("JOIN".parse::<Response>().is_err());
    }

    #[test]
    fn test_code() {
        assert_eq!(Response::RPL_WELCOME.code(), 1);
        assert_eq!(Response::RPL_ENDOFWHO.code(), 315);
    }
}
