//! IRC message prefix (source) parsing.

/// The source of an inbound message, split from `nick[!user][@host]`.
///
/// Server sources (`irc.example.net`) land entirely in `nick`; they never
/// compare equal to a client nick under rfc1459 folding, so the dispatcher
/// does not need to distinguish them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prefix {
    /// Nick (or server name).
    pub nick: String,
    /// Ident, when the prefix carried a `!user` part.
    pub user: Option<String>,
    /// Host, when the prefix carried an `@host` part.
    pub host: Option<String>,
}

impl Prefix {
    /// Split a raw prefix string into its fields.
    pub fn parse(raw: &str) -> Prefix {
        let (rest, host) = match raw.split_once('@') {
            Some((r, h)) => (r, Some(h.to_string())),
            None => (raw, None),
        };
        let (nick, user) = match rest.split_once('!') {
            Some((n, u)) => (n.to_string(), Some(u.to_string())),
            None => (rest.to_string(), None),
        };
        Prefix { nick, user, host }
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nick)?;
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}
