//! RPL_ISUPPORT (005) token interpretation.

/// One `KEY` or `KEY=value` token from an ISUPPORT line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IsupportEntry {
    pub key: String,
    pub value: Option<String>,
}

/// The tokens of one RPL_ISUPPORT reply.
///
/// Only `NETWORK`, `CHANTYPES`, and `PREFIX` influence the session; the rest
/// are parsed and ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport {
    entries: Vec<IsupportEntry>,
}

impl Isupport {
    /// Tokenize the args of an RPL_ISUPPORT reply. The leading client arg
    /// and the trailing human-readable text ("are supported by this server")
    /// are skipped.
    pub fn from_args(args: &[String]) -> Isupport {
        let mut tokens = match args {
            [] => &[] as &[String],
            [_, rest @ ..] => rest,
        };
        if let Some(last) = tokens.last() {
            if last.contains(' ') {
                tokens = &tokens[..tokens.len() - 1];
            }
        }

        let entries = tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| match t.split_once('=') {
                Some((k, v)) => IsupportEntry {
                    key: k.to_string(),
                    value: Some(v.to_string()),
                },
                None => IsupportEntry {
                    key: t.clone(),
                    value: None,
                },
            })
            .collect();
        Isupport { entries }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rfind(|e| e.key.eq_ignore_ascii_case(key))
            .and_then(|e| e.value.as_deref())
    }

    /// `NETWORK=<name>`
    pub fn network(&self) -> Option<&str> {
        self.get("NETWORK")
    }

    /// `CHANTYPES=<chars>`
    pub fn chantypes(&self) -> Option<&str> {
        self.get("CHANTYPES")
    }

    /// The `chars` half of `PREFIX=(modes)chars`. A bare `PREFIX=chars`
    /// (no mode list) is accepted too.
    pub fn prefix_chars(&self) -> Option<&str> {
        let raw = self.get("PREFIX")?;
        match raw.split_once(')') {
            Some((modes, chars)) if modes.starts_with('(') && !chars.is_empty() => Some(chars),
            Some(_) => None,
            None if !raw.is_empty() => Some(raw),
            None => None,
        }
    }
}
