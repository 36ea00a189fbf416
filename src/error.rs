//! Error types for the client library.
//!
//! Gate errors (`NotConnected`, `NotLoggedIn`) are surfaced synchronously on
//! the offending call and leave the session untouched. Transport errors during
//! connect go back to the caller; in steady state they terminate the actor.

use thiserror::Error;

/// Convenience type alias for Results using [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors surfaced by the client's public operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The operation requires an open connection.
    #[error("not connected")]
    NotConnected,

    /// The operation requires a completed login (RPL_WELCOME received).
    #[error("not logged in")]
    NotLoggedIn,

    /// `logon` was called twice on the same connection.
    #[error("already logged on")]
    AlreadyLoggedOn,

    /// A roster query named a channel the client is not in.
    #[error("no such channel")]
    NotFound,

    /// The transport failed while connecting or sending.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The client actor has terminated and can no longer serve requests.
    #[error("client stopped")]
    Stopped,
}

/// Errors from the TCP/TLS transport layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// I/O error during connect, read, or write.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS setup or handshake failure.
    #[error("tls error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// The host string is not a valid TLS server name.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,
}

/// Errors encountered when parsing inbound IRC lines.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty after stripping CR/LF.
    #[error("empty message")]
    EmptyMessage,

    /// The line did not contain a command.
    #[error("missing command")]
    MissingCommand,

    /// The line could not be split into prefix/command/params.
    #[error("malformed line at byte {position}")]
    Malformed {
        /// Byte offset where parsing gave up.
        position: usize,
    },
}

/// Errors from the CRLF line framing layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// A line exceeded the maximum permitted length.
    #[error("line too long: {0} bytes")]
    LineTooLong(usize),

    /// Inbound bytes were not valid UTF-8.
    #[error("invalid utf-8 in line")]
    InvalidUtf8,

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodecError> for TransportError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => TransportError::Io(e),
            other => TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                other.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", ClientError::NotConnected), "not connected");
        assert_eq!(format!("{}", ClientError::NotLoggedIn), "not logged in");
        assert_eq!(
            format!("{}", MessageParseError::Malformed { position: 7 }),
            "malformed line at byte 7"
        );
    }

    #[test]
    fn test_transport_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: ClientError = TransportError::from(io_err).into();
        assert!(matches!(err, ClientError::Transport(TransportError::Io(_))));
    }

    #[test]
    fn test_codec_error_conversion() {
        let err: TransportError = CodecError::LineTooLong(9000).into();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
