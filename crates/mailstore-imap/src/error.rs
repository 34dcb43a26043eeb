//! Error types for the IMAP client.

use std::time::Duration;

use thiserror::Error;

use crate::types::ResponseCode;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Malformed server data.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A connection could not be established for the pool.
    #[error("Cannot connect to {endpoint}: {source}")]
    Connect {
        /// `host:port` that was dialed.
        endpoint: String,
        /// Transport or authentication failure.
        #[source]
        source: Box<Error>,
    },

    /// Server refused the command with `NO`.
    #[error("Server returned NO: {text}")]
    No {
        /// Response code, if the server sent one.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },

    /// Server rejected the command as malformed with `BAD`.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// The session is gone: BYE, EOF or a forced close by the pool.
    #[error("Connection broken: {0}")]
    ConnectionBroken(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server lacks a capability the operation needs.
    #[error("Server does not support {0}")]
    Capability(String),
}

/// Why the server refused a command, from its response code or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Mailbox or account is over quota.
    OverQuota,
    /// Target name already exists.
    AlreadyExists,
    /// Insufficient rights.
    Permission,
    /// Target does not exist.
    NonExistent,
    /// Anything else.
    Other,
}

impl Refusal {
    /// Classifies a `NO` completion.
    ///
    /// Response codes win; servers that send none are matched on common
    /// phrases in the text.
    #[must_use]
    pub fn classify(code: Option<&ResponseCode>, text: &str) -> Self {
        match code {
            Some(ResponseCode::OverQuota | ResponseCode::Limit) => return Self::OverQuota,
            Some(ResponseCode::AlreadyExists) => return Self::AlreadyExists,
            Some(ResponseCode::NoPerm) => return Self::Permission,
            Some(ResponseCode::NonExistent | ResponseCode::TryCreate) => {
                return Self::NonExistent;
            }
            _ => {}
        }

        let text = text.to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
        if has(&["quota", "mailbox is full", "storage limit"]) {
            Self::OverQuota
        } else if has(&["already exists", "exists already", "duplicate"]) {
            Self::AlreadyExists
        } else if has(&["permission", "not allowed", "access denied", "no rights"]) {
            Self::Permission
        } else if has(&["does not exist", "doesn't exist", "no such", "not found", "unknown mailbox"])
        {
            Self::NonExistent
        } else {
            Self::Other
        }
    }
}

impl Error {
    /// Returns true if the connection is unusable and must be discarded.
    #[must_use]
    pub fn is_connection_broken(&self) -> bool {
        match self {
            Self::ConnectionBroken(_) | Self::Io(_) | Self::Timeout(_) => true,
            Self::Connect { source, .. } => source.is_connection_broken(),
            _ => false,
        }
    }

    /// Returns true if establishing a pooled connection failed.
    #[must_use]
    pub const fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    /// Returns true for a `NO` completion.
    #[must_use]
    pub const fn is_refused(&self) -> bool {
        matches!(self, Self::No { .. })
    }

    /// Classifies a `NO` completion; `None` for every other error.
    #[must_use]
    pub fn refusal(&self) -> Option<Refusal> {
        match self {
            Self::No { code, text } => Some(Refusal::classify(code.as_ref(), text)),
            _ => None,
        }
    }

    /// Returns true if the server rejected the credentials.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::Connect { source, .. } => source.is_auth(),
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn no(code: Option<ResponseCode>, text: &str) -> Error {
        Error::No {
            code,
            text: text.to_string(),
        }
    }

    #[test]
    fn refusal_from_code() {
        assert_eq!(
            no(Some(ResponseCode::OverQuota), "whatever").refusal(),
            Some(Refusal::OverQuota)
        );
        assert_eq!(
            no(Some(ResponseCode::AlreadyExists), "").refusal(),
            Some(Refusal::AlreadyExists)
        );
        assert_eq!(
            no(Some(ResponseCode::TryCreate), "").refusal(),
            Some(Refusal::NonExistent)
        );
    }

    #[test]
    fn refusal_from_text() {
        assert_eq!(
            no(None, "Quota exceeded for user").refusal(),
            Some(Refusal::OverQuota)
        );
        assert_eq!(
            no(None, "Mailbox already exists").refusal(),
            Some(Refusal::AlreadyExists)
        );
        assert_eq!(
            no(None, "Permission denied").refusal(),
            Some(Refusal::Permission)
        );
        assert_eq!(
            no(None, "Mailbox does not exist").refusal(),
            Some(Refusal::NonExistent)
        );
        assert_eq!(no(None, "try later").refusal(), Some(Refusal::Other));
        assert_eq!(Error::Bad("x".to_string()).refusal(), None);
    }

    #[test]
    fn broken_conditions() {
        assert!(Error::ConnectionBroken("BYE".to_string()).is_connection_broken());
        assert!(!no(None, "").is_connection_broken());
        assert!(no(None, "").is_refused());

        let connect = Error::Connect {
            endpoint: "imap.example.org:993".to_string(),
            source: Box::new(Error::Auth("bad password".to_string())),
        };
        assert!(connect.is_connect());
        assert!(connect.is_auth());
        assert!(!connect.is_connection_broken());
    }
}
