//! Bracketed response codes (`[UIDNEXT 12]`, `[OVERQUOTA]`, ...).

use super::{Capability, Flag, Uid, UidValidity};

/// Response code attached to a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `ALERT`
    Alert,
    /// `CAPABILITY` with the advertised list.
    Capability(Vec<Capability>),
    /// `PARSE`
    Parse,
    /// `PERMANENTFLAGS`
    PermanentFlags(Vec<Flag>),
    /// `READ-ONLY`
    ReadOnly,
    /// `READ-WRITE`
    ReadWrite,
    /// `TRYCREATE`
    TryCreate,
    /// `UIDNEXT`
    UidNext(Uid),
    /// `UIDVALIDITY`
    UidValidity(UidValidity),
    /// `UNSEEN` with the first unseen sequence number.
    Unseen(u32),
    /// `OVERQUOTA` (RFC 5530)
    OverQuota,
    /// `ALREADYEXISTS` (RFC 5530)
    AlreadyExists,
    /// `NONEXISTENT` (RFC 5530)
    NonExistent,
    /// `NOPERM` (RFC 5530)
    NoPerm,
    /// `INUSE` (RFC 5530)
    InUse,
    /// `CANNOT` (RFC 5530)
    Cannot,
    /// `LIMIT` (RFC 5530)
    Limit,
    /// `AUTHENTICATIONFAILED` (RFC 5530)
    AuthenticationFailed,
    /// `UNAVAILABLE` (RFC 5530)
    Unavailable,
    /// Any other code, by atom.
    Unknown(String),
}

impl ResponseCode {
    /// Maps an argument-less code atom to its variant.
    #[must_use]
    pub fn from_atom(atom: &str) -> Self {
        match atom.to_ascii_uppercase().as_str() {
            "ALERT" => Self::Alert,
            "PARSE" => Self::Parse,
            "READ-ONLY" => Self::ReadOnly,
            "READ-WRITE" => Self::ReadWrite,
            "TRYCREATE" => Self::TryCreate,
            "OVERQUOTA" => Self::OverQuota,
            "ALREADYEXISTS" => Self::AlreadyExists,
            "NONEXISTENT" => Self::NonExistent,
            "NOPERM" => Self::NoPerm,
            "INUSE" => Self::InUse,
            "CANNOT" => Self::Cannot,
            "LIMIT" => Self::Limit,
            "AUTHENTICATIONFAILED" => Self::AuthenticationFailed,
            "UNAVAILABLE" => Self::Unavailable,
            _ => Self::Unknown(atom.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc5530_codes() {
        assert_eq!(ResponseCode::from_atom("OVERQUOTA"), ResponseCode::OverQuota);
        assert_eq!(
            ResponseCode::from_atom("alreadyexists"),
            ResponseCode::AlreadyExists
        );
        assert_eq!(ResponseCode::from_atom("NOPERM"), ResponseCode::NoPerm);
    }

    #[test]
    fn unknown_code_keeps_atom() {
        assert_eq!(
            ResponseCode::from_atom("X-GM-FOO"),
            ResponseCode::Unknown("X-GM-FOO".to_string())
        );
    }
}
