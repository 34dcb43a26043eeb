//! Extractors for STATUS counters, QUOTA and ACL data.
//!
//! Each extractor comes in two forms: one taking an already-parsed
//! [`UntaggedResponse`], and one taking the raw response line.

use crate::parser::response::{ResponseParser, UntaggedResponse};
use crate::parser::Response;
use crate::types::{AclEntry, Quota, StatusAttribute};
use crate::{Error, Result};

/// Counter value reported for an attribute the server left out.
pub const ABSENT: i64 = -1;

/// Picks `keys` out of a STATUS response, in the order given.
///
/// Attributes the server did not report come back as [`ABSENT`].
pub fn status_counters(response: &UntaggedResponse, keys: &[StatusAttribute]) -> Result<Vec<i64>> {
    let UntaggedResponse::Status { items, .. } = response else {
        return Err(unexpected("STATUS", response));
    };
    Ok(keys
        .iter()
        .map(|key| {
            items
                .iter()
                .find(|(attr, _)| attr == key)
                .map_or(ABSENT, |(_, value)| i64::try_from(*value).unwrap_or(i64::MAX))
        })
        .collect())
}

/// Parses a raw `* STATUS` line and extracts `keys`.
///
/// ```
/// use mailstore_imap::parser::parse_status_counters;
/// use mailstore_imap::types::StatusAttribute::{Messages, Unseen};
///
/// let line = b"* STATUS INBOX (MESSAGES 10)\r\n";
/// assert_eq!(parse_status_counters(line, &[Messages, Unseen]).unwrap(), vec![10, -1]);
/// ```
pub fn parse_status_counters(line: &[u8], keys: &[StatusAttribute]) -> Result<Vec<i64>> {
    status_counters(&parse_untagged(line)?, keys)
}

/// Returns the quota carried by a QUOTA response.
pub fn quota(response: &UntaggedResponse) -> Result<Quota> {
    match response {
        UntaggedResponse::Quota(quota) => Ok(quota.clone()),
        other => Err(unexpected("QUOTA", other)),
    }
}

/// Parses a raw `* QUOTA` line.
pub fn parse_quota(line: &[u8]) -> Result<Quota> {
    quota(&parse_untagged(line)?)
}

/// Returns the identifier/rights pairs of an ACL response.
pub fn acl_entries(response: &UntaggedResponse) -> Result<Vec<AclEntry>> {
    match response {
        UntaggedResponse::Acl { entries, .. } => Ok(entries.clone()),
        other => Err(unexpected("ACL", other)),
    }
}

/// Parses a raw `* ACL` line. The echoed mailbox name is not an entry.
pub fn parse_acl_entries(line: &[u8]) -> Result<Vec<AclEntry>> {
    acl_entries(&parse_untagged(line)?)
}

fn parse_untagged(line: &[u8]) -> Result<UntaggedResponse> {
    match ResponseParser::parse(line)? {
        Response::Untagged(response) => Ok(response),
        other => Err(Error::Protocol(format!(
            "expected untagged response, got {other:?}"
        ))),
    }
}

fn unexpected(wanted: &str, got: &UntaggedResponse) -> Error {
    Error::Protocol(format!("expected {wanted} response, got {}", got.keyword()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::StatusAttribute::{Messages, Recent, UidNext, Unseen};

    #[test]
    fn counters_follow_key_order() {
        let line = b"* STATUS INBOX (MESSAGES 10 UNSEEN 3)\r\n";
        assert_eq!(parse_status_counters(line, &[Messages, Unseen]).unwrap(), vec![10, 3]);
        assert_eq!(parse_status_counters(line, &[Unseen, Messages]).unwrap(), vec![3, 10]);
    }

    #[test]
    fn missing_counters_are_absent() {
        let line = b"* STATUS INBOX (MESSAGES 10)\r\n";
        assert_eq!(
            parse_status_counters(line, &[Messages, Unseen, Recent]).unwrap(),
            vec![10, ABSENT, ABSENT]
        );
    }

    #[test]
    fn counters_for_encoded_mailbox() {
        let line = b"* STATUS \"Entw&APw-rfe\" (UIDNEXT 44292 RECENT 0)\r\n";
        assert_eq!(parse_status_counters(line, &[UidNext, Recent]).unwrap(), vec![44292, 0]);
    }

    #[test]
    fn counters_without_group_fail() {
        assert!(parse_status_counters(b"* STATUS INBOX\r\n", &[Messages]).is_err());
    }

    #[test]
    fn counters_from_wrong_response_fail() {
        assert!(matches!(
            parse_status_counters(b"* 3 EXISTS\r\n", &[Messages]),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn counters_with_huge_literal_fail() {
        let line = b"* STATUS {18446744073709551615}\r\nINBOX (MESSAGES 1)\r\n";
        assert!(parse_status_counters(line, &[Messages]).is_err());
    }

    #[test]
    fn quota_line() {
        let quota = parse_quota(b"* QUOTA \"user.fred\" (STORAGE 5120 10240)\r\n").unwrap();
        assert_eq!(quota.root, "user.fred");
        let storage = quota.resource("STORAGE").unwrap();
        assert_eq!((storage.usage, storage.limit), (5120, 10240));
    }

    #[test]
    fn quota_line_without_group() {
        let quota = parse_quota(b"* QUOTA \"\"\r\n").unwrap();
        assert!(quota.resources.is_empty());
    }

    #[test]
    fn acl_line() {
        let entries = parse_acl_entries(b"* ACL Shared Fred rwipslda \"other user\" lr\r\n").unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["Fred", "other user"]);
        assert!(entries[1].has_right('l'));
        assert!(!entries[1].has_right('w'));
    }
}
