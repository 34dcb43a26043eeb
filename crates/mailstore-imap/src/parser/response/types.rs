//! Parsed response data.

use crate::body::BodyStructure;
use crate::types::{
    AclEntry, Capability, Flags, ListResponse, Mailbox, Quota, ResponseCode, SeqNum,
    StatusAttribute, Uid,
};

/// One data item of a FETCH response.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchItem {
    /// `FLAGS`
    Flags(Flags),
    /// `INTERNALDATE`
    InternalDate(String),
    /// `RFC822.SIZE`
    Rfc822Size(u32),
    /// `ENVELOPE`
    Envelope(Box<Envelope>),
    /// `UID`
    Uid(Uid),
    /// `BODY[section]<origin>` payload.
    Body {
        /// Section specifier inside the brackets, if any.
        section: Option<String>,
        /// Partial-fetch origin.
        origin: Option<u32>,
        /// Payload; `None` for `NIL`.
        data: Option<Vec<u8>>,
    },
    /// `BODYSTRUCTURE` (or the non-extensible `BODY` form).
    BodyStructure(BodyStructure),
}

/// Message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Envelope address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route.
    pub adl: Option<String>,
    /// Local part.
    pub mailbox: Option<String>,
    /// Domain.
    pub host: Option<String>,
}

impl Address {
    /// `mailbox@host`, when both halves are present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// `* OK`
    Ok {
        /// Response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* NO`
    No {
        /// Response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* BAD`
    Bad {
        /// Response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* PREAUTH`
    PreAuth {
        /// Response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* BYE`: the server is about to close the connection.
    Bye {
        /// Response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* CAPABILITY`
    Capability(Vec<Capability>),
    /// `* LIST`
    List(ListResponse),
    /// `* LSUB`
    Lsub(ListResponse),
    /// `* FLAGS`
    Flags(Flags),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(SeqNum),
    /// `* n FETCH`
    Fetch {
        /// Sequence number of the message.
        seq: SeqNum,
        /// Data items.
        items: Vec<FetchItem>,
    },
    /// `* SEARCH`: sequence numbers, or UIDs after `UID SEARCH`.
    Search(Vec<u32>),
    /// `* SORT`: sequence numbers, or UIDs after `UID SORT`.
    Sort(Vec<u32>),
    /// `* STATUS`
    Status {
        /// Decoded mailbox name.
        mailbox: Mailbox,
        /// Attributes in server order.
        items: Vec<(StatusAttribute, u64)>,
    },
    /// `* QUOTA`
    Quota(Quota),
    /// `* QUOTAROOT`
    QuotaRoot {
        /// Decoded mailbox name.
        mailbox: Mailbox,
        /// Quota roots, possibly none.
        roots: Vec<String>,
    },
    /// `* ACL`
    Acl {
        /// Decoded mailbox name.
        mailbox: Mailbox,
        /// Identifier/rights pairs.
        entries: Vec<AclEntry>,
    },
    /// `* MYRIGHTS`
    MyRights {
        /// Decoded mailbox name.
        mailbox: Mailbox,
        /// Rights string.
        rights: String,
    },
    /// Any keyword this parser does not model.
    Unknown {
        /// Upper-cased keyword.
        keyword: String,
        /// Everything after the keyword.
        text: String,
    },
}

impl UntaggedResponse {
    /// Returns the response keyword, for logging.
    #[must_use]
    pub fn keyword(&self) -> &str {
        match self {
            Self::Ok { .. } => "OK",
            Self::No { .. } => "NO",
            Self::Bad { .. } => "BAD",
            Self::PreAuth { .. } => "PREAUTH",
            Self::Bye { .. } => "BYE",
            Self::Capability(_) => "CAPABILITY",
            Self::List(_) => "LIST",
            Self::Lsub(_) => "LSUB",
            Self::Flags(_) => "FLAGS",
            Self::Exists(_) => "EXISTS",
            Self::Recent(_) => "RECENT",
            Self::Expunge(_) => "EXPUNGE",
            Self::Fetch { .. } => "FETCH",
            Self::Search(_) => "SEARCH",
            Self::Sort(_) => "SORT",
            Self::Status { .. } => "STATUS",
            Self::Quota(_) => "QUOTA",
            Self::QuotaRoot { .. } => "QUOTAROOT",
            Self::Acl { .. } => "ACL",
            Self::MyRights { .. } => "MYRIGHTS",
            Self::Unknown { keyword, .. } => keyword,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_email_needs_both_parts() {
        let mut addr = Address {
            name: None,
            adl: None,
            mailbox: Some("fred".to_string()),
            host: Some("example.org".to_string()),
        };
        assert_eq!(addr.email().as_deref(), Some("fred@example.org"));
        addr.host = None;
        assert!(addr.email().is_none());
    }

    #[test]
    fn unknown_keyword_is_reported() {
        let resp = UntaggedResponse::Unknown {
            keyword: "XFOO".to_string(),
            text: String::new(),
        };
        assert_eq!(resp.keyword(), "XFOO");
        assert_eq!(UntaggedResponse::Exists(3).keyword(), "EXISTS");
    }
}
