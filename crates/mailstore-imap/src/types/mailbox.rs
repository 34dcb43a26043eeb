//! Mailbox names, LIST data and per-mailbox metadata (status, quota, ACL).

use super::{Flags, Uid, UidValidity};

/// Human-readable mailbox name.
///
/// Always holds the decoded form; commands encode it on the way out and the
/// parser decodes names the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `INBOX`.
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for INBOX in any letter case.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0.eq_ignore_ascii_case("INBOX")
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mailbox {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Snapshot of the selected mailbox, kept current by untagged responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Selected mailbox.
    pub name: Option<Mailbox>,
    /// Message count from the latest EXISTS.
    pub exists: u32,
    /// RECENT count.
    pub recent: u32,
    /// Next UID, if announced.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY, if announced.
    pub uid_validity: Option<UidValidity>,
    /// FLAGS defined for the mailbox.
    pub flags: Flags,
    /// Selected with EXAMINE or reported READ-ONLY.
    pub read_only: bool,
}

/// One LIST or LSUB entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Name attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter, `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// Decoded mailbox name.
    pub mailbox: Mailbox,
}

impl ListResponse {
    /// Returns true unless the entry carries `\Noselect` or `\NonExistent`.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self
            .attributes
            .iter()
            .any(|a| matches!(a, MailboxAttribute::NoSelect | MailboxAttribute::NonExistent))
    }
}

/// Name attribute from LIST/LSUB.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// `\Noselect`
    NoSelect,
    /// `\NonExistent`
    NonExistent,
    /// `\Noinferiors`
    NoInferiors,
    /// `\HasChildren`
    HasChildren,
    /// `\HasNoChildren`
    HasNoChildren,
    /// `\Marked`
    Marked,
    /// `\Unmarked`
    Unmarked,
    /// `\Subscribed`
    Subscribed,
    /// `\Drafts`
    Drafts,
    /// `\Sent`
    Sent,
    /// `\Trash`
    Trash,
    /// `\Junk`
    Junk,
    /// `\Archive`
    Archive,
    /// Anything else.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses an attribute atom, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "\\noselect" => Self::NoSelect,
            "\\nonexistent" => Self::NonExistent,
            "\\noinferiors" => Self::NoInferiors,
            "\\haschildren" => Self::HasChildren,
            "\\hasnochildren" => Self::HasNoChildren,
            "\\marked" => Self::Marked,
            "\\unmarked" => Self::Unmarked,
            "\\subscribed" => Self::Subscribed,
            "\\drafts" => Self::Drafts,
            "\\sent" => Self::Sent,
            "\\trash" => Self::Trash,
            "\\junk" | "\\spam" => Self::Junk,
            "\\archive" => Self::Archive,
            _ => Self::Unknown(s.to_string()),
        }
    }
}

/// STATUS data item name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAttribute {
    /// `MESSAGES`
    Messages,
    /// `RECENT`
    Recent,
    /// `UNSEEN`
    Unseen,
    /// `UIDNEXT`
    UidNext,
    /// `UIDVALIDITY`
    UidValidity,
}

impl StatusAttribute {
    /// Wire keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::Unseen => "UNSEEN",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
        }
    }

    /// Parses a keyword, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::Messages,
            Self::Recent,
            Self::Unseen,
            Self::UidNext,
            Self::UidValidity,
        ]
        .into_iter()
        .find(|attr| attr.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for StatusAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resource line of a QUOTA response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaResource {
    /// Resource name, e.g. `STORAGE` or `MESSAGE`.
    pub name: String,
    /// Current usage.
    pub usage: u64,
    /// Limit.
    pub limit: u64,
}

/// QUOTA response: a quota root and its resource limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    /// Quota root name; may be empty.
    pub root: String,
    /// Resources; empty when the server omits the list.
    pub resources: Vec<QuotaResource>,
}

impl Quota {
    /// Looks up a resource by name, case-insensitively.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&QuotaResource> {
        self.resources
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }
}

/// One identifier/rights pair of an ACL response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// User or group identifier.
    pub identifier: String,
    /// Rights string, e.g. `lrswipkxtecda`.
    pub rights: String,
}

impl AclEntry {
    /// Returns true if the right letter is granted.
    #[must_use]
    pub fn has_right(&self, right: char) -> bool {
        self.rights.contains(right)
    }
}
