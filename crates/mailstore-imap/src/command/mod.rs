//! Client commands and their wire form.
//!
//! Every mailbox argument is written through
//! [`encode_argument`](crate::encoding::encode_argument), so callers always
//! pass decoded, human-readable names.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, SequenceSet, StatusAttribute, UidSet};

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems, SearchCriteria, SortCriterion, SortKey, StoreAction};

use serialize::{
    write_astring, write_fetch_items, write_mailbox, write_search_criteria, write_sort_criteria,
    write_store_action,
};

/// A client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `CAPABILITY`
    Capability,
    /// `NOOP`
    Noop,
    /// `LOGOUT`
    Logout,
    /// `LOGIN user password`
    Login {
        /// Login name.
        username: String,
        /// Password.
        password: String,
    },
    /// `AUTHENTICATE mechanism [initial-response]`
    Authenticate {
        /// SASL mechanism name.
        mechanism: String,
        /// Base64 initial response (SASL-IR).
        initial_response: Option<String>,
    },
    /// `STATUS mailbox (items)`
    Status {
        /// Mailbox to query.
        mailbox: Mailbox,
        /// Requested counters.
        items: Vec<StatusAttribute>,
    },
    /// `GETQUOTAROOT mailbox` (RFC 2087)
    GetQuotaRoot {
        /// Mailbox to query.
        mailbox: Mailbox,
    },
    /// `GETACL mailbox` (RFC 4314)
    GetAcl {
        /// Mailbox to query.
        mailbox: Mailbox,
    },
    /// `MYRIGHTS mailbox` (RFC 4314)
    MyRights {
        /// Mailbox to query.
        mailbox: Mailbox,
    },
    /// `LIST reference pattern`
    List {
        /// Reference name.
        reference: String,
        /// Pattern with `*`/`%` wildcards.
        pattern: String,
    },
    /// `LSUB reference pattern`
    Lsub {
        /// Reference name.
        reference: String,
        /// Pattern with `*`/`%` wildcards.
        pattern: String,
    },
    /// `CREATE mailbox`
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// `DELETE mailbox`
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// `RENAME from to`
    Rename {
        /// Current name.
        from: Mailbox,
        /// New name.
        to: Mailbox,
    },
    /// `SELECT mailbox`
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// `EXAMINE mailbox`
    Examine {
        /// Mailbox to open read-only.
        mailbox: Mailbox,
    },
    /// `SUBSCRIBE mailbox`
    Subscribe {
        /// Mailbox to subscribe to.
        mailbox: Mailbox,
    },
    /// `UNSUBSCRIBE mailbox`
    Unsubscribe {
        /// Mailbox to unsubscribe from.
        mailbox: Mailbox,
    },
    /// `[UID] SORT (keys) charset criteria` (RFC 5256)
    Sort {
        /// Sort keys, most significant first.
        keys: Vec<SortCriterion>,
        /// Search charset.
        charset: String,
        /// Messages to sort.
        criteria: SearchCriteria,
        /// Return UIDs.
        uid: bool,
    },
    /// `[UID] SEARCH criteria`
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
        /// Return UIDs.
        uid: bool,
    },
    /// `FETCH set items`
    Fetch {
        /// Messages by sequence number.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
    },
    /// `UID FETCH set items`
    UidFetch {
        /// Messages by UID.
        uids: UidSet,
        /// Items to fetch.
        items: FetchItems,
    },
    /// `STORE set action`
    Store {
        /// Messages by sequence number.
        sequence: SequenceSet,
        /// Flag change.
        action: StoreAction,
        /// Suppress the FETCH echo.
        silent: bool,
    },
    /// `UID STORE set action`
    UidStore {
        /// Messages by UID.
        uids: UidSet,
        /// Flag change.
        action: StoreAction,
        /// Suppress the FETCH echo.
        silent: bool,
    },
    /// `EXPUNGE`
    Expunge,
    /// `UID EXPUNGE set` (RFC 4315)
    UidExpunge {
        /// UIDs to expunge; each must already carry `\Deleted`.
        uids: UidSet,
    },
    /// `SETMETADATA mailbox (entry value ...)` (RFC 5464)
    SetMetadata {
        /// Mailbox, or empty for server annotations.
        mailbox: Mailbox,
        /// Entries to set; `None` removes the entry.
        entries: Vec<(String, Option<String>)>,
    },
    /// `CLOSE`
    Close,
}

impl Command {
    /// Command name as sent on the wire, `UID` prefix included.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Authenticate { .. } => "AUTHENTICATE",
            Self::Status { .. } => "STATUS",
            Self::GetQuotaRoot { .. } => "GETQUOTAROOT",
            Self::GetAcl { .. } => "GETACL",
            Self::MyRights { .. } => "MYRIGHTS",
            Self::List { .. } => "LIST",
            Self::Lsub { .. } => "LSUB",
            Self::Create { .. } => "CREATE",
            Self::Delete { .. } => "DELETE",
            Self::Rename { .. } => "RENAME",
            Self::Select { .. } => "SELECT",
            Self::Examine { .. } => "EXAMINE",
            Self::Subscribe { .. } => "SUBSCRIBE",
            Self::Unsubscribe { .. } => "UNSUBSCRIBE",
            Self::Sort { uid: true, .. } => "UID SORT",
            Self::Sort { uid: false, .. } => "SORT",
            Self::Search { uid: true, .. } => "UID SEARCH",
            Self::Search { uid: false, .. } => "SEARCH",
            Self::Fetch { .. } => "FETCH",
            Self::UidFetch { .. } => "UID FETCH",
            Self::Store { .. } => "STORE",
            Self::UidStore { .. } => "UID STORE",
            Self::Expunge => "EXPUNGE",
            Self::UidExpunge { .. } => "UID EXPUNGE",
            Self::SetMetadata { .. } => "SETMETADATA",
            Self::Close => "CLOSE",
        }
    }

    /// Serializes the command, CRLF included, under `tag`.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.verb().as_bytes());

        match self {
            Self::Capability
            | Self::Noop
            | Self::Logout
            | Self::Expunge
            | Self::Close => {}

            Self::Login { username, password } => {
                buf.push(b' ');
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                buf.push(b' ');
                buf.extend_from_slice(mechanism.as_bytes());
                if let Some(ir) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(if ir.is_empty() { b"=" } else { ir.as_bytes() });
                }
            }

            Self::Status { mailbox, items } => {
                buf.push(b' ');
                write_mailbox(&mut buf, mailbox);
                buf.extend_from_slice(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    buf.extend_from_slice(item.as_str().as_bytes());
                }
                buf.push(b')');
            }

            Self::GetQuotaRoot { mailbox }
            | Self::GetAcl { mailbox }
            | Self::MyRights { mailbox }
            | Self::Create { mailbox }
            | Self::Delete { mailbox }
            | Self::Select { mailbox }
            | Self::Examine { mailbox }
            | Self::Subscribe { mailbox }
            | Self::Unsubscribe { mailbox } => {
                buf.push(b' ');
                write_mailbox(&mut buf, mailbox);
            }

            Self::List { reference, pattern } | Self::Lsub { reference, pattern } => {
                buf.push(b' ');
                write_mailbox(&mut buf, &Mailbox::new(reference.as_str()));
                buf.push(b' ');
                write_mailbox(&mut buf, &Mailbox::new(pattern.as_str()));
            }

            Self::Rename { from, to } => {
                buf.push(b' ');
                write_mailbox(&mut buf, from);
                buf.push(b' ');
                write_mailbox(&mut buf, to);
            }

            Self::Sort {
                keys,
                charset,
                criteria,
                ..
            } => {
                buf.push(b' ');
                write_sort_criteria(&mut buf, keys);
                buf.push(b' ');
                write_astring(&mut buf, charset);
                buf.push(b' ');
                write_search_criteria(&mut buf, criteria);
            }

            Self::Search { criteria, .. } => {
                buf.push(b' ');
                write_search_criteria(&mut buf, criteria);
            }

            Self::Fetch { sequence, items } => {
                buf.extend_from_slice(format!(" {sequence} ").as_bytes());
                write_fetch_items(&mut buf, items);
            }

            Self::UidFetch { uids, items } => {
                buf.extend_from_slice(format!(" {uids} ").as_bytes());
                write_fetch_items(&mut buf, items);
            }

            Self::Store {
                sequence,
                action,
                silent,
            } => {
                buf.extend_from_slice(format!(" {sequence} ").as_bytes());
                write_store_action(&mut buf, action, *silent);
            }

            Self::UidStore {
                uids,
                action,
                silent,
            } => {
                buf.extend_from_slice(format!(" {uids} ").as_bytes());
                write_store_action(&mut buf, action, *silent);
            }

            Self::UidExpunge { uids } => {
                buf.extend_from_slice(format!(" {uids}").as_bytes());
            }

            Self::SetMetadata { mailbox, entries } => {
                buf.push(b' ');
                if mailbox.as_str().is_empty() {
                    buf.extend_from_slice(b"\"\"");
                } else {
                    write_mailbox(&mut buf, mailbox);
                }
                buf.extend_from_slice(b" (");
                for (i, (entry, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_astring(&mut buf, entry);
                    buf.push(b' ');
                    match value {
                        Some(v) => write_quoted(&mut buf, v),
                        None => buf.extend_from_slice(b"NIL"),
                    }
                }
                buf.push(b')');
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns true if the command carries a secret that must not be logged.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Authenticate { .. })
    }
}

/// Metadata values are strings, never atoms.
fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}
