//! # mailstore-imap
//!
//! IMAP (RFC 3501) client core for a mail store: pooled connections, a
//! command executor, typed parsers for the response shapes a store needs,
//! and a handful of policies built on top.
//!
//! ## Features
//!
//! - **Connection pool**: bounded per (host, port, login), idle reaping,
//!   one authentication retry without `AUTHENTICATE PLAIN`
//! - **Command executor**: tagged request/response with completion
//!   classification; unconsumed untagged data goes to observers
//! - **Structured parsers**: STATUS counters, QUOTA, ACL
//! - **Part locator**: find a MIME part by section path or Content-ID in a
//!   BODYSTRUCTURE tree
//! - **UID expunge fallback**: exact-set expunge on servers without UIDPLUS
//! - **Mailbox names**: modified UTF-7 plus quoting on every argument
//! - **TLS via rustls**: the default connector never needs OpenSSL
//! - **Sans-I/O parser**: protocol parsing separated from network I/O
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailstore_imap::connection::{Credential, Endpoint, ImapConnector};
//! use mailstore_imap::expunge::uid_expunge_with_fallback;
//! use mailstore_imap::pool::{Pool, PoolConfig};
//! use mailstore_imap::settings::ClientSettings;
//! use mailstore_imap::types::{Mailbox, Uid, UidSet};
//!
//! # async fn example() -> mailstore_imap::Result<()> {
//! let pool = Pool::new(ImapConnector::default(), PoolConfig::default());
//! let endpoint = Endpoint::tls("imap.example.com");
//! let credential = Credential::password("user@example.com", "secret");
//! let settings = ClientSettings::default();
//!
//! pool.with_connection(&endpoint, &credential, async |conn| {
//!     conn.select(&Mailbox::new("Trash")).await?;
//!     let uids = UidSet::from_uids([5, 7].into_iter().filter_map(Uid::new));
//!     if let Some(uids) = uids {
//!         uid_expunge_with_fallback(conn, &uids, &settings).await?;
//!     }
//!     Ok(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`pool`]: connection pool
//! - [`connection`]: transport, executor, typed command helpers, connector
//! - [`command`]: command values and their wire form
//! - [`parser`]: sans-I/O response parser and structured extractors
//! - [`body`]: BODYSTRUCTURE tree and part locator
//! - [`expunge`]: UID-scoped expunge with fallback
//! - [`encoding`]: mailbox-name encoding
//! - [`handler`]: observers for unsolicited responses
//! - [`metrics`]: per-command latency hook
//! - [`settings`]: reloadable runtime switches
//! - [`types`]: core protocol types (flags, mailboxes, sequences, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod body;
pub mod command;
pub mod connection;
pub mod encoding;
mod error;
pub mod expunge;
pub mod handler;
pub mod metrics;
pub mod parser;
pub mod pool;
pub mod settings;
pub mod types;

pub use body::{BodyStructure, PartTarget, SectionPath, ignorable, locate};
pub use command::{Command, FetchAttribute, FetchItems, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{
    Completion, Connection, Connector, Credential, Endpoint, ImapConnector, Responses, Security,
};
pub use encoding::{decode_mailbox_name, encode_argument};
pub use error::{Error, Refusal, Result};
pub use expunge::uid_expunge_with_fallback;
pub use handler::ResponseHandler;
pub use parser::{
    Response, ResponseParser, UntaggedResponse, parse_acl_entries, parse_quota,
    parse_status_counters,
};
pub use pool::{Pool, PoolConfig, PoolKey, PooledConnection};
pub use settings::{ClientSettings, Settings};
pub use types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SeqNum, SequenceSet, Status, Tag, Uid, UidSet, UidValidity,
};

/// IMAP protocol revision this client speaks.
pub const IMAP_VERSION: &str = "IMAP4rev1";
