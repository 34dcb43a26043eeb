//! Protocol value types: identifiers, flags, sets and mailbox metadata.

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{
    AclEntry, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, Quota, QuotaResource,
    StatusAttribute,
};
pub use response_code::ResponseCode;
pub use sequence::{SequenceSet, UidSet};
