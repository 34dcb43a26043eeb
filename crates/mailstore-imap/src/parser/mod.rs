//! Sans-I/O response parser.
//!
//! - [`Lexer`] tokenizes one framed response line.
//! - [`ResponseParser`] builds a typed [`Response`] from the tokens.
//! - The [`structured`] extractors pull STATUS counters, quota resources and
//!   ACL entries out of parsed responses.
//!
//! ```
//! use mailstore_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 4 EXISTS\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(UntaggedResponse::Exists(4)));
//! ```

pub mod lexer;
pub mod response;
pub mod structured;

pub use lexer::{Lexer, Token};
pub use response::{
    Address, Envelope, FetchItem, Response, ResponseParser, UntaggedResponse,
    parse_body_structure, parse_envelope,
};
pub use structured::{
    ABSENT, acl_entries, parse_acl_entries, parse_quota, parse_status_counters, quota,
    status_counters,
};
