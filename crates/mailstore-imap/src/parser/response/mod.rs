//! Response line parser.
//!
//! Turns one framed response line into a [`Response`]. Untagged keywords the
//! parser does not model come back as [`UntaggedResponse::Unknown`] instead of
//! failing, so a server extension never breaks command execution.

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod helpers;
mod mailbox_data;
mod types;

pub use fetch::{parse_body_structure, parse_envelope};
pub use types::{Address, Envelope, FetchItem, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};
use crate::Result;

use helpers::{
    parse_capability_data, parse_error, parse_flag_list, parse_list_response,
    parse_number_list, parse_response_code, read_text_until_crlf,
};
use mailbox_data::{parse_acl, parse_quota, parse_status};

/// A parsed response line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Tagged completion of a command.
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Completion status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged server data.
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Text or base64 challenge after `+`.
        text: Option<String>,
    },
}

/// Stateless response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response line, literals included.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer).map(Response::Untagged),
            Token::Plus => Ok(Self::parse_continuation(&mut lexer)),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            Token::Number(n) => Self::parse_tagged(&mut lexer, &n.to_string()),
            token => Err(parse_error(&lexer, format!("expected *, + or tag, got {token:?}"))),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect_space()?;
        let status = Self::parse_status_word(lexer)?;
        let (code, text) = Self::parse_resp_text(lexer)?;
        Ok(Response::Tagged {
            tag: Tag::new(tag),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
        lexer.expect_space()?;

        let keyword = match lexer.next_token()? {
            Token::Atom(s) => s.to_ascii_uppercase(),
            Token::Number(n) => return Self::parse_message_data(lexer, n),
            token => {
                return Err(parse_error(lexer, format!("unexpected {token:?} after *")));
            }
        };

        let response = match keyword.as_str() {
            "OK" | "NO" | "BAD" | "PREAUTH" | "BYE" => {
                let (code, text) = Self::parse_resp_text(lexer)?;
                match keyword.as_str() {
                    "OK" => UntaggedResponse::Ok { code, text },
                    "NO" => UntaggedResponse::No { code, text },
                    "BAD" => UntaggedResponse::Bad { code, text },
                    "PREAUTH" => UntaggedResponse::PreAuth { code, text },
                    _ => UntaggedResponse::Bye { code, text },
                }
            }
            "CAPABILITY" => UntaggedResponse::Capability(parse_capability_data(lexer)?),
            "LIST" => {
                lexer.expect_space()?;
                UntaggedResponse::List(parse_list_response(lexer)?)
            }
            "LSUB" => {
                lexer.expect_space()?;
                UntaggedResponse::Lsub(parse_list_response(lexer)?)
            }
            "FLAGS" => {
                lexer.expect_space()?;
                UntaggedResponse::Flags(parse_flag_list(lexer)?)
            }
            "SEARCH" => UntaggedResponse::Search(parse_number_list(lexer)?),
            "SORT" => UntaggedResponse::Sort(parse_number_list(lexer)?),
            "STATUS" => {
                lexer.expect_space()?;
                let (mailbox, items) = parse_status(lexer)?;
                UntaggedResponse::Status { mailbox, items }
            }
            "QUOTA" => {
                lexer.expect_space()?;
                UntaggedResponse::Quota(parse_quota(lexer)?)
            }
            "QUOTAROOT" => {
                lexer.expect_space()?;
                let (mailbox, roots) = mailbox_data::parse_quota_root(lexer)?;
                UntaggedResponse::QuotaRoot { mailbox, roots }
            }
            "ACL" => {
                lexer.expect_space()?;
                let (mailbox, entries) = parse_acl(lexer)?;
                UntaggedResponse::Acl { mailbox, entries }
            }
            "MYRIGHTS" => {
                lexer.expect_space()?;
                let (mailbox, rights) = mailbox_data::parse_my_rights(lexer)?;
                UntaggedResponse::MyRights { mailbox, rights }
            }
            _ => {
                lexer.skip_spaces();
                let text = read_text_until_crlf(lexer);
                UntaggedResponse::Unknown { keyword, text }
            }
        };
        Ok(response)
    }

    /// `* n EXISTS`, `* n RECENT`, `* n EXPUNGE`, `* n FETCH (...)`.
    fn parse_message_data(lexer: &mut Lexer<'_>, n: u64) -> Result<UntaggedResponse> {
        let n = u32::try_from(n).map_err(|_| parse_error(lexer, "message number too large"))?;
        lexer.expect_space()?;
        let keyword = lexer.read_atom_string()?.to_ascii_uppercase();

        let seq = || SeqNum::new(n).ok_or_else(|| parse_error(lexer, "sequence number 0"));
        match keyword.as_str() {
            "EXISTS" => Ok(UntaggedResponse::Exists(n)),
            "RECENT" => Ok(UntaggedResponse::Recent(n)),
            "EXPUNGE" => Ok(UntaggedResponse::Expunge(seq()?)),
            "FETCH" => {
                let seq = seq()?;
                lexer.expect_space()?;
                let items = fetch::parse_fetch_response(lexer)?;
                Ok(UntaggedResponse::Fetch { seq, items })
            }
            _ => {
                lexer.skip_spaces();
                let rest = read_text_until_crlf(lexer);
                Ok(UntaggedResponse::Unknown {
                    keyword,
                    text: if rest.is_empty() {
                        n.to_string()
                    } else {
                        format!("{n} {rest}")
                    },
                })
            }
        }
    }

    fn parse_continuation(lexer: &mut Lexer<'_>) -> Response {
        lexer.skip_spaces();
        let text = read_text_until_crlf(lexer);
        Response::Continuation {
            text: (!text.is_empty()).then_some(text),
        }
    }

    fn parse_status_word(lexer: &mut Lexer<'_>) -> Result<Status> {
        let word = lexer.read_atom_string()?;
        match word.to_ascii_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(parse_error(lexer, format!("invalid status {word}"))),
        }
    }

    /// `[SP] ["[" code "]" SP] text`
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        lexer.skip_spaces();
        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };
        lexer.skip_spaces();
        Ok((code, read_text_until_crlf(lexer)))
    }
}
