//! STATUS, QUOTA, QUOTAROOT, ACL and MYRIGHTS data.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{AclEntry, Mailbox, Quota, QuotaResource, StatusAttribute};
use crate::Result;

use super::helpers::{parse_error, parse_mailbox};

/// `mailbox SP "(" [attr SP number *(SP attr SP number)] ")"`
///
/// Attributes outside [`StatusAttribute`] are skipped. A missing
/// parenthesized list is an error.
pub fn parse_status(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<(StatusAttribute, u64)>)> {
    let mailbox = parse_mailbox(lexer)?;
    lexer.skip_spaces();
    if lexer.peek() != Some(b'(') {
        return Err(parse_error(lexer, "STATUS response has no attribute list"));
    }
    lexer.advance();

    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                lexer.expect_space()?;
                let value = lexer.read_number64()?;
                if let Some(attr) = StatusAttribute::parse(name) {
                    items.push((attr, value));
                }
            }
            token => return Err(parse_error(lexer, format!("unexpected {token:?} in STATUS"))),
        }
    }
    Ok((mailbox, items))
}

/// `root [SP "(" resource SP usage SP limit *(...) ")"]`
///
/// Servers may omit the list entirely; that yields no resources.
pub fn parse_quota(lexer: &mut Lexer<'_>) -> Result<Quota> {
    let root = lexer.read_astring()?;
    lexer.skip_spaces();

    let mut resources = Vec::new();
    if lexer.peek() == Some(b'(') {
        lexer.advance();
        loop {
            match lexer.next_token()? {
                Token::RParen => break,
                Token::Space => {}
                Token::Atom(name) => {
                    lexer.expect_space()?;
                    let usage = lexer.read_number64()?;
                    lexer.expect_space()?;
                    let limit = lexer.read_number64()?;
                    resources.push(QuotaResource {
                        name: name.to_ascii_uppercase(),
                        usage,
                        limit,
                    });
                }
                token => return Err(parse_error(lexer, format!("unexpected {token:?} in QUOTA"))),
            }
        }
    }
    Ok(Quota { root, resources })
}

/// `mailbox *(SP root)`
pub fn parse_quota_root(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<String>)> {
    let mailbox = parse_mailbox(lexer)?;
    let mut roots = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.skip_spaces();
        if lexer.at_line_end() {
            break;
        }
        roots.push(lexer.read_astring()?);
    }
    Ok((mailbox, roots))
}

/// `mailbox *(SP identifier SP rights)`
///
/// The echoed mailbox name is consumed first so it never shows up as an
/// identifier.
pub fn parse_acl(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<AclEntry>)> {
    let mailbox = parse_mailbox(lexer)?;
    let mut entries = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.skip_spaces();
        if lexer.at_line_end() {
            break;
        }
        let identifier = lexer.read_astring()?;
        lexer.expect_space()?;
        let rights = lexer.read_astring()?;
        entries.push(AclEntry { identifier, rights });
    }
    Ok((mailbox, entries))
}

/// `mailbox SP rights`
pub fn parse_my_rights(lexer: &mut Lexer<'_>) -> Result<(Mailbox, String)> {
    let mailbox = parse_mailbox(lexer)?;
    lexer.expect_space()?;
    let rights = lexer.read_astring()?;
    Ok((mailbox, rights))
}
