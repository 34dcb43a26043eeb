//! FETCH data items, envelopes and BODYSTRUCTURE.

use crate::body::{BodyFields, BodyStructure};
use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;
use crate::Result;

use super::helpers::{parse_error, parse_flag_list};
use super::types::{Address, Envelope, FetchItem};

/// Parses `(item value item value ...)`.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;
    let mut items = Vec::new();

    loop {
        let name = match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => continue,
            Token::Atom(name) => name.to_ascii_uppercase(),
            token => return Err(parse_error(lexer, format!("unexpected {token:?} in FETCH"))),
        };

        match name.as_str() {
            "FLAGS" => {
                lexer.expect_space()?;
                items.push(FetchItem::Flags(parse_flag_list(lexer)?));
            }
            "UID" => {
                lexer.expect_space()?;
                let n = lexer.read_number()?;
                let uid = Uid::new(n).ok_or_else(|| parse_error(lexer, "UID 0 in FETCH"))?;
                items.push(FetchItem::Uid(uid));
            }
            "RFC822.SIZE" => {
                lexer.expect_space()?;
                items.push(FetchItem::Rfc822Size(lexer.read_number()?));
            }
            "INTERNALDATE" => {
                lexer.expect_space()?;
                if let Some(date) = lexer.read_nstring()? {
                    items.push(FetchItem::InternalDate(date));
                }
            }
            "ENVELOPE" => {
                lexer.expect_space()?;
                items.push(FetchItem::Envelope(Box::new(parse_envelope(lexer)?)));
            }
            "BODYSTRUCTURE" => {
                lexer.expect_space()?;
                items.push(FetchItem::BodyStructure(parse_body_structure(lexer)?));
            }
            "BODY" if lexer.peek() == Some(b' ') => {
                // Non-extensible BODYSTRUCTURE form.
                lexer.expect_space()?;
                items.push(FetchItem::BodyStructure(parse_body_structure(lexer)?));
            }
            "BODY" | "BINARY" | "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                let (section, origin) = parse_section_and_origin(lexer);
                lexer.expect_space()?;
                let data = match lexer.next_token()? {
                    Token::Literal(d) => Some(d),
                    Token::QuotedString(s) => Some(s.into_bytes()),
                    _ => None,
                };
                items.push(FetchItem::Body {
                    section,
                    origin,
                    data,
                });
            }
            _ => skip_value(lexer)?,
        }
    }

    Ok(items)
}

/// Reads `[section]` and `<origin>` after `BODY`.
fn parse_section_and_origin(lexer: &mut Lexer<'_>) -> (Option<String>, Option<u32>) {
    let mut section = None;
    if lexer.peek() == Some(b'[') {
        lexer.advance();
        let rest = lexer.remaining();
        let mut len = 0;
        let mut depth = 0usize;
        while let Some(b) = lexer.peek() {
            match b {
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b']' if depth == 0 => break,
                _ => {}
            }
            lexer.advance();
            len += 1;
        }
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        lexer.advance();
        if !text.is_empty() {
            section = Some(text);
        }
    }

    let mut origin = None;
    if lexer.peek() == Some(b'<') {
        lexer.advance();
        let mut n: u32 = 0;
        while let Some(b) = lexer.peek().filter(u8::is_ascii_digit) {
            n = n.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            lexer.advance();
        }
        if lexer.peek() == Some(b'>') {
            lexer.advance();
            origin = Some(n);
        }
    }
    (section, origin)
}

/// Parses an ENVELOPE structure.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(Token::LParen)?;
    let date = lexer.read_nstring()?;
    lexer.expect_space()?;
    let subject = lexer.read_nstring()?;
    lexer.expect_space()?;

    let mut lists: [Vec<Address>; 6] = Default::default();
    for list in &mut lists {
        *list = parse_address_list(lexer)?;
        lexer.expect_space()?;
    }
    let [from, sender, reply_to, to, cc, bcc] = lists;

    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;
    let message_id = lexer.read_nstring()?;
    lexer.expect(Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();
            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        return Ok(addresses);
                    }
                    Some(b' ') => {
                        lexer.advance();
                    }
                    Some(b'(') => addresses.push(parse_address(lexer)?),
                    _ => return Err(parse_error(lexer, "malformed address list")),
                }
            }
        }
        token => Err(parse_error(lexer, format!("expected address list, got {token:?}"))),
    }
}

fn parse_address(lexer: &mut Lexer<'_>) -> Result<Address> {
    lexer.expect(Token::LParen)?;
    let name = lexer.read_nstring()?;
    lexer.expect_space()?;
    let adl = lexer.read_nstring()?;
    lexer.expect_space()?;
    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;
    let host = lexer.read_nstring()?;
    lexer.expect(Token::RParen)?;
    Ok(Address {
        name,
        adl,
        mailbox,
        host,
    })
}

/// Parses a BODYSTRUCTURE (or BODY) value.
///
/// Handles leaf parts, `MESSAGE/RFC822` with its nested envelope and body,
/// and multiparts including their extension parameters. Trailing extension
/// data (MD5, disposition, language, location) is skipped.
pub fn parse_body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    lexer.expect(Token::LParen)?;

    if lexer.peek() == Some(b'(') {
        let mut parts = Vec::new();
        while lexer.peek() == Some(b'(') {
            parts.push(parse_body_structure(lexer)?);
            lexer.skip_spaces();
        }
        let subtype = read_upper(lexer)?;
        let params = if lexer.peek() == Some(b' ') {
            lexer.advance();
            parse_body_params(lexer)?
        } else {
            Vec::new()
        };
        skip_to_close_paren(lexer)?;
        return Ok(BodyStructure::Multipart {
            subtype,
            params,
            parts,
        });
    }

    let media_type = read_upper(lexer)?;
    lexer.expect_space()?;
    let media_subtype = read_upper(lexer)?;
    lexer.expect_space()?;
    let params = parse_body_params(lexer)?;
    lexer.expect_space()?;
    let id = lexer.read_nstring()?;
    lexer.expect_space()?;
    let description = lexer.read_nstring()?;
    lexer.expect_space()?;
    let encoding = read_upper(lexer)?;
    lexer.expect_space()?;
    let size = lexer.read_number()?;
    let fields = BodyFields {
        params,
        id,
        description,
        encoding,
        size,
    };

    let node = if media_type == "MESSAGE" && media_subtype == "RFC822" {
        lexer.expect_space()?;
        let envelope = parse_envelope(lexer)?;
        lexer.expect_space()?;
        let body = parse_body_structure(lexer)?;
        lexer.expect_space()?;
        let lines = lexer.read_number()?;
        BodyStructure::Message {
            fields,
            envelope: Box::new(envelope),
            body: Box::new(body),
            lines,
        }
    } else {
        let lines = if media_type == "TEXT" && lexer.peek() == Some(b' ') {
            lexer.advance();
            Some(lexer.read_number()?)
        } else {
            None
        };
        BodyStructure::Single {
            media_type,
            media_subtype,
            fields,
            lines,
        }
    };

    skip_to_close_paren(lexer)?;
    Ok(node)
}

fn read_upper(lexer: &mut Lexer<'_>) -> Result<String> {
    Ok(lexer.read_nstring()?.unwrap_or_default().to_ascii_uppercase())
}

/// `NIL` or `(key value key value ...)`; keys are upper-cased.
fn parse_body_params(lexer: &mut Lexer<'_>) -> Result<Vec<(String, String)>> {
    match lexer.next_token()? {
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        return Ok(params);
                    }
                    Some(b' ') => {
                        lexer.advance();
                    }
                    Some(_) => {
                        let key = read_upper(lexer)?;
                        lexer.expect_space()?;
                        let value = lexer.read_nstring()?.unwrap_or_default();
                        params.push((key, value));
                    }
                    None => return Err(parse_error(lexer, "unterminated body parameters")),
                }
            }
        }
        _ => Ok(Vec::new()),
    }
}

/// Consumes everything up to and including the `)` closing the current list.
fn skip_to_close_paren(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 1usize;
    while depth > 0 {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            Token::Eof => return Err(parse_error(lexer, "unbalanced parentheses")),
            _ => {}
        }
    }
    Ok(())
}

/// Skips the value of a data item this parser does not model.
fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    // Section-bearing names like BINARY.SIZE[1] carry their brackets along.
    if lexer.peek() == Some(b'[') {
        parse_section_and_origin(lexer);
    }
    lexer.skip_spaces();
    match lexer.next_token()? {
        Token::LParen => skip_to_close_paren(lexer),
        _ => Ok(()),
    }
}
