//! Parsers for the shared pieces of response grammar.

use crate::encoding::decode_mailbox_name_lossy;
use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, ResponseCode, Uid,
    UidValidity,
};
use crate::{Error, Result};

pub fn parse_error(lexer: &Lexer<'_>, message: impl Into<String>) -> Error {
    Error::Parse {
        position: lexer.position(),
        message: message.into(),
    }
}

/// Parses `[CODE args]`.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;
    let atom = lexer.read_atom_string()?;

    let code = match atom.to_ascii_uppercase().as_str() {
        "UIDNEXT" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            ResponseCode::UidNext(Uid::new(n).ok_or_else(|| parse_error(lexer, "UIDNEXT 0"))?)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            ResponseCode::UidValidity(
                UidValidity::new(n).ok_or_else(|| parse_error(lexer, "UIDVALIDITY 0"))?,
            )
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            ResponseCode::Unseen(lexer.read_number()?)
        }
        "CAPABILITY" => ResponseCode::Capability(parse_capability_data(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            ResponseCode::PermanentFlags(parse_flag_list(lexer)?.into_iter().collect())
        }
        _ => ResponseCode::from_atom(atom),
    };

    // Arguments of codes we do not model are skipped.
    while !matches!(lexer.peek(), Some(b']') | None) {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;
    Ok(code)
}

/// Parses the space-separated atoms after `CAPABILITY`.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Atom(s) => caps.push(Capability::parse(s)),
            Token::RBracket => break,
            _ => {}
        }
    }
    Ok(caps)
}

/// Parses `(flag flag ...)`.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;
    let mut flags = Flags::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(flags),
            Token::Space => {}
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            // Bare wildcard.
            Token::Asterisk => flags.insert(Flag::Keyword("*".to_string())),
            token => return Err(parse_error(lexer, format!("unexpected {token:?} in flag list"))),
        }
    }
}

/// Parses the body of a LIST or LSUB response.
pub fn parse_list_response(lexer: &mut Lexer<'_>) -> Result<ListResponse> {
    lexer.expect(Token::LParen)?;
    let mut attributes = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            token => {
                return Err(parse_error(lexer, format!("unexpected {token:?} in LIST attributes")));
            }
        }
    }
    lexer.expect_space()?;

    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => return Err(parse_error(lexer, format!("expected delimiter, got {token:?}"))),
    };
    lexer.expect_space()?;

    let mailbox = parse_mailbox(lexer)?;
    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox,
    })
}

/// Reads a mailbox astring and decodes its modified UTF-7 form.
pub fn parse_mailbox(lexer: &mut Lexer<'_>) -> Result<Mailbox> {
    let raw = lexer.read_astring()?;
    if raw.eq_ignore_ascii_case("INBOX") {
        return Ok(Mailbox::inbox());
    }
    Ok(Mailbox::new(decode_mailbox_name_lossy(&raw)))
}

/// Parses the number list after `SEARCH` or `SORT`.
pub fn parse_number_list(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut nums = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Number(n) => {
                nums.push(u32::try_from(n).map_err(|_| parse_error(lexer, "number too large"))?);
            }
            // Trailing `(MODSEQ n)` and similar extensions end the list.
            Token::LParen | Token::Crlf | Token::Eof => break,
            Token::Space => {}
            token => return Err(parse_error(lexer, format!("expected number, got {token:?}"))),
        }
    }
    Ok(nums)
}

/// Consumes text up to the line terminator.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();
    let end = remaining
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(remaining.len());
    lexer.skip(end);
    while matches!(lexer.peek(), Some(b'\r' | b'\n')) {
        lexer.advance();
    }
    String::from_utf8_lossy(&remaining[..end]).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn response_code_with_argument() {
        let mut lexer = Lexer::new(b"[UIDNEXT 4392]");
        assert_eq!(
            parse_response_code(&mut lexer).unwrap(),
            ResponseCode::UidNext(Uid::new(4392).unwrap())
        );
    }

    #[test]
    fn response_code_unknown_arguments_skipped() {
        let mut lexer = Lexer::new(b"[BADCHARSET (UTF-8)] rest");
        assert_eq!(
            parse_response_code(&mut lexer).unwrap(),
            ResponseCode::Unknown("BADCHARSET".to_string())
        );
        assert_eq!(lexer.remaining(), b" rest");
    }

    #[test]
    fn permanent_flags_with_wildcard() {
        let mut lexer = Lexer::new(b"[PERMANENTFLAGS (\\Deleted \\Seen \\*)]");
        let ResponseCode::PermanentFlags(flags) = parse_response_code(&mut lexer).unwrap() else {
            panic!("expected PERMANENTFLAGS");
        };
        assert!(flags.contains(&Flag::Deleted));
        assert_eq!(flags.len(), 3);
    }

    #[test]
    fn list_response_decodes_name() {
        let mut lexer = Lexer::new(b"(\\HasNoChildren) \"/\" \"Entw&APw-rfe\"");
        let list = parse_list_response(&mut lexer).unwrap();
        assert_eq!(list.mailbox.as_str(), "Entwürfe");
        assert_eq!(list.delimiter, Some('/'));
    }

    #[test]
    fn list_response_nil_delimiter() {
        let mut lexer = Lexer::new(b"() NIL inbox");
        let list = parse_list_response(&mut lexer).unwrap();
        assert_eq!(list.delimiter, None);
        assert!(list.mailbox.is_inbox());
    }

    #[test]
    fn number_list() {
        let mut lexer = Lexer::new(b" 2 84 882\r\n");
        assert_eq!(parse_number_list(&mut lexer).unwrap(), vec![2, 84, 882]);
    }

    #[test]
    fn text_until_line_end() {
        let mut lexer = Lexer::new(b"Completed in 0.01 secs\r\n");
        assert_eq!(read_text_until_crlf(&mut lexer), "Completed in 0.01 secs");
        assert!(lexer.is_eof());
    }
}
