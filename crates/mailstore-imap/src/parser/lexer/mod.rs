//! Tokenizer for server response lines.
//!
//! Works on a complete, already-framed line (literals included), so it never
//! has to wait for more input.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// Cursor over one response line.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Unconsumed input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    /// Returns true once every byte is consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Current byte, if any.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Byte `offset` positions ahead.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos.checked_add(offset)?).copied()
    }

    /// Consumes one byte.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes up to `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.input.len());
    }

    /// Produces the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b' ' => Some(Token::Space),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match byte {
            b'\r' if self.peek_at(1) == Some(b'\n') => {
                self.skip(2);
                Ok(Token::Crlf)
            }
            b'\n' => {
                self.advance();
                Ok(Token::Crlf)
            }
            b'"' => self.quoted(),
            b'{' => self.literal(),
            _ if is_atom_char(byte) => self.atom_or_number(),
            _ => Err(self.error(&format!("unexpected byte {byte:#04x}"))),
        }
    }

    fn quoted(&mut self) -> Result<Token<'a>> {
        self.advance();
        let mut out = Vec::new();
        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => out.push(c),
                    Some(c) => return Err(self.error(&format!("invalid escape \\{}", c as char))),
                    None => return Err(self.error("unterminated quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("unterminated quoted string"));
                }
                Some(c) => out.push(c),
            }
        }
        let s = String::from_utf8(out).map_err(|_| self.error("quoted string is not UTF-8"))?;
        Ok(Token::QuotedString(s))
    }

    fn literal(&mut self) -> Result<Token<'a>> {
        self.advance();
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let size: usize = std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("invalid literal size"))?;
        // Non-synchronizing marker from LITERAL+ echoes.
        if self.peek() == Some(b'+') {
            self.advance();
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("expected } after literal size"));
        }
        if self.peek() == Some(b'\r') {
            self.advance();
        }
        if self.advance() != Some(b'\n') {
            return Err(self.error("expected CRLF after literal size"));
        }
        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("literal runs past end of input"))?;
        let data = self.input[self.pos..end].to_vec();
        self.pos = end;
        Ok(Token::Literal(data))
    }

    fn atom_or_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.advance();
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("atom is not UTF-8"))?;

        if text.bytes().all(|b| b.is_ascii_digit()) {
            return text
                .parse()
                .map(Token::Number)
                .map_err(|_| self.error("number out of range"));
        }
        if text.eq_ignore_ascii_case("NIL") {
            return Ok(Token::Nil);
        }
        Ok(Token::Atom(text))
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Consumes a token of the same kind as `expected`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Reads an atom, quoted string or literal as text.
    ///
    /// Digit-only atoms (mailbox `2024`) come back as text too.
    pub fn read_astring(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s.to_string()),
            Token::Number(n) => Ok(n.to_string()),
            Token::QuotedString(s) => Ok(s),
            Token::Nil => Ok("NIL".to_string()),
            Token::Literal(data) => {
                String::from_utf8(data).map_err(|_| self.error("literal is not UTF-8"))
            }
            token => Err(self.error(&format!("expected astring, got {token:?}"))),
        }
    }

    /// Reads `NIL` or a string.
    pub fn read_nstring(&mut self) -> Result<Option<String>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::QuotedString(s) => Ok(Some(s)),
            Token::Literal(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|_| self.error("literal is not UTF-8")),
            token => Err(self.error(&format!("expected nstring, got {token:?}"))),
        }
    }

    /// Reads a number that must fit in 32 bits.
    pub fn read_number(&mut self) -> Result<u32> {
        let n = self.read_number64()?;
        u32::try_from(n).map_err(|_| self.error(&format!("{n} does not fit in 32 bits")))
    }

    /// Reads a number.
    pub fn read_number64(&mut self) -> Result<u64> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("expected number, got {token:?}"))),
        }
    }

    /// Reads an atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("expected atom, got {token:?}"))),
        }
    }

    /// Skips any run of spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.advance();
        }
    }

    /// Returns true if only spaces and a line terminator are left.
    #[must_use]
    pub fn at_line_end(&self) -> bool {
        self.remaining()
            .iter()
            .all(|b| matches!(b, b' ' | b'\r' | b'\n'))
    }
}

/// Returns true for bytes that may appear inside an atom.
///
/// Accepts `\` so flags lex as one atom, and the list wildcards `%`/`*` after
/// the first byte so LIST patterns echo back intact. A leading `*` is always
/// [`Token::Asterisk`] because `next_token` checks it first.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    b > 0x20 && b < 0x7F && !matches!(b, b'(' | b')' | b'{' | b'"' | b']' | b'[')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            match lexer.next_token().unwrap() {
                Token::Eof => return out,
                t => out.push(t),
            }
        }
    }

    #[test]
    fn untagged_status_line() {
        assert_eq!(
            tokens(b"* STATUS INBOX (MESSAGES 10)\r\n"),
            vec![
                Token::Asterisk,
                Token::Space,
                Token::Atom("STATUS"),
                Token::Space,
                Token::Atom("INBOX"),
                Token::Space,
                Token::LParen,
                Token::Atom("MESSAGES"),
                Token::Space,
                Token::Number(10),
                Token::RParen,
                Token::Crlf,
            ]
        );
    }

    #[test]
    fn numbers_beyond_u32() {
        let mut lexer = Lexer::new(b"8589934592");
        assert_eq!(lexer.read_number64().unwrap(), 8_589_934_592);
        let mut lexer = Lexer::new(b"8589934592");
        assert!(lexer.read_number().is_err());
    }

    #[test]
    fn quoted_string_escapes() {
        assert_eq!(
            tokens(br#""My \"Folder\" \\ x""#),
            vec![Token::QuotedString("My \"Folder\" \\ x".to_string())]
        );
    }

    #[test]
    fn quoted_string_rejects_bad_escape() {
        assert!(Lexer::new(br#""a\b""#).next_token().is_err());
    }

    #[test]
    fn nil_any_case() {
        assert_eq!(tokens(b"nil"), vec![Token::Nil]);
    }

    #[test]
    fn literal_payload() {
        let mut lexer = Lexer::new(b"{5}\r\nhello rest");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Literal(b"hello".to_vec())
        );
        assert_eq!(lexer.remaining(), b" rest");
    }

    #[test]
    fn truncated_literal_is_an_error() {
        assert!(Lexer::new(b"{10}\r\nshort").next_token().is_err());
    }

    #[test]
    fn literal_size_near_usize_max_is_an_error() {
        assert!(
            Lexer::new(b"{18446744073709551615}\r\nINBOX")
                .next_token()
                .is_err()
        );
    }

    #[test]
    fn flags_and_wildcards_are_atoms() {
        assert_eq!(
            tokens(b"\\Deleted Foo%"),
            vec![Token::Atom("\\Deleted"), Token::Space, Token::Atom("Foo%")]
        );
    }

    #[test]
    fn astring_accepts_digit_names() {
        let mut lexer = Lexer::new(b"2024");
        assert_eq!(lexer.read_astring().unwrap(), "2024");
    }
}
