//! Lexical tokens.

/// One token of a server response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Unquoted atom, including flags such as `\Seen`.
    Atom(&'a str),
    /// Quoted string with escapes resolved.
    QuotedString(String),
    /// Literal payload following a `{n}` prefix.
    Literal(Vec<u8>),
    /// Unsigned number; quota values may exceed 32 bits.
    Number(u64),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Single space.
    Space,
    /// `*` at the start of an untagged response or as a sequence wildcard.
    Asterisk,
    /// `+` continuation marker.
    Plus,
    /// `NIL`, matched case-insensitively.
    Nil,
    /// Line terminator.
    Crlf,
    /// End of input.
    Eof,
}
