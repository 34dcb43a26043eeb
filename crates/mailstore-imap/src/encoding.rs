//! Mailbox-name wire encoding.
//!
//! Names go through two steps before they hit the wire: modified UTF-7
//! (RFC 3501 section 5.1.3) turns them into printable ASCII, then the result
//! is sent as an atom or, when it would not parse as one, as a quoted string.

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};

const MUTF7: GeneralPurpose = GeneralPurpose::new(&IMAP_MUTF7, NO_PAD);

/// Encodes a mailbox name into a wire-ready token.
///
/// ```
/// use mailstore_imap::encoding::encode_argument;
///
/// assert_eq!(encode_argument("INBOX"), "INBOX");
/// assert_eq!(encode_argument("My \"Folder\""), r#""My \"Folder\"""#);
/// assert_eq!(encode_argument("Entwürfe"), "Entw&APw-rfe");
/// ```
#[must_use]
pub fn encode_argument(name: &str) -> String {
    quote_if_needed(&encode_mailbox_name(name))
}

/// Encodes a mailbox name to modified UTF-7 without quoting.
#[must_use]
pub fn encode_mailbox_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending: Vec<u16> = Vec::new();

    for ch in name.chars() {
        if (' '..='~').contains(&ch) {
            flush_utf16(&mut pending, &mut out);
            if ch == '&' {
                out.push_str("&-");
            } else {
                out.push(ch);
            }
        } else {
            let mut units = [0u16; 2];
            pending.extend_from_slice(ch.encode_utf16(&mut units));
        }
    }
    flush_utf16(&mut pending, &mut out);
    out
}

fn flush_utf16(pending: &mut Vec<u16>, out: &mut String) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|unit| unit.to_be_bytes()).collect();
    out.push('&');
    MUTF7.encode_string(bytes, out);
    out.push('-');
    pending.clear();
}

/// Decodes a modified UTF-7 mailbox name.
///
/// Returns `None` for malformed input: an unterminated shift, bad base64,
/// or an odd number of bytes in a shifted run.
#[must_use]
pub fn decode_mailbox_name(encoded: &str) -> Option<String> {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('-')?;
        let run = &after[..end];
        if run.is_empty() {
            out.push('&');
        } else {
            let bytes = MUTF7.decode(run).ok()?;
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            for ch in char::decode_utf16(units) {
                out.push(ch.ok()?);
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Some(out)
}

/// Decodes a server-supplied name, keeping the raw text if it is not valid
/// modified UTF-7.
#[must_use]
pub fn decode_mailbox_name_lossy(encoded: &str) -> String {
    decode_mailbox_name(encoded).unwrap_or_else(|| encoded.to_string())
}

/// Returns true if `token` cannot be sent as a bare atom.
#[must_use]
pub fn needs_quoting(token: &str) -> bool {
    token.is_empty()
        || token.eq_ignore_ascii_case("NIL")
        || token.bytes().any(|b| {
            b.is_ascii_whitespace()
                || b.is_ascii_control()
                || matches!(b, b'*' | b'%' | b'(' | b')' | b'{' | b'}' | b'"' | b'\\')
        })
}

/// Wraps `token` in quotes, escaping `"` and `\`, when it needs it.
#[must_use]
pub fn quote_if_needed(token: &str) -> String {
    if !needs_quoting(token) {
        return token.to_string();
    }
    let mut out = String::with_capacity(token.len() + 2);
    out.push('"');
    for ch in token.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_ascii_is_untouched() {
        assert_eq!(encode_argument("INBOX"), "INBOX");
        assert_eq!(encode_argument("Archive/2024"), "Archive/2024");
    }

    #[test]
    fn embedded_quote_is_escaped() {
        assert_eq!(encode_argument("My \"Folder\""), "\"My \\\"Folder\\\"\"");
    }

    #[test]
    fn backslash_and_wildcards_force_quoting() {
        assert_eq!(encode_argument("a\\b"), "\"a\\\\b\"");
        assert_eq!(encode_argument("50%"), "\"50%\"");
        assert_eq!(encode_argument("x*"), "\"x*\"");
        assert_eq!(encode_argument("{1}"), "\"{1}\"");
    }

    #[test]
    fn nil_and_empty_are_quoted() {
        assert_eq!(encode_argument("NIL"), "\"NIL\"");
        assert_eq!(encode_argument("nil"), "\"nil\"");
        assert_eq!(encode_argument(""), "\"\"");
    }

    #[test]
    fn ampersand_is_shifted() {
        assert_eq!(encode_mailbox_name("Tom & Jerry"), "Tom &- Jerry");
        assert_eq!(encode_argument("Tom & Jerry"), "\"Tom &- Jerry\"");
    }

    #[test]
    fn rfc3501_example() {
        assert_eq!(
            encode_mailbox_name("~peter/mail/台北/日本語"),
            "~peter/mail/&U,BTFw-/&ZeVnLIqe-"
        );
        assert_eq!(
            decode_mailbox_name("~peter/mail/&U,BTFw-/&ZeVnLIqe-").unwrap(),
            "~peter/mail/台北/日本語"
        );
    }

    #[test]
    fn astral_characters_use_surrogate_pairs() {
        let encoded = encode_mailbox_name("📁");
        assert_eq!(encoded, "&2D3cwQ-");
        assert_eq!(decode_mailbox_name(&encoded).unwrap(), "📁");
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(decode_mailbox_name("&Jjo").is_none());
        assert!(decode_mailbox_name("&AA-").is_none());
        assert_eq!(decode_mailbox_name_lossy("&Jjo"), "&Jjo");
    }

    proptest! {
        #[test]
        fn encoding_round_trips(name in "\\PC{0,24}") {
            let encoded = encode_mailbox_name(&name);
            prop_assert!(encoded.bytes().all(|b| (0x20..0x7f).contains(&b)));
            prop_assert_eq!(decode_mailbox_name(&encoded), Some(name));
        }

        #[test]
        fn quoted_tokens_unescape_to_input(token in "[ -~]{0,24}") {
            let quoted = quote_if_needed(&token);
            if quoted == token {
                prop_assert!(!needs_quoting(&token));
            } else {
                let inner = &quoted[1..quoted.len() - 1];
                let unescaped = inner.replace("\\\\", "\u{0}").replace("\\\"", "\"").replace('\u{0}', "\\");
                prop_assert_eq!(unescaped, token);
            }
        }
    }
}
