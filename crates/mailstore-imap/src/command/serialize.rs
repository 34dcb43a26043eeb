//! Argument writers shared by [`Command::serialize`](super::Command::serialize).

use crate::encoding::{encode_argument, quote_if_needed};
use crate::types::{Flag, Mailbox};

use super::types::{FetchAttribute, FetchItems, SearchCriteria, SortCriterion, StoreAction};

/// Writes a string argument, quoting it when it is not a plain atom.
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(quote_if_needed(s).as_bytes());
}

/// Writes a mailbox name in its modified UTF-7 wire form.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    buf.extend_from_slice(encode_argument(mailbox.as_str()).as_bytes());
}

/// Writes `(a b c)` from already-formatted items.
fn write_list<T>(buf: &mut Vec<u8>, items: &[T], mut write: impl FnMut(&mut Vec<u8>, &T)) {
    buf.push(b'(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        write(buf, item);
    }
    buf.push(b')');
}

pub fn write_flags(buf: &mut Vec<u8>, flags: &[Flag]) {
    write_list(buf, flags, |buf, flag| buf.extend_from_slice(flag.as_str().as_bytes()));
}

pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    match items {
        FetchItems::All => buf.extend_from_slice(b"ALL"),
        FetchItems::Full => buf.extend_from_slice(b"FULL"),
        FetchItems::Fast => buf.extend_from_slice(b"FAST"),
        FetchItems::Items(attrs) if attrs.len() == 1 => write_fetch_attribute(buf, &attrs[0]),
        FetchItems::Items(attrs) => write_list(buf, attrs, write_fetch_attribute),
    }
}

fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Envelope => buf.extend_from_slice(b"ENVELOPE"),
        FetchAttribute::BodyStructure => buf.extend_from_slice(b"BODYSTRUCTURE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Body {
            section,
            peek,
            partial,
        } => {
            buf.extend_from_slice(if *peek { b"BODY.PEEK[" } else { b"BODY[" });
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
            if let Some((start, len)) = partial {
                buf.extend_from_slice(format!("<{start}.{len}>").as_bytes());
            }
        }
    }
}

pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction, silent: bool) {
    let (item, flags) = action.parts();
    buf.extend_from_slice(item.as_bytes());
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.push(b' ');
    write_flags(buf, flags);
}

pub fn write_sort_criteria(buf: &mut Vec<u8>, criteria: &[SortCriterion]) {
    write_list(buf, criteria, |buf, c| {
        if c.reverse {
            buf.extend_from_slice(b"REVERSE ");
        }
        buf.extend_from_slice(c.key.as_str().as_bytes());
    });
}

pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    let keyword = |buf: &mut Vec<u8>, word: &str, arg: &str| {
        buf.extend_from_slice(word.as_bytes());
        buf.push(b' ');
        write_astring(buf, arg);
    };
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::Answered => buf.extend_from_slice(b"ANSWERED"),
        SearchCriteria::Deleted => buf.extend_from_slice(b"DELETED"),
        SearchCriteria::Draft => buf.extend_from_slice(b"DRAFT"),
        SearchCriteria::Flagged => buf.extend_from_slice(b"FLAGGED"),
        SearchCriteria::New => buf.extend_from_slice(b"NEW"),
        SearchCriteria::Seen => buf.extend_from_slice(b"SEEN"),
        SearchCriteria::Undeleted => buf.extend_from_slice(b"UNDELETED"),
        SearchCriteria::Unseen => buf.extend_from_slice(b"UNSEEN"),
        SearchCriteria::SequenceSet(set) => buf.extend_from_slice(set.to_string().as_bytes()),
        SearchCriteria::Uid(set) => buf.extend_from_slice(format!("UID {set}").as_bytes()),
        SearchCriteria::Subject(s) => keyword(buf, "SUBJECT", s),
        SearchCriteria::From(s) => keyword(buf, "FROM", s),
        SearchCriteria::To(s) => keyword(buf, "TO", s),
        SearchCriteria::Body(s) => keyword(buf, "BODY", s),
        SearchCriteria::Text(s) => keyword(buf, "TEXT", s),
        SearchCriteria::Since(date) => keyword(buf, "SINCE", date),
        SearchCriteria::Before(date) => keyword(buf, "BEFORE", date),
        SearchCriteria::On(date) => keyword(buf, "ON", date),
        SearchCriteria::Larger(size) => buf.extend_from_slice(format!("LARGER {size}").as_bytes()),
        SearchCriteria::Smaller(size) => {
            buf.extend_from_slice(format!("SMALLER {size}").as_bytes());
        }
        SearchCriteria::Header(name, value) => {
            keyword(buf, "HEADER", name);
            buf.push(b' ');
            write_astring(buf, value);
        }
        SearchCriteria::And(all) => {
            for (i, c) in all.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_search_criteria(buf, c);
            }
        }
        SearchCriteria::Or(a, b) => {
            buf.extend_from_slice(b"OR ");
            write_search_key(buf, a);
            buf.push(b' ');
            write_search_key(buf, b);
        }
        SearchCriteria::Not(c) => {
            buf.extend_from_slice(b"NOT ");
            write_search_key(buf, c);
        }
    }
}

/// Operand of `OR`/`NOT`; a conjunction needs parentheses there.
fn write_search_key(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    if matches!(criteria, SearchCriteria::And(all) if all.len() > 1) {
        buf.push(b'(');
        write_search_criteria(buf, criteria);
        buf.push(b')');
    } else {
        write_search_criteria(buf, criteria);
    }
}
