//! Arguments for FETCH, STORE, SEARCH and SORT.

use crate::types::{Flag, SequenceSet, UidSet};

/// FETCH items to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// `ALL` macro: FLAGS INTERNALDATE RFC822.SIZE ENVELOPE.
    All,
    /// `FULL` macro: `ALL` plus BODY.
    Full,
    /// `FAST` macro: FLAGS INTERNALDATE RFC822.SIZE.
    Fast,
    /// Explicit list.
    Items(Vec<FetchAttribute>),
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `FLAGS`
    Flags,
    /// `INTERNALDATE`
    InternalDate,
    /// `RFC822.SIZE`
    Rfc822Size,
    /// `ENVELOPE`
    Envelope,
    /// `BODYSTRUCTURE`
    BodyStructure,
    /// `UID`
    Uid,
    /// `BODY[section]<start.len>` or its `BODY.PEEK` form.
    Body {
        /// Section specifier such as `1.2` or `HEADER`.
        section: Option<String>,
        /// Leave `\Seen` untouched.
        peek: bool,
        /// Partial fetch `(start, length)`.
        partial: Option<(u32, u32)>,
    },
}

/// Flag change requested by STORE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// `FLAGS`: replace.
    Set(Vec<Flag>),
    /// `+FLAGS`: add.
    Add(Vec<Flag>),
    /// `-FLAGS`: remove.
    Remove(Vec<Flag>),
}

impl StoreAction {
    pub(crate) fn parts(&self) -> (&'static str, &[Flag]) {
        match self {
            Self::Set(flags) => ("FLAGS", flags),
            Self::Add(flags) => ("+FLAGS", flags),
            Self::Remove(flags) => ("-FLAGS", flags),
        }
    }
}

/// SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// `ALL`
    All,
    /// `ANSWERED`
    Answered,
    /// `DELETED`
    Deleted,
    /// `DRAFT`
    Draft,
    /// `FLAGGED`
    Flagged,
    /// `NEW`
    New,
    /// `SEEN`
    Seen,
    /// `UNDELETED`
    Undeleted,
    /// `UNSEEN`
    Unseen,
    /// Bare sequence set.
    SequenceSet(SequenceSet),
    /// `UID set`
    Uid(UidSet),
    /// `SUBJECT text`
    Subject(String),
    /// `FROM text`
    From(String),
    /// `TO text`
    To(String),
    /// `BODY text`
    Body(String),
    /// `TEXT text`
    Text(String),
    /// `SINCE date`, date as `1-Feb-1994`.
    Since(String),
    /// `BEFORE date`
    Before(String),
    /// `ON date`
    On(String),
    /// `LARGER n`
    Larger(u32),
    /// `SMALLER n`
    Smaller(u32),
    /// `HEADER field value`
    Header(String, String),
    /// Conjunction: criteria joined by spaces.
    And(Vec<Self>),
    /// `OR a b`
    Or(Box<Self>, Box<Self>),
    /// `NOT c`
    Not(Box<Self>),
}

impl SearchCriteria {
    /// `NOT c`
    #[must_use]
    pub fn not(criteria: Self) -> Self {
        Self::Not(Box::new(criteria))
    }

    /// `OR a b`
    #[must_use]
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }
}

/// Sort keys of the SORT extension (RFC 5256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// `ARRIVAL`
    Arrival,
    /// `CC`
    Cc,
    /// `DATE`
    Date,
    /// `FROM`
    From,
    /// `SIZE`
    Size,
    /// `SUBJECT`
    Subject,
    /// `TO`
    To,
}

impl SortKey {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Arrival => "ARRIVAL",
            Self::Cc => "CC",
            Self::Date => "DATE",
            Self::From => "FROM",
            Self::Size => "SIZE",
            Self::Subject => "SUBJECT",
            Self::To => "TO",
        }
    }
}

/// One sort key with its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortCriterion {
    /// Key to sort by.
    pub key: SortKey,
    /// Emit `REVERSE` before the key.
    pub reverse: bool,
}

impl SortCriterion {
    /// Ascending order.
    #[must_use]
    pub const fn asc(key: SortKey) -> Self {
        Self {
            key,
            reverse: false,
        }
    }

    /// Descending order.
    #[must_use]
    pub const fn desc(key: SortKey) -> Self {
        Self { key, reverse: true }
    }
}
