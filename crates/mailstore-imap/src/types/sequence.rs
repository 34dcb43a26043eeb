//! Sequence sets and UID sets.

use super::{SeqNum, Uid};

/// Set of message sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// One message.
    Single(SeqNum),
    /// Inclusive range.
    Range(SeqNum, SeqNum),
    /// From a message to the last one (`n:*`).
    RangeFrom(SeqNum),
    /// Every message (`1:*`).
    All,
    /// Comma-separated union.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// One message; `None` for zero.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// Inclusive range; `None` if either bound is zero.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => f.write_str("1:*"),
            Self::Set(items) => write_joined(f, items),
        }
    }
}

/// Set of UIDs, written after `UID` commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// One UID.
    Single(Uid),
    /// Inclusive range.
    Range(Uid, Uid),
    /// From a UID to the highest one (`n:*`).
    RangeFrom(Uid),
    /// Every UID (`1:*`).
    All,
    /// Comma-separated union.
    Set(Vec<Self>),
}

impl UidSet {
    /// One UID.
    #[must_use]
    pub fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// Inclusive range.
    #[must_use]
    pub fn range(start: Uid, end: Uid) -> Self {
        Self::Range(start, end)
    }

    /// Builds the most compact set covering exactly `uids`.
    ///
    /// Input order and duplicates do not matter. Returns `None` for an empty
    /// input, which has no wire form.
    #[must_use]
    pub fn from_uids(uids: impl IntoIterator<Item = Uid>) -> Option<Self> {
        let mut sorted: Vec<Uid> = uids.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut parts = Vec::new();
        let mut iter = sorted.into_iter();
        let first = iter.next()?;
        let (mut start, mut end) = (first, first);
        for uid in iter {
            if uid.get() == end.get() + 1 {
                end = uid;
            } else {
                parts.push(Self::span(start, end));
                start = uid;
                end = uid;
            }
        }
        parts.push(Self::span(start, end));

        Some(if parts.len() == 1 {
            parts.swap_remove(0)
        } else {
            Self::Set(parts)
        })
    }

    fn span(start: Uid, end: Uid) -> Self {
        if start == end {
            Self::Single(start)
        } else {
            Self::Range(start, end)
        }
    }

    /// Returns true if `uid` falls inside the set.
    ///
    /// `*` is treated as unbounded.
    #[must_use]
    pub fn contains(&self, uid: Uid) -> bool {
        match self {
            Self::Single(u) => *u == uid,
            Self::Range(a, b) => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                (*lo..=*hi).contains(&uid)
            }
            Self::RangeFrom(start) => uid >= *start,
            Self::All => true,
            Self::Set(items) => items.iter().any(|item| item.contains(uid)),
        }
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => f.write_str("1:*"),
            Self::Set(items) => write_joined(f, items),
        }
    }
}

fn write_joined<T: std::fmt::Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: &[T],
) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uids(values: &[u32]) -> Vec<Uid> {
        values.iter().filter_map(|v| Uid::new(*v)).collect()
    }

    #[test]
    fn sequence_set_display() {
        assert_eq!(SequenceSet::single(42).unwrap().to_string(), "42");
        assert_eq!(SequenceSet::range(1, 10).unwrap().to_string(), "1:10");
        assert_eq!(SequenceSet::All.to_string(), "1:*");
        let set = SequenceSet::Set(vec![
            SequenceSet::single(1).unwrap(),
            SequenceSet::RangeFrom(SeqNum::new(5).unwrap()),
        ]);
        assert_eq!(set.to_string(), "1,5:*");
    }

    #[test]
    fn zero_bounds_are_rejected() {
        assert!(SequenceSet::single(0).is_none());
        assert!(SequenceSet::range(0, 3).is_none());
    }

    #[test]
    fn from_uids_compacts_runs() {
        let set = UidSet::from_uids(uids(&[7, 5, 6, 9, 12, 11])).unwrap();
        assert_eq!(set.to_string(), "5:7,9,11:12");
    }

    #[test]
    fn from_uids_single_and_empty() {
        assert_eq!(UidSet::from_uids(uids(&[5, 5])).unwrap().to_string(), "5");
        assert!(UidSet::from_uids(Vec::new()).is_none());
    }

    #[test]
    fn contains_handles_reversed_ranges() {
        let set = UidSet::range(Uid::new(9).unwrap(), Uid::new(3).unwrap());
        assert!(set.contains(Uid::new(5).unwrap()));
        assert!(!set.contains(Uid::new(10).unwrap()));
        assert!(UidSet::RangeFrom(Uid::new(4).unwrap()).contains(Uid::new(4_000).unwrap()));
    }

    proptest! {
        #[test]
        fn from_uids_covers_exactly_its_input(values in proptest::collection::vec(1u32..200, 1..40)) {
            let input = uids(&values);
            let set = UidSet::from_uids(input.clone()).unwrap();
            for v in 1u32..210 {
                let uid = Uid::new(v).unwrap();
                prop_assert_eq!(set.contains(uid), input.contains(&uid));
            }
        }
    }
}
