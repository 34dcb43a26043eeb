//! Command tags.
//!
//! A connection sends one command at a time, so tags only need to be unique
//! per connection.

use crate::types::Tag;

/// Produces `A0001`, `A0002`, ... for one connection.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a generator with the given prefix letter.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Returns the next tag.
    ///
    /// The counter wraps after `u32::MAX` tags; by then every earlier
    /// command has long completed.
    pub fn next_tag(&mut self) -> Tag {
        self.counter = self.counter.wrapping_add(1);
        Tag::new(format!("{}{:04}", self.prefix, self.counter))
    }

    /// Number of tags issued so far.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.counter
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_padded_tags() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next_tag().as_str(), "A0001");
        assert_eq!(tags.next_tag().as_str(), "A0002");
        assert_eq!(tags.issued(), 2);
    }

    #[test]
    fn custom_prefix() {
        let mut tags = TagGenerator::new('T');
        assert_eq!(tags.next_tag().as_str(), "T0001");
    }

    #[test]
    fn tags_are_unique() {
        let mut tags = TagGenerator::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(tags.next_tag()));
        }
    }
}
