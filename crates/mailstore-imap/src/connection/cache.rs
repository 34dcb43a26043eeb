//! Per-connection folder metadata learned from LIST and SELECT.

use std::collections::HashMap;

use crate::types::{ListResponse, MailboxAttribute};

/// What the connection last saw for one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderInfo {
    /// Name attributes from the latest LIST.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Message count from the latest SELECT or EXAMINE.
    pub exists: Option<u32>,
}

/// Folder metadata keyed by decoded mailbox name.
///
/// Entries go stale when the folder is created, deleted or renamed, so the
/// mailbox helpers drop them on those commands.
#[derive(Debug, Clone, Default)]
pub struct FolderCache {
    entries: HashMap<String, FolderInfo>,
}

impl FolderCache {
    /// Returns the cached entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FolderInfo> {
        self.entries.get(name)
    }

    /// Number of cached folders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn record_list(&mut self, entry: &ListResponse) {
        let info = self
            .entries
            .entry(entry.mailbox.as_str().to_string())
            .or_default();
        info.attributes.clone_from(&entry.attributes);
        info.delimiter = entry.delimiter;
    }

    pub(crate) fn record_exists(&mut self, name: &str, exists: u32) {
        self.entries.entry(name.to_string()).or_default().exists = Some(exists);
    }

    /// Forgets everything about `name`.
    pub fn invalidate_folder(&mut self, name: &str) {
        if self.entries.remove(name).is_some() {
            tracing::trace!(folder = name, "folder cache entry dropped");
        }
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mailbox;

    #[test]
    fn list_then_invalidate() {
        let mut cache = FolderCache::default();
        cache.record_list(&ListResponse {
            attributes: vec![MailboxAttribute::HasNoChildren],
            delimiter: Some('/'),
            mailbox: Mailbox::new("Archive"),
        });
        cache.record_exists("Archive", 17);

        let info = cache.get("Archive");
        assert_eq!(info.map(|i| i.exists), Some(Some(17)));
        assert_eq!(info.and_then(|i| i.delimiter), Some('/'));

        cache.invalidate_folder("Archive");
        assert!(cache.get("Archive").is_none());
        assert!(cache.is_empty());
    }
}
