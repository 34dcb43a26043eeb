//! Runtime switches that can change while connections are live.

use std::sync::{Arc, PoisonError, RwLock};

/// Feature switches consulted by the higher-level helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Use `UID SORT` when the server advertises SORT.
    pub prefer_server_sort: bool,
    /// Use `UID EXPUNGE` when the server advertises UIDPLUS.
    pub native_uid_expunge: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            prefer_server_sort: true,
            native_uid_expunge: true,
        }
    }
}

/// Reloadable handle to the current [`ClientSettings`].
///
/// Readers get a cheap `Arc` snapshot; [`Settings::reload`] swaps the whole
/// value, so an operation in progress keeps seeing one consistent set.
#[derive(Debug, Default)]
pub struct Settings {
    current: RwLock<Arc<ClientSettings>>,
}

impl Settings {
    /// Creates a handle holding `settings`.
    #[must_use]
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<ClientSettings> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the settings for every later [`Settings::current`] call.
    pub fn reload(&self, settings: ClientSettings) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
        tracing::info!("client settings reloaded");
    }
}
