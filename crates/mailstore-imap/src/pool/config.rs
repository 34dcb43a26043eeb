//! Pool sizing and reaping settings.

use std::time::Duration;

/// Pool settings.
///
/// Defaults: 10 connections per key, 5 minute idle timeout, reaper every
/// 60 seconds, no liveness check on acquire, stale connections replaced,
/// discarded connections logged out within 5 seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum connections per (host, port, login).
    pub capacity: usize,
    /// Idle connections older than this are closed by the reaper.
    pub idle_timeout: Duration,
    /// Period of the background reaper.
    pub reap_interval: Duration,
    /// Send `NOOP` before lending out an idle connection.
    pub verify_on_acquire: bool,
    /// Replace a connection that fails verification instead of giving up
    /// on its slot.
    pub reconnect_stale: bool,
    /// Time allowed for `LOGOUT` on a discarded connection; `None` drops
    /// the stream without a goodbye.
    pub logout_grace: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            idle_timeout: Duration::from_secs(5 * 60),
            reap_interval: Duration::from_secs(60),
            verify_on_acquire: false,
            reconnect_stale: true,
            logout_grace: Some(Duration::from_secs(5)),
        }
    }
}

impl PoolConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// Builder for [`PoolConfig`].
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Sets the per-key capacity; zero is raised to one.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity.max(1);
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the reaper period.
    #[must_use]
    pub const fn reap_interval(mut self, interval: Duration) -> Self {
        self.config.reap_interval = interval;
        self
    }

    /// Enables or disables the `NOOP` check on acquire.
    #[must_use]
    pub const fn verify_on_acquire(mut self, verify: bool) -> Self {
        self.config.verify_on_acquire = verify;
        self
    }

    /// Enables or disables replacing stale connections.
    #[must_use]
    pub const fn reconnect_stale(mut self, reconnect: bool) -> Self {
        self.config.reconnect_stale = reconnect;
        self
    }

    /// Sets how long a discarded connection may take to log out.
    #[must_use]
    pub const fn logout_grace(mut self, grace: Option<Duration>) -> Self {
        self.config.logout_grace = grace;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.reap_interval, Duration::from_secs(60));
        assert!(!config.verify_on_acquire);
        assert!(config.reconnect_stale);
        assert_eq!(config.logout_grace, Some(Duration::from_secs(5)));
    }

    #[test]
    fn builder_overrides() {
        let config = PoolConfig::builder()
            .capacity(0)
            .idle_timeout(Duration::from_secs(30))
            .verify_on_acquire(true)
            .logout_grace(None)
            .build();
        assert_eq!(config.capacity, 1);
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert!(config.verify_on_acquire);
        assert_eq!(config.reap_interval, Duration::from_secs(60));
        assert_eq!(config.logout_grace, None);
    }
}
