//! Bounded per-endpoint connection pool.
//!
//! Connections are keyed by (host, port, login). Each key owns a
//! [`SlotQueue`](queue) with a fixed number of slots; a slot is idle (holding
//! a parked connection), occupied (lent out) or connecting. Borrowers that
//! find every slot taken wait on the queue's [`Notify`](tokio::sync::Notify)
//! until a release, a failed connect, a reap or a capacity change frees one.
//!
//! # Example
//!
//! ```no_run
//! use mailstore_imap::connection::{Credential, Endpoint, ImapConnector};
//! use mailstore_imap::pool::{Pool, PoolConfig};
//! use mailstore_imap::types::{Mailbox, StatusAttribute};
//!
//! # async fn example() -> mailstore_imap::Result<()> {
//! let pool = Pool::new(ImapConnector::default(), PoolConfig::default());
//! let endpoint = Endpoint::tls("imap.example.com");
//! let credential = Credential::password("user@example.com", "secret");
//!
//! let unseen = pool
//!     .with_connection(&endpoint, &credential, async |conn| {
//!         conn.status(&Mailbox::inbox(), &[StatusAttribute::Unseen]).await
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod queue;

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use queue::QueueStats;
use queue::{Claim, SlotGuard, SlotQueue};

use crate::connection::{AuthOptions, Connection, Connector, Credential, Endpoint};
use crate::{Error, Result};

/// Identifies one slot queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login name.
    pub login: String,
}

impl PoolKey {
    /// Key for `credential` on `endpoint`.
    #[must_use]
    pub fn new(endpoint: &Endpoint, credential: &Credential) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            login: credential.login().to_string(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.login, self.host, self.port)
    }
}

/// A connection lent out by the pool.
///
/// Dereferences to [`Connection`]. Hand it back with [`Pool::release`];
/// dropping it instead discards the connection and frees its slot.
pub struct PooledConnection<S> {
    conn: Connection<S>,
    guard: SlotGuard<S>,
    key: PoolKey,
}

impl<S> PooledConnection<S> {
    /// Key of the queue this connection belongs to.
    #[must_use]
    pub const fn key(&self) -> &PoolKey {
        &self.key
    }
}

impl<S> fmt::Debug for PooledConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("key", &self.key)
            .field("slot", &self.guard.id())
            .field("conn", &self.conn)
            .finish()
    }
}

impl<S> Deref for PooledConnection<S> {
    type Target = Connection<S>;

    fn deref(&self) -> &Connection<S> {
        &self.conn
    }
}

impl<S> DerefMut for PooledConnection<S> {
    fn deref_mut(&mut self) -> &mut Connection<S> {
        &mut self.conn
    }
}

/// Connection pool over a [`Connector`].
pub struct Pool<C: Connector> {
    connector: C,
    config: RwLock<PoolConfig>,
    queues: Mutex<HashMap<PoolKey, Arc<SlotQueue<C::Stream>>>>,
}

impl<C: Connector> fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.config())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Pool<C> {
    /// Creates an empty pool; queues appear on first use of a key.
    #[must_use]
    pub fn new(connector: C, config: PoolConfig) -> Self {
        Self {
            connector,
            config: RwLock::new(config),
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// The current configuration.
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The connector new connections come from.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Applies a new configuration to every queue, existing ones included.
    ///
    /// Shrinking the capacity never closes a lent-out connection; it is
    /// discarded on release instead of being parked.
    pub fn reload(&self, config: PoolConfig) {
        let capacity = config.capacity;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        for queue in self.snapshot() {
            queue.set_capacity(capacity);
        }
        tracing::info!(capacity, "pool configuration reloaded");
    }

    fn lock_queues(&self) -> MutexGuard<'_, HashMap<PoolKey, Arc<SlotQueue<C::Stream>>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<Arc<SlotQueue<C::Stream>>> {
        self.lock_queues().values().cloned().collect()
    }

    fn queue_for(&self, key: &PoolKey) -> Arc<SlotQueue<C::Stream>> {
        let capacity = self.config().capacity;
        let mut queues = self.lock_queues();
        Arc::clone(
            queues
                .entry(key.clone())
                .or_insert_with(|| Arc::new(SlotQueue::new(capacity))),
        )
    }

    /// Borrows a connection for `credential` on `endpoint`.
    ///
    /// Reuses an idle connection when there is one, opens a new one when
    /// the key has spare capacity, and otherwise waits for a slot to free up.
    ///
    /// # Errors
    ///
    /// [`Error::Connect`] if a new connection could not be established; the
    /// reserved slot is released before returning.
    pub async fn acquire(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<PooledConnection<C::Stream>> {
        let key = PoolKey::new(endpoint, credential);
        loop {
            let queue = self.queue_for(&key);
            let notified = queue.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match queue.claim() {
                Claim::Idle { id, conn } => {
                    let guard = SlotGuard::new(Arc::clone(&queue), id);
                    if let Some(conn) = self.revive(&guard, conn, endpoint, credential).await? {
                        tracing::debug!(%key, slot = id, "reusing idle connection");
                        return Ok(PooledConnection { conn, guard, key });
                    }
                }
                Claim::Reserved { id, signal } => {
                    let guard = SlotGuard::new(Arc::clone(&queue), id);
                    let mut conn = self.connect(endpoint, credential).await?;
                    conn.attach_close_signal(signal);
                    queue.mark_occupied(id);
                    tracing::debug!(%key, slot = id, "opened new connection");
                    return Ok(PooledConnection { conn, guard, key });
                }
                Claim::Full => {
                    tracing::debug!(%key, "all slots busy, waiting");
                    notified.await;
                }
                Claim::Closed => {}
            }
        }
    }

    /// Checks an idle connection before lending it out.
    ///
    /// `None` means the slot was given up and the caller should look again.
    async fn revive(
        &self,
        guard: &SlotGuard<C::Stream>,
        mut conn: Connection<C::Stream>,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<Option<Connection<C::Stream>>> {
        let config = self.config();
        let stale = conn.is_broken() || (config.verify_on_acquire && conn.noop().await.is_err());
        if !stale {
            return Ok(Some(conn));
        }

        self.retire(vec![conn]);
        if !config.reconnect_stale {
            tracing::info!(%endpoint, "discarding stale idle connection");
            return Ok(None);
        }
        let Some(signal) = guard.queue().subscribe(guard.id()) else {
            return Ok(None);
        };
        tracing::info!(%endpoint, "replacing stale idle connection");
        let mut fresh = self.connect(endpoint, credential).await?;
        fresh.attach_close_signal(signal);
        Ok(Some(fresh))
    }

    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<Connection<C::Stream>> {
        let first = self
            .connector
            .connect(endpoint, credential, AuthOptions::default())
            .await;

        let result = match first {
            Err(err) if err.is_auth() && matches!(credential, Credential::Password { .. }) => {
                tracing::info!(
                    %endpoint,
                    login = credential.login(),
                    %err,
                    "authentication failed, retrying without AUTHENTICATE PLAIN"
                );
                let options = AuthOptions {
                    disable_plain: true,
                };
                self.connector.connect(endpoint, credential, options).await
            }
            other => other,
        };

        result.map_err(|source| {
            tracing::warn!(%endpoint, login = credential.login(), err = %source, "connect failed");
            Error::Connect {
                endpoint: endpoint.to_string(),
                source: Box::new(source),
            }
        })
    }

    /// Returns a borrowed connection.
    ///
    /// The connection is parked idle in its slot, or closed and discarded if
    /// it is broken, its queue was dropped, or the capacity shrank below the
    /// number of slots in use.
    pub fn release(&self, pooled: PooledConnection<C::Stream>) {
        let PooledConnection { conn, guard, key } = pooled;
        match guard.queue().check_in(guard.id(), conn) {
            Ok(()) => {
                tracing::debug!(%key, slot = guard.id(), "connection returned");
                guard.disarm();
            }
            Err(conn) => {
                tracing::debug!(%key, slot = guard.id(), broken = conn.is_broken(), "connection discarded");
                self.retire(vec![conn]);
            }
        }
    }

    /// Borrows a connection, runs `f` on it, and returns it.
    ///
    /// # Errors
    ///
    /// Whatever `acquire` or `f` returns.
    pub async fn with_connection<T>(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        f: impl AsyncFnOnce(&mut Connection<C::Stream>) -> Result<T>,
    ) -> Result<T> {
        let mut pooled = self.acquire(endpoint, credential).await?;
        let result = f(&mut *pooled).await;
        self.release(pooled);
        result
    }

    /// Closes idle connections unused for longer than the idle timeout.
    pub fn reap_idle(&self) -> usize {
        self.reap_idle_older_than(self.config().idle_timeout)
    }

    /// Closes idle connections unused for at least `threshold`; lent-out
    /// connections are never touched. Returns how many were closed.
    pub fn reap_idle_older_than(&self, threshold: Duration) -> usize {
        let evicted: Vec<_> = self
            .snapshot()
            .iter()
            .flat_map(|queue| queue.reap(threshold))
            .collect();
        let count = evicted.len();
        if count > 0 {
            tracing::info!(evicted = count, "reaped idle connections");
        }
        self.retire(evicted);
        count
    }

    /// Force-closes every connection of `owner` and forgets its keys.
    ///
    /// Lent-out connections are flagged closed: their next command, or the
    /// one in flight, fails with [`Error::ConnectionBroken`].
    pub fn drop_all(&self, owner: &str) -> usize {
        let removed: Vec<_> = {
            let mut queues = self.lock_queues();
            let keys: Vec<PoolKey> = queues.keys().filter(|k| k.login == owner).cloned().collect();
            keys.into_iter()
                .filter_map(|key| queues.remove(&key))
                .collect()
        };

        let mut closed = 0;
        let mut idle = Vec::new();
        for queue in &removed {
            let (affected, parked) = queue.close();
            closed += affected;
            idle.extend(parked);
        }
        tracing::info!(owner, closed, "dropped all connections");
        self.retire(idle);
        closed
    }

    /// Logs out discarded connections on a background task.
    ///
    /// Outside a Tokio runtime, or with no logout grace configured, the
    /// connections are simply dropped.
    fn retire(&self, conns: Vec<Connection<C::Stream>>) {
        if conns.is_empty() {
            return;
        }
        let Some(grace) = self.config().logout_grace else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(count = conns.len(), "no runtime, dropping connections");
            return;
        };
        runtime.spawn(async move {
            for conn in conns {
                conn.close(grace).await;
            }
        });
    }

    /// Per-key slot counts.
    #[must_use]
    pub fn stats(&self) -> HashMap<PoolKey, QueueStats> {
        self.lock_queues()
            .iter()
            .map(|(key, queue)| (key.clone(), queue.stats()))
            .collect()
    }
}

impl<C: Connector> Pool<C> {
    /// Runs [`Pool::reap_idle`] every `reap_interval` until the pool is
    /// dropped.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let pool = Arc::downgrade(self);
        let period = self.config().reap_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(pool) = pool.upgrade() else {
                    tracing::debug!("pool dropped, reaper exiting");
                    break;
                };
                pool.reap_idle();
            }
        })
    }
}
