//! One bounded queue of connection slots per pool key.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, futures::Notified, watch};
use tokio::time::Instant;

use crate::connection::Connection;

enum SlotState<S> {
    Idle {
        conn: Connection<S>,
        last_used: Instant,
    },
    Occupied,
    Connecting,
}

struct Slot<S> {
    id: u64,
    state: SlotState<S>,
    close: watch::Sender<bool>,
}

struct QueueState<S> {
    slots: Vec<Slot<S>>,
    capacity: usize,
    closed: bool,
    next_id: u64,
}

/// Outcome of trying to take a slot.
pub(crate) enum Claim<S> {
    /// An idle connection, now marked occupied.
    Idle { id: u64, conn: Connection<S> },
    /// A fresh slot reserved for a connect attempt.
    Reserved {
        id: u64,
        signal: watch::Receiver<bool>,
    },
    /// Every slot is taken.
    Full,
    /// The queue was dropped; look the key up again.
    Closed,
}

/// Per-key counts for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Connections waiting to be borrowed.
    pub idle: usize,
    /// Connections currently lent out.
    pub occupied: usize,
    /// Slots reserved by connect attempts in progress.
    pub connecting: usize,
    /// Maximum number of slots.
    pub capacity: usize,
}

/// Slots for one key, guarded by a single lock; `notify` wakes tasks
/// waiting for capacity.
pub(crate) struct SlotQueue<S> {
    state: Mutex<QueueState<S>>,
    notify: Notify,
}

impl<S> SlotQueue<S> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                slots: Vec::new(),
                capacity,
                closed: false,
                next_id: 0,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    /// Takes the most recently used idle connection, or reserves a new slot
    /// if there is room.
    pub(crate) fn claim(&self) -> Claim<S> {
        let mut state = self.lock();
        if state.closed {
            return Claim::Closed;
        }

        let newest_idle = state
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot.state {
                SlotState::Idle { last_used, .. } => Some((i, last_used)),
                _ => None,
            })
            .max_by_key(|(_, last_used)| *last_used)
            .map(|(i, _)| i);

        if let Some(index) = newest_idle {
            let slot = &mut state.slots[index];
            if let SlotState::Idle { conn, .. } =
                std::mem::replace(&mut slot.state, SlotState::Occupied)
            {
                return Claim::Idle { id: slot.id, conn };
            }
        }

        if state.slots.len() < state.capacity {
            let id = state.next_id;
            state.next_id += 1;
            let (close, signal) = watch::channel(false);
            state.slots.push(Slot {
                id,
                state: SlotState::Connecting,
                close,
            });
            return Claim::Reserved { id, signal };
        }

        Claim::Full
    }

    /// A reserved slot now holds a live, lent-out connection.
    pub(crate) fn mark_occupied(&self, id: u64) {
        let mut state = self.lock();
        if let Some(slot) = state.slots.iter_mut().find(|s| s.id == id) {
            slot.state = SlotState::Occupied;
        }
    }

    /// A fresh close signal for a slot whose connection is being replaced.
    pub(crate) fn subscribe(&self, id: u64) -> Option<watch::Receiver<bool>> {
        let state = self.lock();
        state
            .slots
            .iter()
            .find(|s| s.id == id)
            .map(|slot| slot.close.subscribe())
    }

    /// Parks `conn` idle in its slot.
    ///
    /// Hands the connection back when it must be discarded instead: the slot
    /// is gone, the queue is closed or over capacity, or the session is
    /// broken.
    pub(crate) fn check_in(&self, id: u64, conn: Connection<S>) -> Result<(), Connection<S>> {
        let mut state = self.lock();
        let over_capacity = state.slots.len() > state.capacity;
        if state.closed || over_capacity || conn.is_broken() {
            return Err(conn);
        }
        let Some(slot) = state.slots.iter_mut().find(|s| s.id == id) else {
            return Err(conn);
        };
        slot.state = SlotState::Idle {
            conn,
            last_used: Instant::now(),
        };
        drop(state);
        self.notify.notify_one();
        Ok(())
    }

    /// Removes a slot, whatever its state, and wakes one waiter.
    pub(crate) fn free(&self, id: u64) {
        let removed = {
            let mut state = self.lock();
            state
                .slots
                .iter()
                .position(|s| s.id == id)
                .map(|index| state.slots.remove(index))
        };
        drop(removed);
        self.notify.notify_one();
    }

    /// Evicts idle connections unused for at least `threshold`.
    pub(crate) fn reap(&self, threshold: Duration) -> Vec<Connection<S>> {
        let mut evicted = Vec::new();
        {
            let mut state = self.lock();
            let now = Instant::now();
            let mut kept = Vec::with_capacity(state.slots.len());
            for slot in state.slots.drain(..) {
                match slot.state {
                    SlotState::Idle { conn, last_used }
                        if now.duration_since(last_used) >= threshold =>
                    {
                        evicted.push(conn);
                    }
                    _ => kept.push(slot),
                }
            }
            state.slots = kept;
        }
        if !evicted.is_empty() {
            self.notify.notify_waiters();
        }
        evicted
    }

    /// Closes the queue: flags every slot's connection closed and hands
    /// back the idle ones for a goodbye.
    ///
    /// The count covers idle and lent-out connections.
    pub(crate) fn close(&self) -> (usize, Vec<Connection<S>>) {
        let slots = {
            let mut state = self.lock();
            state.closed = true;
            std::mem::take(&mut state.slots)
        };
        let mut affected = 0;
        let mut idle = Vec::new();
        for slot in slots {
            slot.close.send_replace(true);
            match slot.state {
                SlotState::Idle { mut conn, .. } => {
                    conn.detach_close_signal();
                    idle.push(conn);
                    affected += 1;
                }
                SlotState::Occupied => affected += 1,
                SlotState::Connecting => {}
            }
        }
        self.notify.notify_waiters();
        (affected, idle)
    }

    pub(crate) fn set_capacity(&self, capacity: usize) {
        self.lock().capacity = capacity;
        self.notify.notify_waiters();
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let state = self.lock();
        let mut stats = QueueStats {
            capacity: state.capacity,
            ..QueueStats::default()
        };
        for slot in &state.slots {
            match slot.state {
                SlotState::Idle { .. } => stats.idle += 1,
                SlotState::Occupied => stats.occupied += 1,
                SlotState::Connecting => stats.connecting += 1,
            }
        }
        stats
    }
}

/// Frees its slot when dropped unless disarmed.
///
/// Covers every way a borrow can end early: a failed connect, a cancelled
/// `acquire`, or a [`PooledConnection`](super::PooledConnection) dropped
/// without release.
pub(crate) struct SlotGuard<S> {
    queue: Arc<SlotQueue<S>>,
    id: u64,
    armed: bool,
}

impl<S> SlotGuard<S> {
    pub(crate) const fn new(queue: Arc<SlotQueue<S>>, id: u64) -> Self {
        Self {
            queue,
            id,
            armed: true,
        }
    }

    pub(crate) fn queue(&self) -> &SlotQueue<S> {
        &self.queue
    }

    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S> Drop for SlotGuard<S> {
    fn drop(&mut self) {
        if self.armed {
            self.queue.free(self.id);
        }
    }
}
