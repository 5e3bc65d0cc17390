//! Process-wide registry of in-flight input transfers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, warn};

use offload_core::{CancellationToken, ClientError, ClientResult};

use crate::client::CacheTransfer;

/// Bound on a single poll wait. This caps staleness when a notification is
/// missed; it is not a deadline, and the poll loop continues until the
/// transfer resolves or the caller cancels.
const DEFAULT_WAIT_BOUND: Duration = Duration::from_secs(30);

/// Role handed to a caller registering interest in a transfer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRole {
    /// First registrant for the key; responsible for checking the remote
    /// cache and queuing the transfer when one is needed.
    Owner,
    /// Later registrant; polls for availability alongside the owner.
    Follower,
}

/// Per-key synchronization state shared by one owner and N followers.
///
/// The `failed` flag is sticky: once set it never resets, and a retried
/// transfer must go through a fresh slot issued by the coordinator.
#[derive(Debug, Default)]
pub struct TransferSlot {
    failed: AtomicBool,
    notify: Notify,
}

impl TransferSlot {
    /// Mark the in-flight transfer as failed and wake every waiter.
    pub fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Whether the in-flight transfer has failed.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn notify_ready(&self) {
        self.notify.notify_waiters();
    }

    async fn changed(&self) {
        self.notify.notified().await;
    }
}

/// Registry arbitrating at most one in-flight transfer per source path.
///
/// The registry mutex only guards lookup and insert; waiters observe
/// progress through the per-slot notification primitive without taking the
/// registry lock on every poll.
pub struct TransferCoordinator {
    slots: Arc<Mutex<HashMap<PathBuf, Arc<TransferSlot>>>>,
    wait_bound: Duration,
}

impl Default for TransferCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferCoordinator {
    /// Coordinator with the default 30 second poll wait bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_wait_bound(DEFAULT_WAIT_BOUND)
    }

    /// Coordinator with an explicit poll wait bound.
    #[must_use]
    pub fn with_wait_bound(wait_bound: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            wait_bound,
        }
    }

    fn key(path: &Path) -> PathBuf {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Register interest in `path`.
    ///
    /// The registry insert atomically designates the first registrant as the
    /// [`TransferRole::Owner`]; everyone racing in behind it becomes a
    /// follower sharing the owner's slot. This keeps the
    /// check-cache-then-queue sequence single-threaded per key, so only one
    /// transfer is ever initiated while a prior one is unresolved.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex has been poisoned.
    pub fn acquire(&self, path: &Path) -> (Arc<TransferSlot>, TransferRole) {
        let key = Self::key(path);
        let mut slots = self.slots.lock().expect("transfer registry mutex poisoned");
        match slots.entry(key) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), TransferRole::Follower),
            Entry::Vacant(entry) => {
                let slot = Arc::new(TransferSlot::default());
                entry.insert(Arc::clone(&slot));
                (slot, TransferRole::Owner)
            }
        }
    }

    /// Drop the slot for `path` so a retried transfer gets a fresh one.
    ///
    /// Callers still holding the old slot keep observing its final state;
    /// only new registrants see the fresh slot.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex has been poisoned.
    pub fn release(&self, path: &Path) {
        let key = Self::key(path);
        self.slots
            .lock()
            .expect("transfer registry mutex poisoned")
            .remove(&key);
    }

    /// Queue the actual content transfer, decoupled from the requesting
    /// call's return path.
    ///
    /// The spawned task owns the slot's lifecycle: it retires the registry
    /// entry once the transfer resolves either way, then publishes the
    /// outcome on the slot. Waiters holding the slot observe the final
    /// state; a later registration for the same path gets a fresh slot even
    /// when every waiter was cancelled.
    pub fn queue_transfer<T: CacheTransfer + 'static>(&self, transfer: T, path: &Path) {
        let (slot, _) = self.acquire(path);
        let path = Self::key(path);
        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            let outcome = transfer.cache_insert(&path).await;
            slots
                .lock()
                .expect("transfer registry mutex poisoned")
                .remove(&path);
            match outcome {
                Ok(()) => {
                    debug!(path = %path.display(), "input transfer reached the remote cache");
                    slot.notify_ready();
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "input transfer failed");
                    slot.mark_failed();
                }
            }
        });
    }

    /// Poll the remote cache until `path` is available, waking early on slot
    /// notifications.
    ///
    /// A notification can slip between the availability check and the wait
    /// registration; the bounded wait guarantees the next poll happens
    /// regardless.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TransferFailed`] once the slot is marked
    /// failed, [`ClientError::Cancelled`] when `cancel` fires, and any
    /// availability-poll failure as-is.
    pub async fn await_ready<T: CacheTransfer + ?Sized>(
        &self,
        transfer: &T,
        path: &Path,
        slot: &TransferSlot,
        cancel: &CancellationToken,
    ) -> ClientResult<String> {
        loop {
            if slot.has_failed() {
                return Err(ClientError::TransferFailed {
                    path: Self::key(path),
                });
            }
            let availability = transfer.file_available(path).await?;
            if availability.ready {
                return availability.token.ok_or_else(|| {
                    warn!(path = %path.display(), "remote cache reported ready without a token");
                    ClientError::TransferFailed {
                        path: Self::key(path),
                    }
                });
            }
            tokio::select! {
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                () = slot.changed() => {}
                () = sleep(self.wait_bound) => {}
            }
        }
    }
}
