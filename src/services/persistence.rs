//! Persistence service: debounced, per-block geometry saves.
//!
//! DESIGN
//! ======
//! Every drag or resize step schedules a save for its block. Each block has
//! its own quiescence timer: a new save for the same block cancels that
//! block's timer and merges into its pending update (later fields win), so a
//! burst produces exactly one write carrying the latest values. Saves for
//! different blocks never cancel each other.
//!
//! A `watch` channel reports whether any write is in flight; it is driven by
//! an in-flight counter so overlapping writes for different blocks keep the
//! indicator up until the last one finishes.
//!
//! ERROR HANDLING
//! ==============
//! Retryable failures are retried with linear back-off. When attempts run
//! out the block stays dirty (its pending update is kept) and a
//! [`SaveEvent::Failed`] is emitted; the next save for that block, or
//! [`SaveScheduler::flush`], writes it again. Local state is never rolled
//! back. Dirty entries are cleared only when the write that succeeded is
//! still the newest one scheduled for that block.
//!
//! A block being deleted is held: its timer is parked, and a write already
//! under way that then finds the block gone is dropped silently rather than
//! reported.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use canvas::block::{BlockId, PartialBlock};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::env_parse;
use crate::services::block::BlockService;
use crate::store::RecordError;

const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1000;
const DEFAULT_SAVE_RETRIES: usize = 2;
const DEFAULT_SAVE_RETRY_BASE_MS: u64 = 200;
const DEFAULT_SAVE_EVENT_CAPACITY: usize = 256;

// =============================================================================
// CONFIG
// =============================================================================

/// Tuning knobs for debounced saves, loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveConfig {
    /// Quiescence window per block, in milliseconds.
    pub debounce_ms: u64,
    /// Total write attempts per save before reporting failure.
    pub retries: usize,
    /// Base delay for linear retry back-off, in milliseconds.
    pub retry_base_ms: u64,
    /// Bounded capacity of the save event channel.
    pub event_capacity: usize,
}

impl SaveConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            debounce_ms: env_parse("SAVE_DEBOUNCE_MS", DEFAULT_SAVE_DEBOUNCE_MS),
            retries: env_parse("SAVE_RETRIES", DEFAULT_SAVE_RETRIES),
            retry_base_ms: env_parse("SAVE_RETRY_BASE_MS", DEFAULT_SAVE_RETRY_BASE_MS),
            event_capacity: DEFAULT_SAVE_EVENT_CAPACITY,
        }
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            retries: DEFAULT_SAVE_RETRIES,
            retry_base_ms: DEFAULT_SAVE_RETRY_BASE_MS,
            event_capacity: DEFAULT_SAVE_EVENT_CAPACITY,
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// Outcome of a debounced write, delivered on the scheduler's event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SaveEvent {
    Saved { block_id: BlockId },
    Failed { block_id: BlockId, code: &'static str, message: String },
}

/// Unsaved update for one block.
struct Pending {
    update: PartialBlock,
    generation: u64,
    /// Quiescence timer. `None` once the write has started or has failed.
    timer: Option<JoinHandle<()>>,
    /// Deletion in flight.
    held: bool,
    /// `hold` parked a running timer; `release` restarts it.
    rearm: bool,
}

struct Inner {
    blocks: BlockService,
    config: SaveConfig,
    pending: Mutex<HashMap<BlockId, Pending>>,
    next_generation: AtomicU64,
    in_flight: std::sync::Mutex<usize>,
    saving_tx: watch::Sender<bool>,
    events: mpsc::Sender<SaveEvent>,
}

/// Per-block debounced save scheduler. Cheap to clone.
#[derive(Clone)]
pub struct SaveScheduler {
    inner: Arc<Inner>,
}

/// Holds the saving indicator up for the life of one write.
struct InFlight<'a>(&'a Inner);

impl<'a> InFlight<'a> {
    fn enter(inner: &'a Inner) -> Self {
        inner.adjust_in_flight(true);
        Self(inner)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.adjust_in_flight(false);
    }
}

impl Inner {
    fn adjust_in_flight(&self, entering: bool) {
        let mut count = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *count = if entering { count.saturating_add(1) } else { count.saturating_sub(1) };
        self.saving_tx.send_replace(*count > 0);
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

impl SaveScheduler {
    /// Create a scheduler and the receiving end of its event channel.
    #[must_use]
    pub fn new(blocks: BlockService, config: SaveConfig) -> (Self, mpsc::Receiver<SaveEvent>) {
        let (events, rx) = mpsc::channel(config.event_capacity.max(1));
        let (saving_tx, _) = watch::channel(false);
        let inner = Inner {
            blocks,
            config,
            pending: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
            in_flight: std::sync::Mutex::new(0),
            saving_tx,
            events,
        };
        (Self { inner: Arc::new(inner) }, rx)
    }

    /// Schedule a write of `update` for `block_id` after the quiescence
    /// window. Replaces that block's pending timer only.
    pub async fn schedule_save(&self, block_id: BlockId, update: PartialBlock) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.inner.pending.lock().await;
        let entry = pending.entry(block_id).or_insert_with(|| Pending {
            update: PartialBlock::default(),
            generation,
            timer: None,
            held: false,
            rearm: false,
        });
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        entry.update = std::mem::take(&mut entry.update).merge(update);
        entry.generation = generation;
        entry.held = false;
        entry.rearm = false;
        self.arm(block_id, entry);
    }

    fn arm(&self, block_id: BlockId, entry: &mut Pending) {
        let scheduler = self.clone();
        let generation = entry.generation;
        let delay = Duration::from_millis(self.inner.config.debounce_ms);
        entry.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.fire(block_id, generation).await;
        }));
    }

    /// Park a block's pending save while its deletion is in flight.
    pub async fn hold(&self, block_id: BlockId) {
        if let Some(entry) = self.inner.pending.lock().await.get_mut(&block_id) {
            entry.held = true;
            if let Some(timer) = entry.timer.take() {
                timer.abort();
                entry.rearm = true;
            }
            debug!(%block_id, "pending save held");
        }
    }

    /// Undo [`SaveScheduler::hold`] after a failed delete, restarting the
    /// quiescence timer it parked.
    pub async fn release(&self, block_id: BlockId) {
        if let Some(entry) = self.inner.pending.lock().await.get_mut(&block_id) {
            entry.held = false;
            if std::mem::take(&mut entry.rearm) {
                self.arm(block_id, entry);
            }
        }
    }

    /// Drop any pending or dirty save for a block (the block was deleted).
    pub async fn cancel(&self, block_id: BlockId) {
        if let Some(entry) = self.inner.pending.lock().await.remove(&block_id) {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            debug!(%block_id, "pending save cancelled");
        }
    }

    /// Write every pending and dirty save now. Returns how many blocks are
    /// still dirty afterwards.
    pub async fn flush(&self) -> usize {
        let batch: Vec<(BlockId, PartialBlock, u64)> = {
            let mut pending = self.inner.pending.lock().await;
            pending
                .iter_mut()
                .map(|(id, entry)| {
                    if let Some(timer) = entry.timer.take() {
                        timer.abort();
                    }
                    (*id, entry.update.clone(), entry.generation)
                })
                .collect()
        };
        if !batch.is_empty() {
            info!(count = batch.len(), "flushing pending saves");
        }
        for (block_id, update, generation) in batch {
            self.write(block_id, update, generation).await;
        }
        self.dirty_count().await
    }

    /// Whether any write is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        *self.inner.saving_tx.borrow()
    }

    /// Subscribe to the saving indicator.
    #[must_use]
    pub fn subscribe_saving(&self) -> watch::Receiver<bool> {
        self.inner.saving_tx.subscribe()
    }

    /// Whether a block has a pending or failed save.
    pub async fn is_dirty(&self, block_id: BlockId) -> bool {
        self.inner.pending.lock().await.contains_key(&block_id)
    }

    pub async fn dirty_count(&self) -> usize {
        self.inner.pending.lock().await.len()
    }

    // =========================================================================
    // WRITE PATH
    // =========================================================================

    async fn fire(&self, block_id: BlockId, generation: u64) {
        let update = {
            let mut pending = self.inner.pending.lock().await;
            let Some(entry) = pending.get_mut(&block_id) else {
                return;
            };
            // EDGE: superseded or held while waiting for the lock.
            if entry.generation != generation || entry.held {
                return;
            }
            entry.timer = None;
            entry.update.clone()
        };
        self.write(block_id, update, generation).await;
    }

    async fn write(&self, block_id: BlockId, update: PartialBlock, generation: u64) {
        let _in_flight = InFlight::enter(&self.inner);
        match self.write_with_retry(block_id, update).await {
            Ok(()) => {
                self.clear_if_current(block_id, generation).await;
                self.emit(SaveEvent::Saved { block_id });
            }
            Err(e) => {
                if matches!(e, RecordError::NotFound { .. }) && self.is_retired(block_id).await {
                    debug!(%block_id, "save target was deleted; dropping failure");
                    return;
                }
                if !e.is_retryable() {
                    // Retrying cannot help; stop tracking the block.
                    self.clear_if_current(block_id, generation).await;
                }
                self.emit(SaveEvent::Failed { block_id, code: e.error_code(), message: e.to_string() });
            }
        }
    }

    async fn write_with_retry(&self, block_id: BlockId, update: PartialBlock) -> Result<(), RecordError> {
        let attempts = self.inner.config.retries.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.blocks.update(block_id, update.clone()).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(error = %e, %block_id, attempt, total = attempts, "block save failed; retrying");
                    let backoff = u64::try_from(attempt).unwrap_or(u64::MAX).saturating_mul(self.inner.config.retry_base_ms);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(error = %e, %block_id, attempts = attempt, "block save failed; keeping block dirty");
                    return Err(e);
                }
            }
        }
    }

    /// Held for deletion, or already cancelled.
    async fn is_retired(&self, block_id: BlockId) -> bool {
        self.inner.pending.lock().await.get(&block_id).is_none_or(|entry| entry.held)
    }

    async fn clear_if_current(&self, block_id: BlockId, generation: u64) {
        let mut pending = self.inner.pending.lock().await;
        // EDGE: keep the entry if a newer save arrived during the write.
        if pending.get(&block_id).is_some_and(|entry| entry.generation == generation) {
            pending.remove(&block_id);
        }
    }

    /// Best-effort, non-blocking event delivery.
    fn emit(&self, event: SaveEvent) {
        match self.inner.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "save event queue full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                debug!(?event, "save event receiver closed; dropping event");
            }
        }
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
