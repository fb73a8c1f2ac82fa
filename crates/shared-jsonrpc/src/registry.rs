//! Pending-call registry: the correlation table between issued calls and
//! their eventual resolutions.
//!
//! The table is mutated concurrently by caller threads (register) and the
//! delivery path (resolve), with timeout expiry racing both. Removal is
//! atomic: whichever of {matching response, timeout} removes the entry
//! first owns the completion handler, so every call resolves exactly once
//! and the loser of the race becomes a no-op. Handlers always fire after
//! the entry is gone and outside any registry lock, so a handler is free
//! to issue new calls.

use crate::error::RpcError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Raw outcome of a call, before per-call typed decoding.
pub type CallOutcome = Result<Value, RpcError>;

/// Exactly-once completion target of a pending call.
///
/// One tagged outcome travels through `on_outcome`; `on_done` fires exactly
/// once afterwards regardless of branch, so callers can release resources
/// deterministically.
pub struct CompletionHandler {
    on_outcome: Box<dyn FnOnce(CallOutcome) + Send>,
    on_done: Box<dyn FnOnce() + Send>,
}

impl CompletionHandler {
    pub fn new(
        on_outcome: impl FnOnce(CallOutcome) + Send + 'static,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            on_outcome: Box::new(on_outcome),
            on_done: Box::new(on_done),
        }
    }

    fn complete(self, outcome: CallOutcome) {
        (self.on_outcome)(outcome);
        (self.on_done)();
    }
}

/// In-flight call state stored in the correlation table.
pub struct PendingCall {
    method: String,
    result_type: &'static str,
    created_at: Instant,
    // Never contended: the handler is consumed exactly once, by whoever
    // removed the entry. The mutex only makes the one-shot closure pair
    // shareable across the table's threads.
    handler: Mutex<CompletionHandler>,
}

impl PendingCall {
    pub fn new(
        method: impl Into<String>,
        result_type: &'static str,
        handler: CompletionHandler,
    ) -> Self {
        Self {
            method: method.into(),
            result_type,
            created_at: Instant::now(),
            handler: Mutex::new(handler),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    fn complete(self, outcome: CallOutcome) {
        self.handler.into_inner().complete(outcome);
    }
}

/// Counters mutated by the registry; read-only outside.
#[derive(Debug, Default)]
pub struct PendingStats {
    pub total_registered: AtomicU64,
    pub total_completed: AtomicU64,
    pub total_timeouts: AtomicU64,
    pub total_cancelled: AtomicU64,
}

/// Monotonic id generator, unique for the lifetime of one client.
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Next unique correlation id, rendered as the wire's string form.
    pub fn next_id(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The id is already bound to a live call.
    #[error("duplicate correlation id: {0}")]
    DuplicateId(String),
}

/// Correlation table mapping call id to pending state.
pub struct PendingCallRegistry {
    pending: DashMap<String, PendingCall>,
    stats: PendingStats,
}

impl PendingCallRegistry {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            stats: PendingStats::default(),
        }
    }

    /// Insert a pending call under `id`. A duplicate id is a caller error;
    /// the live entry is left untouched.
    pub fn register(&self, id: &str, call: PendingCall) -> Result<(), RegistryError> {
        match self.pending.entry(id.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateId(id.to_string())),
            Entry::Vacant(slot) => {
                debug!(
                    id = %id,
                    method = %call.method,
                    result_type = call.result_type,
                    "registered pending call"
                );
                slot.insert(call);
                self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Resolve `id` with a response outcome, firing its completion handler.
    ///
    /// Returns false if the id is unknown or already resolved: a stale or
    /// foreign response is discarded here without effect on other calls.
    pub fn resolve(&self, id: &str, outcome: CallOutcome) -> bool {
        match self.take(id) {
            Some(call) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    id = %id,
                    method = %call.method,
                    elapsed_ms = call.created_at.elapsed().as_millis() as u64,
                    "resolved pending call"
                );
                call.complete(outcome);
                true
            }
            None => {
                debug!(id = %id, "response for unknown or already resolved id");
                false
            }
        }
    }

    /// Expire `id` after `timeout`, firing its handler with the timeout
    /// error. Returns false if a response already won the race.
    pub fn cancel_on_timeout(&self, id: &str, timeout: Duration) -> bool {
        match self.take(id) {
            Some(call) => {
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    id = %id,
                    method = %call.method,
                    timeout_ms = timeout.as_millis() as u64,
                    "pending call timed out"
                );
                call.complete(Err(RpcError::Timeout(timeout)));
                true
            }
            None => false,
        }
    }

    /// Remove `id` without firing its handler. Used to roll back a
    /// registration whose send failed, so the caller only sees the
    /// transport error.
    pub fn cancel(&self, id: &str) -> bool {
        if self.take(id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Atomic remove-if-present: the single arbiter of every resolution
    /// race.
    fn take(&self, id: &str) -> Option<PendingCall> {
        self.pending.remove(id).map(|(_, call)| call)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

impl Default for PendingCallRegistry {
    fn default() -> Self {
        Self::new()
    }
}
