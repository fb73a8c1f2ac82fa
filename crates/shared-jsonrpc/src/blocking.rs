//! Blocking calling facade layered on the asynchronous one.
//!
//! Only this facade blocks, and only the calling thread: the outcome
//! travels through the same exactly-once completion channel as every
//! asynchronous call, into a slot the caller parks on. The wait is a
//! predicate loop on the slot, so spurious wakeups are harmless.
//!
//! Timeout race: when the deadline elapses the blocked thread calls
//! `cancel_on_timeout`. If the entry was still present, the handler fires
//! the timeout error into the slot; if the response already won, the slot
//! is (or is about to be) filled with the real outcome and the caller
//! keeps waiting for it. Either way exactly one outcome reaches the
//! caller.

use crate::client::RpcClient;
use crate::error::RpcError;
use crate::registry::CompletionHandler;
use parking_lot::{Condvar, Mutex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Slot a blocked caller parks on until its call resolves.
struct OutcomeSlot {
    outcome: Mutex<Option<Result<Value, RpcError>>>,
    resolved: Condvar,
}

/// Synchronous calling facade.
///
/// Cheap to clone; clones share the underlying client, so many threads can
/// issue blocking calls over one channel concurrently.
#[derive(Clone)]
pub struct BlockingRpcClient {
    inner: Arc<RpcClient>,
}

impl BlockingRpcClient {
    pub fn new(inner: Arc<RpcClient>) -> Self {
        Self { inner }
    }

    /// The shared asynchronous client underneath.
    pub fn client(&self) -> &Arc<RpcClient> {
        &self.inner
    }

    /// Issue `method` and block until resolution or deadline.
    ///
    /// With no `timeout` (and no client-wide default) the call blocks
    /// until a resolution arrives, with no internal limit.
    pub fn send_request<T, P>(
        &self,
        method: &str,
        params: Option<&P>,
        timeout: Option<Duration>,
    ) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let slot = Arc::new(OutcomeSlot {
            outcome: Mutex::new(None),
            resolved: Condvar::new(),
        });

        let fill = Arc::clone(&slot);
        let handler = CompletionHandler::new(
            move |outcome| {
                *fill.outcome.lock() = Some(outcome);
                fill.resolved.notify_one();
            },
            || {},
        );

        let timeout = self.inner.effective_timeout(timeout);
        let id = self
            .inner
            .dispatch_untimed(method, params, std::any::type_name::<T>(), handler)?;

        let raw = self.wait_for_outcome(&slot, &id, timeout)?;
        serde_json::from_value::<T>(raw).map_err(|e| RpcError::InvalidResponse(e.to_string()))
    }

    /// Park on the slot until the one outcome for `id` arrives.
    fn wait_for_outcome(
        &self,
        slot: &OutcomeSlot,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        let mut deadline = timeout.map(|t| (t, Instant::now() + t));
        let mut guard = slot.outcome.lock();
        loop {
            if let Some(outcome) = guard.take() {
                return outcome;
            }
            match deadline {
                Some((timeout, at)) => {
                    if slot.resolved.wait_until(&mut guard, at).timed_out() {
                        // Deadline elapsed: let the registry arbitrate the
                        // race. The handler locks the slot, so release it
                        // before cancelling.
                        drop(guard);
                        self.inner.registry().cancel_on_timeout(id, timeout);
                        // Whichever side won has filled, or is about to
                        // fill, the slot; wait for it unconditionally.
                        guard = slot.outcome.lock();
                        deadline = None;
                    }
                }
                None => slot.resolved.wait(&mut guard),
            }
        }
    }
}
