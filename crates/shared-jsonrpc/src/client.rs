//! Asynchronous calling facade and client configuration.
//!
//! One reusable client object implements the engine; per-service method
//! sets are thin functions composed over it. There is no base-class
//! hierarchy to extend and no ambient global state: everything a client
//! needs is passed in at construction.

use crate::envelope::RpcRequest;
use crate::error::RpcError;
use crate::registry::{
    CallOutcome, CompletionHandler, PendingCall, PendingCallRegistry, RequestIdGenerator,
};
use crate::scheduler::TimerScheduler;
use crate::transport::MessageSender;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Client-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Applied when a call carries no timeout of its own. `None` means
    /// such calls wait indefinitely.
    pub default_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Configuration with a default per-call timeout in milliseconds, the
    /// unit timeouts travel in at the API boundary.
    pub fn with_default_timeout_ms(ms: u64) -> Self {
        Self {
            default_timeout: Some(Duration::from_millis(ms)),
        }
    }
}

/// Asynchronous calling facade: issue a call, return immediately, resolve
/// through a completion handler on the delivery path.
pub struct RpcClient {
    sender: Arc<dyn MessageSender>,
    registry: Arc<PendingCallRegistry>,
    scheduler: Arc<dyn TimerScheduler>,
    ids: RequestIdGenerator,
    config: ClientConfig,
}

impl RpcClient {
    pub fn new(
        sender: Arc<dyn MessageSender>,
        registry: Arc<PendingCallRegistry>,
        scheduler: Arc<dyn TimerScheduler>,
        config: ClientConfig,
    ) -> Self {
        Self {
            sender,
            registry,
            scheduler,
            ids: RequestIdGenerator::new(),
            config,
        }
    }

    /// The correlation table this client registers calls in. The
    /// dispatcher serving the same channel must resolve against it.
    pub fn registry(&self) -> &Arc<PendingCallRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue `method` and return immediately with the assigned call id.
    ///
    /// `on_result` receives the typed outcome exactly once: the success
    /// value decoded into `T`, or the typed error. `on_done` fires exactly
    /// once afterwards regardless of branch, so resources can be released
    /// deterministically. A send failure is returned directly and neither
    /// closure runs.
    pub fn send_request_async<T, P, F, G>(
        &self,
        method: &str,
        params: Option<&P>,
        timeout: Option<Duration>,
        on_result: F,
        on_done: G,
    ) -> Result<String, RpcError>
    where
        T: DeserializeOwned + 'static,
        P: Serialize,
        F: FnOnce(Result<T, RpcError>) + Send + 'static,
        G: FnOnce() + Send + 'static,
    {
        let timeout = self.effective_timeout(timeout);
        let handler = CompletionHandler::new(decode_outcome::<T, F>(on_result), on_done);
        self.dispatch::<T, P>(method, params, timeout, handler)
    }

    /// Fire-and-forget call: never registered and never awaited. Only a
    /// send failure can surface.
    pub fn send_notification<P>(&self, method: &str, params: Option<&P>) -> Result<(), RpcError>
    where
        P: Serialize,
    {
        let notification = RpcRequest::notification(method, encode_params(params)?);
        let message = encode_message(&notification)?;
        self.sender.send_message(&message)?;
        debug!(method = %method, "sent notification");
        Ok(())
    }

    /// Resolve the timeout a call should run under.
    pub(crate) fn effective_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        timeout.or(self.config.default_timeout)
    }

    /// Register, send, and arm the timeout timer when one applies.
    fn dispatch<T, P>(
        &self,
        method: &str,
        params: Option<&P>,
        timeout: Option<Duration>,
        handler: CompletionHandler,
    ) -> Result<String, RpcError>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let id = self.dispatch_untimed(method, params, std::any::type_name::<T>(), handler)?;

        if let Some(timeout) = timeout {
            let registry = Arc::clone(&self.registry);
            let timer_id = id.clone();
            self.scheduler.schedule(
                timeout,
                Box::new(move || {
                    // No-op if the response won the race.
                    registry.cancel_on_timeout(&timer_id, timeout);
                }),
            );
        }

        Ok(id)
    }

    /// Register the pending call, then send.
    ///
    /// Registration happens before the send so a response racing back on
    /// another thread always finds its entry; a failed send rolls the
    /// registration back silently and the caller sees only the transport
    /// error. No timer is armed here: the blocking facade owns its
    /// deadline itself.
    pub(crate) fn dispatch_untimed<P>(
        &self,
        method: &str,
        params: Option<&P>,
        result_type: &'static str,
        handler: CompletionHandler,
    ) -> Result<String, RpcError>
    where
        P: Serialize,
    {
        let params = encode_params(params)?;
        let id = self.ids.next_id();
        let request = RpcRequest::request(id.clone(), method, params);
        let message = encode_message(&request)?;

        let call = PendingCall::new(method, result_type, handler);
        self.registry
            .register(&id, call)
            .map_err(|e| RpcError::Internal(e.to_string()))?;

        if let Err(e) = self.sender.send_message(&message) {
            self.registry.cancel(&id);
            return Err(RpcError::Transport(e));
        }
        debug!(id = %id, method = %method, "sent request");
        Ok(id)
    }
}

/// Wrap a typed result callback into the registry's raw-outcome channel.
///
/// Decoding into `T` happens here, on the delivery path, with the type
/// recorded at send time: concurrent calls with different result types
/// decode independently even though they share one dispatcher.
fn decode_outcome<T, F>(on_result: F) -> impl FnOnce(CallOutcome) + Send + 'static
where
    T: DeserializeOwned + 'static,
    F: FnOnce(Result<T, RpcError>) + Send + 'static,
{
    move |outcome| {
        let typed = outcome.and_then(|value| {
            serde_json::from_value::<T>(value).map_err(|e| RpcError::InvalidResponse(e.to_string()))
        });
        on_result(typed);
    }
}

fn encode_params<P: Serialize>(params: Option<&P>) -> Result<Option<Value>, RpcError> {
    params
        .map(|p| serde_json::to_value(p).map_err(|e| RpcError::Internal(e.to_string())))
        .transpose()
}

fn encode_message(request: &RpcRequest) -> Result<String, RpcError> {
    serde_json::to_string(request).map_err(|e| RpcError::Internal(e.to_string()))
}
