//! Inbound message demultiplexing and the server-side method table.
//!
//! One entry point, [`MessageDispatcher::deliver`], fed by the transport's
//! delivery path. Responses resolve pending calls; inbound requests are
//! served from the method table; notifications are routed or dropped.
//! Nothing here ever propagates an error back to the delivery path: a
//! malformed payload or a stale id is a diagnostic, not a failure.

use crate::envelope::{classify, InboundMessage, RpcErrorObject, RpcRequest, RpcResponse};
use crate::error::RpcError;
use crate::registry::PendingCallRegistry;
use crate::transport::MessageSender;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Server-side handler for one inbound method.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, params: Option<Value>) -> Result<Value, RpcErrorObject>;
}

impl<F> RequestHandler for F
where
    F: Fn(Option<Value>) -> Result<Value, RpcErrorObject> + Send + Sync,
{
    fn handle(&self, params: Option<Value>) -> Result<Value, RpcErrorObject> {
        self(params)
    }
}

/// Named method handlers served to the peer. Built before serving starts;
/// lookup is read-only afterwards.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, Box<dyn RequestHandler>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `method`, replacing any previous handler.
    pub fn register(&mut self, method: impl Into<String>, handler: impl RequestHandler + 'static) {
        self.methods.insert(method.into(), Box::new(handler));
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Invoke the handler for `method`, if one is registered. This is the
    /// same path the dispatcher takes for inbound requests.
    pub fn invoke(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Option<Result<Value, RpcErrorObject>> {
        self.methods
            .get(method)
            .map(|handler| handler.handle(params))
    }
}

/// Demultiplexes inbound messages against the correlation table and the
/// method table.
pub struct MessageDispatcher {
    registry: Arc<PendingCallRegistry>,
    methods: MethodTable,
    sender: Arc<dyn MessageSender>,
}

impl MessageDispatcher {
    pub fn new(
        registry: Arc<PendingCallRegistry>,
        methods: MethodTable,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            registry,
            methods,
            sender,
        }
    }

    /// Single entry point for the transport's inbound delivery. Safe to
    /// call from any thread, in any order.
    pub fn deliver(&self, raw: &str) {
        match classify(raw) {
            Ok(InboundMessage::Response(response)) => self.handle_response(response),
            Ok(InboundMessage::Request(request)) => self.handle_request(request),
            Ok(InboundMessage::Notification(notification)) => {
                self.handle_notification(notification)
            }
            Err(e) => warn!(error = %e, "discarding malformed inbound message"),
        }
    }

    fn handle_response(&self, response: RpcResponse) {
        // Classification guarantees the id; an idless response never gets
        // this far.
        let Some(id) = response.id else {
            return;
        };
        let outcome = match response.error {
            Some(error) => Err(RpcError::from_error_object(error)),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        // A false return is a stale or foreign id; the registry has
        // already logged it.
        self.registry.resolve(&id, outcome);
    }

    fn handle_request(&self, request: RpcRequest) {
        let RpcRequest {
            id, method, params, ..
        } = request;
        let Some(id) = id else {
            return;
        };
        let response = match self.methods.invoke(&method, params) {
            Some(Ok(result)) => RpcResponse::result(id, result),
            Some(Err(error)) => RpcResponse::error(Some(id), error),
            None => {
                debug!(method = %method, "inbound request for unknown method");
                RpcResponse::error(Some(id), RpcErrorObject::method_not_found(&method))
            }
        };
        self.send_response(&response);
    }

    fn handle_notification(&self, notification: RpcRequest) {
        match self.methods.invoke(&notification.method, notification.params) {
            // Notifications never get replies, including error replies.
            Some(Err(error)) => {
                debug!(
                    method = %notification.method,
                    code = error.code,
                    "notification handler reported an error"
                );
            }
            Some(Ok(_)) => {}
            None => {
                debug!(method = %notification.method, "dropping notification for unknown method")
            }
        }
    }

    fn send_response(&self, response: &RpcResponse) {
        match serde_json::to_string(response) {
            Ok(message) => {
                if let Err(e) = self.sender.send_message(&message) {
                    warn!(error = %e, "failed to send response");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize response"),
        }
    }
}
