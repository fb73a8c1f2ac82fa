//! Blocking HTTP transport for the cloud services.
//!
//! Each outbound envelope is POSTed to the service endpoint; the response
//! body, when present, is fed straight back into the dispatcher. The
//! dispatcher is bound after construction because it needs the sender to
//! exist first.

use parking_lot::RwLock;
use shared_jsonrpc::{MessageDispatcher, MessageSender, TransportError};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking HTTP message sender for a single cloud endpoint.
pub struct HttpMessageSender {
    client: reqwest::blocking::Client,
    endpoint: String,
    access_token: RwLock<Option<String>>,
    delivery: OnceLock<Arc<MessageDispatcher>>,
}

impl HttpMessageSender {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            access_token: RwLock::new(None),
            delivery: OnceLock::new(),
        })
    }

    /// Bearer token attached to subsequent requests. `None` clears it.
    pub fn set_access_token(&self, access_token: Option<String>) {
        *self.access_token.write() = access_token;
    }

    /// Bind the dispatcher that receives response bodies. Can only be
    /// bound once.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    pub fn bind_dispatcher(&self, dispatcher: Arc<MessageDispatcher>) {
        if self.delivery.set(dispatcher).is_err() {
            panic!("HttpMessageSender dispatcher already bound");
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl MessageSender for HttpMessageSender {
    fn send_message(&self, message: &str) -> Result<(), TransportError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(message.to_string());
        if let Some(token) = self.access_token.read().as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::SendFailed(format!(
                "endpoint returned {}",
                status
            )));
        }

        let body = response
            .text()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        if body.trim().is_empty() {
            // Notifications get empty replies; nothing to deliver.
            debug!(endpoint = %self.endpoint, "empty response body");
            return Ok(());
        }

        match self.delivery.get() {
            Some(dispatcher) => dispatcher.deliver(&body),
            None => warn!(
                endpoint = %self.endpoint,
                "response body arrived before a dispatcher was bound"
            ),
        }
        Ok(())
    }
}
