//! JSON-RPC 2.0 message envelopes and inbound classification.
//!
//! The wire contract is the JSON-RPC 2.0 shape with string ids. A
//! notification is written as a request without an id; that is how every
//! peer in the ecosystem encodes fire-and-forget calls, so one request
//! struct covers both forms and [`classify`] splits them on arrival.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version carried in every envelope.
pub const VERSION_2_0: &str = "2.0";

/// An outbound call, or a call arriving from the peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    /// Present for calls expecting a response, absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    /// Create a call expecting a response under `id`.
    pub fn request(id: String, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: VERSION_2_0.to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Create a fire-and-forget notification: no id, never awaited.
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: VERSION_2_0.to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }
}

/// A reply to a request. Exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    /// Echoes the request id. `None` only in error replies to requests
    /// whose id could not be recovered.
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Create a success reply for `id`.
    pub fn result(id: String, result: Value) -> Self {
        Self {
            jsonrpc: VERSION_2_0.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error reply for `id`.
    pub fn error(id: Option<String>, error: RpcErrorObject) -> Self {
        Self {
            jsonrpc: VERSION_2_0.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Structured failure carried in an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Standard "method not found" failure.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            crate::error::codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    /// Standard "invalid params" failure.
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(
            crate::error::codes::INVALID_PARAMS,
            format!("Invalid params: {}", details.into()),
        )
    }

    /// Standard "internal error" failure.
    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            crate::error::codes::INTERNAL_ERROR,
            format!("Internal error: {}", details.into()),
        )
    }
}

/// Classification of a decoded inbound envelope.
#[derive(Debug)]
pub enum InboundMessage {
    /// A reply to one of our outstanding calls.
    Response(RpcResponse),
    /// The peer calling us; a reply with the same id is expected.
    Request(RpcRequest),
    /// The peer calling us without expecting a reply.
    Notification(RpcRequest),
}

/// Error produced when an inbound payload matches no envelope shape.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("unparseable message: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed envelope: {0}")]
    Malformed(&'static str),
}

/// Classify a raw inbound payload into one of the three envelope shapes.
///
/// A response must carry an id and exactly one of `result`/`error`; a
/// request carries an id and a method; a notification carries a method and
/// no id. Anything else is malformed and left to the caller to discard.
pub fn classify(raw: &str) -> Result<InboundMessage, EnvelopeError> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value
        .as_object()
        .ok_or(EnvelopeError::Malformed("not a JSON object"))?;

    let has_id = object.get("id").is_some_and(|id| !id.is_null());
    let has_result = object.contains_key("result");
    let has_error = object.contains_key("error");
    let has_method = object.contains_key("method");

    if has_result || has_error {
        if has_result && has_error {
            return Err(EnvelopeError::Malformed(
                "response carries both result and error",
            ));
        }
        if !has_id {
            return Err(EnvelopeError::Malformed("response without an id"));
        }
        let response: RpcResponse = serde_json::from_value(value)?;
        return Ok(InboundMessage::Response(response));
    }

    if has_method {
        let request: RpcRequest = serde_json::from_value(value)?;
        if has_id {
            return Ok(InboundMessage::Request(request));
        }
        return Ok(InboundMessage::Notification(request));
    }

    Err(EnvelopeError::Malformed("neither a response nor a call"))
}
