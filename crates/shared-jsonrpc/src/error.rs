//! Typed error taxonomy with JSON-RPC 2.0 error codes.
//!
//! Peer-originated kinds compose their display as `"<code>: <message>"`;
//! existing peers log and match on that exact format, so it is kept
//! verbatim.

use crate::envelope::RpcErrorObject;
use crate::transport::TransportError;
use serde_json::Value;
use std::time::Duration;

/// Standard JSON-RPC 2.0 error codes plus the application block.
pub mod codes {
    // JSON-RPC 2.0 reserved errors (-32700 to -32600)
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Application errors (-32000 and below, service-defined)
    pub const SERVICE_ERROR: i32 = -32000;
    pub const UNAUTHORIZED: i32 = -32010;

    /// Whether `code` falls in the reserved protocol block.
    pub fn is_protocol_code(code: i32) -> bool {
        (-32700..=-32600).contains(&code)
    }
}

/// Failure surfaced to the issuer of a call.
///
/// None of these kinds are fatal to the engine: one bad response, one
/// unknown id or one timed out call never blocks resolution of other
/// in-flight calls.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The outbound send failed; no pending call was left behind.
    #[error("transport send failed: {0}")]
    Transport(#[from] TransportError),

    /// No resolution arrived within the deadline. Purely local: the peer
    /// never reports this code.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The peer rejected the call inside the reserved protocol block
    /// (parse error, unknown method, invalid params).
    #[error("{code}: {message}")]
    Rejected {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    /// The peer reported the distinguished unauthorized code, so calling
    /// layers can branch on it without string comparison.
    #[error("{code}: {message}")]
    Unauthorized {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    /// Any other application failure; code, message and data are preserved
    /// verbatim from the wire.
    #[error("{code}: {message}")]
    Service {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    /// A matched response whose result did not decode into the type
    /// recorded at send time.
    #[error("invalid response payload: {0}")]
    InvalidResponse(String),

    /// Local engine failure: unencodable params or a duplicate id.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// Map a wire error object onto the typed taxonomy.
    pub fn from_error_object(error: RpcErrorObject) -> Self {
        let RpcErrorObject {
            code,
            message,
            data,
        } = error;
        if codes::is_protocol_code(code) {
            RpcError::Rejected {
                code,
                message,
                data,
            }
        } else if code == codes::UNAUTHORIZED {
            RpcError::Unauthorized {
                code,
                message,
                data,
            }
        } else {
            RpcError::Service {
                code,
                message,
                data,
            }
        }
    }

    /// Wire error code, if this kind carries one.
    pub fn code(&self) -> Option<i32> {
        match self {
            RpcError::Rejected { code, .. }
            | RpcError::Unauthorized { code, .. }
            | RpcError::Service { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Opaque error data, if the peer attached any.
    pub fn data(&self) -> Option<&Value> {
        match self {
            RpcError::Rejected { data, .. }
            | RpcError::Unauthorized { data, .. }
            | RpcError::Service { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}
