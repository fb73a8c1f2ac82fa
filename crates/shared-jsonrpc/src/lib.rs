//! # shared-jsonrpc: JSON-RPC 2.0 correlation engine
//!
//! Turns an asynchronous, possibly out-of-order, bidirectional message
//! channel into fire-and-forget notifications, callback-based asynchronous
//! calls, and blocking synchronous calls. Everything is multiplexed over a
//! single channel with per-call timeouts, and stays correct when many
//! caller threads issue calls while inbound messages arrive on an
//! independent delivery path.
//!
//! # Architecture
//!
//! ```text
//!  caller threads                         delivery path (any thread)
//!  ──────────────                         ──────────────────────────
//!  BlockingRpcClient ─┐                   MessageDispatcher::deliver
//!  RpcClient ─────────┤ register                   │
//!                     ▼                            ▼ resolve / route
//!        ┌──────────────────────────────────────────────┐
//!        │   PendingCallRegistry (correlation table)    │
//!        └──────────────────────────────────────────────┘
//!                     │ send                      ▲
//!                     ▼                           │ MethodTable
//!          MessageSender (transport)      inbound requests/notifications
//! ```
//!
//! Exactly one of {matching response arrival, timeout expiry} resolves a
//! pending call; the loser finds the registry entry gone and becomes a
//! no-op. Completion handlers run outside registry locks, so a handler may
//! itself issue new calls.
//!
//! # Usage
//!
//! ```ignore
//! let registry = Arc::new(PendingCallRegistry::new());
//! let client = Arc::new(RpcClient::new(
//!     transport.clone(),
//!     Arc::clone(&registry),
//!     Arc::new(TokioScheduler::current()),
//!     ClientConfig::default(),
//! ));
//! let dispatcher = Arc::new(MessageDispatcher::new(registry, methods, transport));
//! // wire the transport's inbound path to dispatcher.deliver(raw)
//!
//! let blocking = BlockingRpcClient::new(client);
//! let volume: f64 = blocking.send_request("getVolume", None::<&()>, None)?;
//! ```

pub mod blocking;
pub mod client;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod transport;

pub use blocking::BlockingRpcClient;
pub use client::{ClientConfig, RpcClient};
pub use dispatcher::{MessageDispatcher, MethodTable, RequestHandler};
pub use envelope::{
    classify, EnvelopeError, InboundMessage, RpcErrorObject, RpcRequest, RpcResponse, VERSION_2_0,
};
pub use error::{codes, RpcError};
pub use registry::{
    CallOutcome, CompletionHandler, PendingCall, PendingCallRegistry, PendingStats, RegistryError,
    RequestIdGenerator,
};
pub use scheduler::{ManualScheduler, TimerScheduler, TimerTask, TokioScheduler};
pub use transport::{MessageSender, TransportError};
