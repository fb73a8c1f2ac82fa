//! Transport capability consumed by the engine.
//!
//! The engine needs exactly two things from its environment: a way to send
//! one serialized envelope, and an inbound delivery path that feeds decoded
//! messages to [`MessageDispatcher::deliver`]. Delivery may happen on any
//! thread, in any order relative to sends: the only guarantee the engine
//! relies on is that a response for id X is not delivered before the
//! request for id X was sent.
//!
//! [`MessageDispatcher::deliver`]: crate::dispatcher::MessageDispatcher::deliver

use thiserror::Error;

/// Errors a transport can surface when sending.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Outbound half of the transport capability.
///
/// Implementations must be callable concurrently from any caller thread.
pub trait MessageSender: Send + Sync {
    /// Send one serialized envelope to the peer.
    fn send_message(&self, message: &str) -> Result<(), TransportError>;
}

/// In-process transports for tests and single-process wiring.
pub mod loopback {
    use super::{MessageSender, TransportError};
    use parking_lot::Mutex;

    /// Sender that records every outbound message for inspection.
    #[derive(Default)]
    pub struct RecordingSender {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingSender {
        pub fn new() -> Self {
            Self::default()
        }

        /// Messages sent so far, oldest first.
        pub fn sent(&self) -> Vec<String> {
            self.messages.lock().clone()
        }

        pub fn last(&self) -> Option<String> {
            self.messages.lock().last().cloned()
        }
    }

    impl MessageSender for RecordingSender {
        fn send_message(&self, message: &str) -> Result<(), TransportError> {
            self.messages.lock().push(message.to_string());
            Ok(())
        }
    }

    /// Sender that always fails, for exercising transport-error paths.
    pub struct BrokenSender;

    impl MessageSender for BrokenSender {
        fn send_message(&self, _message: &str) -> Result<(), TransportError> {
            Err(TransportError::Closed)
        }
    }
}
