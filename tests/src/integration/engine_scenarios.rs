//! Reference scenarios for the correlation engine.
//!
//! A fake peer plays back scripted behaviors over the real client,
//! registry and dispatcher: immediate replies, scripted errors, and
//! replies delayed on an independent timer thread: the delivery path is
//! never the calling thread unless the peer answers inline.

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::Value;
    use shared_jsonrpc::{
        BlockingRpcClient, ClientConfig, MessageDispatcher, MessageSender, MethodTable,
        PendingCallRegistry, RpcClient, RpcError, RpcErrorObject, RpcRequest, RpcResponse,
        TimerScheduler, TokioScheduler, TransportError,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, OnceLock};
    use std::time::{Duration, Instant};

    /// Scripted peer behaviors.
    enum PeerBehavior {
        /// Reply `result = 2 * params` before `send_message` returns.
        Double,
        /// Reply with the same error object every time.
        Error {
            code: i32,
            message: &'static str,
            data: &'static str,
        },
        /// Reply `result = 2 * params` after a fixed delay.
        DelayedDouble(Duration),
        /// Reply `result = params * multiplier` after `params * per_unit`.
        MultiplierDelayed {
            multiplier: i64,
            per_unit: Duration,
        },
    }

    struct PeerSender {
        behavior: PeerBehavior,
        scheduler: Arc<dyn TimerScheduler>,
        delivery: OnceLock<Arc<MessageDispatcher>>,
        sent: Mutex<Vec<String>>,
    }

    impl PeerSender {
        fn deliver(dispatcher: &MessageDispatcher, response: &RpcResponse) {
            dispatcher.deliver(&serde_json::to_string(response).unwrap());
        }
    }

    impl MessageSender for PeerSender {
        fn send_message(&self, message: &str) -> Result<(), TransportError> {
            self.sent.lock().push(message.to_string());

            let request: RpcRequest = serde_json::from_str(message)
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
            let Some(id) = request.id else {
                // Notifications get no reply.
                return Ok(());
            };
            let input = request
                .params
                .as_ref()
                .and_then(Value::as_i64)
                .unwrap_or_default();
            let dispatcher = Arc::clone(
                self.delivery
                    .get()
                    .expect("dispatcher bound before first call"),
            );

            match &self.behavior {
                PeerBehavior::Double => {
                    Self::deliver(
                        &dispatcher,
                        &RpcResponse::result(id, serde_json::json!(2 * input)),
                    );
                }
                PeerBehavior::Error {
                    code,
                    message,
                    data,
                } => {
                    Self::deliver(
                        &dispatcher,
                        &RpcResponse::error(
                            Some(id),
                            RpcErrorObject::with_data(*code, *message, serde_json::json!(data)),
                        ),
                    );
                }
                PeerBehavior::DelayedDouble(delay) => {
                    self.scheduler.schedule(
                        *delay,
                        Box::new(move || {
                            Self::deliver(
                                &dispatcher,
                                &RpcResponse::result(id, serde_json::json!(2 * input)),
                            );
                        }),
                    );
                }
                PeerBehavior::MultiplierDelayed {
                    multiplier,
                    per_unit,
                } => {
                    let result = input * multiplier;
                    self.scheduler.schedule(
                        *per_unit * input as u32,
                        Box::new(move || {
                            Self::deliver(
                                &dispatcher,
                                &RpcResponse::result(id, serde_json::json!(result)),
                            );
                        }),
                    );
                }
            }
            Ok(())
        }
    }

    struct Harness {
        // Drives the peer's delayed deliveries.
        _runtime: tokio::runtime::Runtime,
        sender: Arc<PeerSender>,
        registry: Arc<PendingCallRegistry>,
        blocking: BlockingRpcClient,
    }

    fn harness(behavior: PeerBehavior) -> Harness {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .unwrap();
        let scheduler: Arc<dyn TimerScheduler> =
            Arc::new(TokioScheduler::new(runtime.handle().clone()));

        let sender = Arc::new(PeerSender {
            behavior,
            scheduler: Arc::clone(&scheduler),
            delivery: OnceLock::new(),
            sent: Mutex::new(Vec::new()),
        });
        let registry = Arc::new(PendingCallRegistry::new());
        let client = Arc::new(RpcClient::new(
            sender.clone(),
            Arc::clone(&registry),
            scheduler,
            ClientConfig::default(),
        ));
        let dispatcher = Arc::new(MessageDispatcher::new(
            Arc::clone(&registry),
            MethodTable::new(),
            sender.clone(),
        ));
        sender
            .delivery
            .set(dispatcher)
            .unwrap_or_else(|_| unreachable!("dispatcher bound twice"));

        Harness {
            _runtime: runtime,
            sender,
            registry,
            blocking: BlockingRpcClient::new(client),
        }
    }

    fn sent_params(harness: &Harness, index: usize) -> Value {
        let message = harness.sender.sent.lock()[index].clone();
        let request: RpcRequest = serde_json::from_str(&message).unwrap();
        request.params.unwrap()
    }

    #[test]
    fn test_request_response() {
        let harness = harness(PeerBehavior::Double);

        let result: i64 = harness
            .blocking
            .send_request("someMethod", Some(&1), None)
            .unwrap();

        assert_eq!(result, 2);
        assert_eq!(sent_params(&harness, 0), serde_json::json!(1));
        assert_eq!(harness.registry.pending_count(), 0);
    }

    #[test]
    fn test_request_error() {
        let harness = harness(PeerBehavior::Error {
            code: -32000,
            message: "Some message",
            data: "Some data",
        });

        let error = harness
            .blocking
            .send_request::<i64, i64>("someMethod", Some(&1), None)
            .unwrap_err();

        assert_eq!(error.code(), Some(-32000));
        assert_eq!(error.to_string(), "-32000: Some message");
        assert_eq!(error.data(), Some(&serde_json::json!("Some data")));
        assert!(matches!(error, RpcError::Service { .. }));
    }

    #[test]
    fn test_request_with_delayed_response() {
        let harness = harness(PeerBehavior::DelayedDouble(Duration::from_millis(2000)));

        let started = Instant::now();
        let result: i64 = harness
            .blocking
            .send_request("someMethod", Some(&1), None)
            .unwrap();

        assert_eq!(result, 2);
        assert!(started.elapsed() >= Duration::from_millis(1900));
        assert_eq!(sent_params(&harness, 0), serde_json::json!(1));
    }

    #[test]
    fn test_request_with_delayed_response_timeout() {
        let harness = harness(PeerBehavior::DelayedDouble(Duration::from_millis(2000)));

        let error = harness
            .blocking
            .send_request::<i64, i64>("someMethod", Some(&1), Some(Duration::from_millis(500)))
            .unwrap_err();

        assert!(matches!(error, RpcError::Timeout(_)));
        // The request went out with the right params even though the reply
        // never made it back in time.
        assert_eq!(sent_params(&harness, 0), serde_json::json!(1));
        // The entry is gone, so the reply arriving at 2000ms is discarded.
        assert_eq!(harness.registry.pending_count(), 0);
    }

    #[test]
    fn test_request_with_delayed_response_no_timeout() {
        let harness = harness(PeerBehavior::DelayedDouble(Duration::from_millis(2000)));

        let result: i64 = harness
            .blocking
            .send_request("someMethod", Some(&1), Some(Duration::from_millis(3000)))
            .unwrap();

        assert_eq!(result, 2);
        assert_eq!(sent_params(&harness, 0), serde_json::json!(1));
    }

    #[test]
    fn test_request_with_multiple_delayed_responses() {
        let harness = harness(PeerBehavior::MultiplierDelayed {
            multiplier: 2,
            per_unit: Duration::from_millis(200),
        });

        let results: Arc<Mutex<HashMap<i64, i64>>> = Arc::new(Mutex::new(HashMap::new()));
        let mut workers = Vec::new();
        for input in (1..=10i64).rev() {
            let blocking = harness.blocking.clone();
            let results = Arc::clone(&results);
            workers.push(std::thread::spawn(move || {
                let result: i64 = blocking
                    .send_request("someMethod", Some(&input), None)
                    .unwrap();
                assert_eq!(result, input * 2);
                results.lock().insert(input, result);
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }

        let results = results.lock();
        for input in 1..=10i64 {
            assert_eq!(results.get(&input), Some(&(input * 2)));
        }
        assert_eq!(harness.registry.pending_count(), 0);
    }

    #[test]
    fn test_timeout_race_yields_exactly_one_outcome() {
        // Deadline and reply land together; the registry arbitrates and
        // exactly one outcome reaches the caller.
        let harness = harness(PeerBehavior::DelayedDouble(Duration::from_millis(500)));

        let outcome = harness.blocking.send_request::<i64, i64>(
            "someMethod",
            Some(&1),
            Some(Duration::from_millis(500)),
        );

        match outcome {
            Ok(result) => assert_eq!(result, 2),
            Err(error) => assert!(matches!(error, RpcError::Timeout(_))),
        }
        assert_eq!(harness.registry.pending_count(), 0);
    }
}
