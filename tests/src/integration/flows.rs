//! Cross-crate flows: a controller driving a player device, and the cloud
//! service clients, all over the shared engine.
//!
//! Both ends of each conversation are real: the controller runs a client
//! plus a dispatcher that captures inbound notifications, the player runs
//! its command service behind a dispatcher, and the "wire" is a pair of
//! in-process senders delivering into the opposite dispatcher.

#[cfg(test)]
mod tests {
    use mesh_cloud_client::{LibraryClient, LibraryItem, PlayedItem, ScrobbleClient};
    use mesh_player_service::{
        PlayerCommandService, PlayerModel, PlayerNotificationSender, PlayerStatusResponse,
        VolumeRequest, VolumeResponse,
    };
    use parking_lot::Mutex;
    use serde_json::Value;
    use shared_jsonrpc::{
        codes, BlockingRpcClient, ClientConfig, ManualScheduler, MessageDispatcher, MessageSender,
        MethodTable, PendingCallRegistry, RpcClient, RpcError, RpcErrorObject, TransportError,
    };
    use std::sync::{Arc, OnceLock};

    /// One direction of an in-process wire: everything sent here is
    /// delivered into the dispatcher bound on the other side.
    #[derive(Default)]
    struct WireSender {
        delivery: OnceLock<Arc<MessageDispatcher>>,
    }

    impl WireSender {
        fn bind(&self, dispatcher: Arc<MessageDispatcher>) {
            self.delivery
                .set(dispatcher)
                .unwrap_or_else(|_| panic!("wire already bound"));
        }
    }

    impl MessageSender for WireSender {
        fn send_message(&self, message: &str) -> Result<(), TransportError> {
            match self.delivery.get() {
                Some(dispatcher) => {
                    dispatcher.deliver(message);
                    Ok(())
                }
                None => Err(TransportError::Closed),
            }
        }
    }

    struct ControllerSide {
        blocking: BlockingRpcClient,
        notifications: Arc<Mutex<Vec<(String, Value)>>>,
    }

    /// Wire a controller to a player device and hand back both ends.
    fn controller_and_player() -> (ControllerSide, Arc<PlayerModel>) {
        let to_player = Arc::new(WireSender::default());
        let to_controller = Arc::new(WireSender::default());

        // Controller end: a client plus a dispatcher capturing inbound
        // notifications from the player.
        let controller_registry = Arc::new(PendingCallRegistry::new());
        let controller_client = Arc::new(RpcClient::new(
            to_player.clone(),
            Arc::clone(&controller_registry),
            Arc::new(ManualScheduler::new()),
            ClientConfig::default(),
        ));
        let notifications: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
        let mut controller_methods = MethodTable::new();
        for method in ["playerStatusChanged", "playbackQueueChanged"] {
            let captured = Arc::clone(&notifications);
            controller_methods.register(method, move |params: Option<Value>| {
                captured
                    .lock()
                    .push((method.to_string(), params.unwrap_or(Value::Null)));
                Ok(Value::Null)
            });
        }
        let controller_dispatcher = Arc::new(MessageDispatcher::new(
            controller_registry,
            controller_methods,
            to_player.clone(),
        ));

        // Player end: the command service behind a dispatcher, announcing
        // state changes back over its own client.
        let model = Arc::new(PlayerModel::new("Kitchen", Some("hw-1".to_string())));
        let player_registry = Arc::new(PendingCallRegistry::new());
        let player_client = Arc::new(RpcClient::new(
            to_controller.clone(),
            player_registry.clone(),
            Arc::new(ManualScheduler::new()),
            ClientConfig::default(),
        ));
        let mut player_methods = MethodTable::new();
        PlayerCommandService::new(
            Arc::clone(&model),
            Some(PlayerNotificationSender::new(player_client)),
        )
        .register(&mut player_methods);
        let player_dispatcher = Arc::new(MessageDispatcher::new(
            player_registry,
            player_methods,
            to_controller.clone(),
        ));

        to_player.bind(player_dispatcher);
        to_controller.bind(controller_dispatcher);

        (
            ControllerSide {
                blocking: BlockingRpcClient::new(controller_client),
                notifications,
            },
            model,
        )
    }

    #[test]
    fn test_controller_sets_player_volume() {
        let (controller, model) = controller_and_player();

        let response: VolumeResponse = controller
            .blocking
            .send_request(
                "setVolume",
                Some(&VolumeRequest {
                    volume_level: Some(0.3),
                    ..VolumeRequest::default()
                }),
                None,
            )
            .unwrap();

        assert_eq!(response.volume_level, 0.3);
        assert_eq!(model.volume().volume_level, 0.3);

        // The change was announced back to the controller.
        let notifications = controller.notifications.lock();
        assert!(notifications
            .iter()
            .any(|(method, _)| method == "playerStatusChanged"));
    }

    #[test]
    fn test_controller_drives_playback_queue() {
        let (controller, model) = controller_and_player();

        let response: Value = controller
            .blocking
            .send_request(
                "addTracks",
                Some(&serde_json::json!({
                    "items": [
                        {"id": "track-1", "text": "First"},
                        {"id": "track-2", "text": "Second"}
                    ]
                })),
                None,
            )
            .unwrap();
        assert_eq!(response["result"], true);

        let playing: Value = controller
            .blocking
            .send_request("play", None::<&()>, None)
            .unwrap();
        assert_eq!(playing["playing"], true);

        let status: PlayerStatusResponse = controller
            .blocking
            .send_request("getPlayerStatus", None::<&()>, None)
            .unwrap();
        assert!(status.playing);
        assert_eq!(status.playback_queue_pos, Some(0));
        assert_eq!(status.track.unwrap().id, "track-1");
        assert!(model.status().playing);

        let notifications = controller.notifications.lock();
        assert!(notifications
            .iter()
            .any(|(method, _)| method == "playbackQueueChanged"));
    }

    #[test]
    fn test_unknown_player_method_is_rejected() {
        let (controller, _model) = controller_and_player();

        let error = controller
            .blocking
            .send_request::<Value, ()>("ejectDisc", None, None)
            .unwrap_err();

        match error {
            RpcError::Rejected { code, message, .. } => {
                assert_eq!(code, codes::METHOD_NOT_FOUND);
                assert!(message.contains("ejectDisc"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    /// Wire the cloud clients to a scripted cloud peer.
    fn cloud_fixture(methods: MethodTable) -> BlockingRpcClient {
        let to_cloud = Arc::new(WireSender::default());
        let to_client = Arc::new(WireSender::default());

        let registry = Arc::new(PendingCallRegistry::new());
        let client = Arc::new(RpcClient::new(
            to_cloud.clone(),
            Arc::clone(&registry),
            Arc::new(ManualScheduler::new()),
            ClientConfig::default(),
        ));
        let client_dispatcher = Arc::new(MessageDispatcher::new(
            registry,
            MethodTable::new(),
            to_cloud.clone(),
        ));

        let cloud_registry = Arc::new(PendingCallRegistry::new());
        let cloud_dispatcher = Arc::new(MessageDispatcher::new(
            cloud_registry,
            methods,
            to_client.clone(),
        ));

        to_cloud.bind(cloud_dispatcher);
        to_client.bind(client_dispatcher);

        BlockingRpcClient::new(client)
    }

    #[test]
    fn test_library_client_round_trip() {
        let mut cloud_methods = MethodTable::new();
        cloud_methods.register("getTrack", |params: Option<Value>| {
            let track_id = params
                .as_ref()
                .and_then(|p| p["trackId"].as_str())
                .ok_or_else(|| RpcErrorObject::invalid_params("trackId is required"))?;
            Ok(serde_json::json!({
                "id": track_id,
                "text": "Blue in Green",
                "type": "track",
                "itemAttributes": {"album": "Kind of Blue", "trackNumber": 3}
            }))
        });

        let library = LibraryClient::new(cloud_fixture(cloud_methods));
        let track = library.get_track("track-9", None).unwrap();

        assert_eq!(track.id.as_deref(), Some("track-9"));
        assert_eq!(track.text.as_deref(), Some("Blue in Green"));
        let attributes = track.item_attributes.unwrap();
        assert_eq!(attributes.album.as_deref(), Some("Kind of Blue"));
        assert_eq!(attributes.track_number, Some(3));
    }

    #[test]
    fn test_scrobble_unauthorized_is_branchable() {
        let mut cloud_methods = MethodTable::new();
        cloud_methods.register("playedTrack", |_params: Option<Value>| {
            Err(RpcErrorObject::new(
                codes::UNAUTHORIZED,
                "Access token expired",
            ))
        });

        let scrobble = ScrobbleClient::new(cloud_fixture(cloud_methods));
        let error = scrobble
            .played_track(
                &PlayedItem {
                    occurrence_timestamp: Some(1_700_000_000),
                    item: LibraryItem {
                        id: Some("track-9".to_string()),
                        ..LibraryItem::default()
                    },
                },
                None,
            )
            .unwrap_err();

        // Callers branch on the kind, not the message.
        assert!(matches!(error, RpcError::Unauthorized { .. }));
        assert_eq!(error.to_string(), "-32010: Access token expired");
    }
}
