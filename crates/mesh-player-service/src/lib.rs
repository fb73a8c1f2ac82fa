//! # mesh-player-service: the player-device side of the ecosystem
//!
//! A player is mostly *called*: controllers and the cloud send it
//! commands, and it answers through the engine's dispatcher. This crate
//! provides the player state model, the inbound command handlers that
//! install into a [`MethodTable`](shared_jsonrpc::MethodTable), and the
//! fire-and-forget status notifications a player emits when its state
//! changes.
//!
//! ```ignore
//! let model = Arc::new(PlayerModel::new("Kitchen", Some(hardware_id)));
//! let notifications = PlayerNotificationSender::new(Arc::clone(&client));
//! let mut methods = MethodTable::new();
//! PlayerCommandService::new(Arc::clone(&model), Some(notifications)).register(&mut methods);
//! let dispatcher = MessageDispatcher::new(registry, methods, transport);
//! ```

pub mod commands;
pub mod model;
pub mod notifications;

pub use commands::PlayerCommandService;
pub use model::{
    AddTracksRequest, PlaybackQueueChangedNotification, PlaybackQueueItem,
    PlaybackQueueItemReference, PlaybackQueueModificationResponse, PlayerConfigurationRequest,
    PlayerConfigurationResponse, PlayerModel, PlayerStatusResponse, RemoveTracksRequest,
    VolumeRequest, VolumeResponse,
};
pub use notifications::PlayerNotificationSender;
