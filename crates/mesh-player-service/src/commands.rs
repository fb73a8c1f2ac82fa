//! Inbound command handlers for the player device.
//!
//! Installs the player's method set into the engine's method table; the
//! dispatcher routes inbound requests here and returns whatever these
//! handlers produce. Peers observe state changes through the notification
//! sender: a notification failure never fails the command that caused it.

use crate::model::{
    AddTracksRequest, PlaybackQueueChangedNotification, PlayerConfigurationRequest, PlayerModel,
    RemoveTracksRequest, VolumeRequest,
};
use crate::notifications::PlayerNotificationSender;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_jsonrpc::{MethodTable, RpcErrorObject};
use std::sync::Arc;
use tracing::debug;

/// Wires the player model into a method table.
pub struct PlayerCommandService {
    model: Arc<PlayerModel>,
    notifications: Option<PlayerNotificationSender>,
}

impl PlayerCommandService {
    pub fn new(model: Arc<PlayerModel>, notifications: Option<PlayerNotificationSender>) -> Self {
        Self {
            model,
            notifications,
        }
    }

    /// Install every player method into `table`.
    pub fn register(&self, table: &mut MethodTable) {
        let model = Arc::clone(&self.model);
        table.register("getPlayerConfiguration", move |_params: Option<Value>| {
            encode(&model.configuration())
        });

        let model = Arc::clone(&self.model);
        let notifications = self.notifications.clone();
        table.register("setPlayerConfiguration", move |params: Option<Value>| {
            let request: PlayerConfigurationRequest = decode_params(params)?;
            if model.apply_configuration(&request) {
                notify_status(&notifications, &model);
            }
            encode(&model.configuration())
        });

        let model = Arc::clone(&self.model);
        table.register("getPlayerStatus", move |_params: Option<Value>| {
            encode(&model.status())
        });

        let model = Arc::clone(&self.model);
        table.register("getVolume", move |_params: Option<Value>| {
            encode(&model.volume())
        });

        let model = Arc::clone(&self.model);
        let notifications = self.notifications.clone();
        table.register("setVolume", move |params: Option<Value>| {
            let request: VolumeRequest = decode_params(params)?;
            if request.volume_level.is_none()
                && request.relative_volume_level.is_none()
                && request.muted.is_none()
            {
                return Err(RpcErrorObject::invalid_params(
                    "one of volumeLevel, relativeVolumeLevel, muted is required",
                ));
            }
            if let Some(level) = request.volume_level {
                if !(0.0..=1.0).contains(&level) {
                    return Err(RpcErrorObject::invalid_params(
                        "volumeLevel must be within 0.0..=1.0",
                    ));
                }
            }
            let response = model.apply_volume(&request);
            notify_status(&notifications, &model);
            encode(&response)
        });

        let model = Arc::clone(&self.model);
        let notifications = self.notifications.clone();
        table.register("play", move |params: Option<Value>| {
            let playing = match params {
                Some(value) => {
                    #[derive(serde::Deserialize)]
                    #[serde(rename_all = "camelCase")]
                    struct PlayRequest {
                        playing: bool,
                    }
                    serde_json::from_value::<PlayRequest>(value)
                        .map_err(|e| RpcErrorObject::invalid_params(e.to_string()))?
                        .playing
                }
                None => true,
            };
            let playing = model.set_playing(playing);
            notify_status(&notifications, &model);
            encode(&serde_json::json!({ "playing": playing }))
        });

        let model = Arc::clone(&self.model);
        let notifications = self.notifications.clone();
        table.register("addTracks", move |params: Option<Value>| {
            let request: AddTracksRequest = decode_params(params)?;
            let response = model.add_tracks(&request);
            notify_queue(&notifications, &model);
            encode(&response)
        });

        let model = Arc::clone(&self.model);
        let notifications = self.notifications.clone();
        table.register("removeTracks", move |params: Option<Value>| {
            let request: RemoveTracksRequest = decode_params(params)?;
            let response = model.remove_tracks(&request);
            notify_queue(&notifications, &model);
            encode(&response)
        });
    }
}

fn decode_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcErrorObject> {
    let params = params.ok_or_else(|| RpcErrorObject::invalid_params("params are required"))?;
    serde_json::from_value(params).map_err(|e| RpcErrorObject::invalid_params(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, RpcErrorObject> {
    serde_json::to_value(value).map_err(|e| RpcErrorObject::internal(e.to_string()))
}

fn notify_status(notifications: &Option<PlayerNotificationSender>, model: &PlayerModel) {
    if let Some(sender) = notifications {
        if let Err(e) = sender.player_status_changed(&model.status()) {
            debug!(error = %e, "failed to send playerStatusChanged");
        }
    }
}

fn notify_queue(notifications: &Option<PlayerNotificationSender>, model: &PlayerModel) {
    if let Some(sender) = notifications {
        let (queue, queue_pos) = model.queue_snapshot();
        let change = PlaybackQueueChangedNotification {
            track_count: queue.len(),
            playback_queue_pos: queue_pos,
        };
        if let Err(e) = sender.playback_queue_changed(&change) {
            debug!(error = %e, "failed to send playbackQueueChanged");
        }
    }
    notify_status(notifications, model);
}
