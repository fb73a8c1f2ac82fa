//! Outbound status notifications from the player to its peers.

use crate::model::{PlaybackQueueChangedNotification, PlayerStatusResponse};
use shared_jsonrpc::{RpcClient, RpcError};
use std::sync::Arc;

/// Fire-and-forget announcements of player state changes.
#[derive(Clone)]
pub struct PlayerNotificationSender {
    client: Arc<RpcClient>,
}

impl PlayerNotificationSender {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    pub fn player_status_changed(&self, status: &PlayerStatusResponse) -> Result<(), RpcError> {
        self.client
            .send_notification("playerStatusChanged", Some(status))
    }

    pub fn playback_queue_changed(
        &self,
        change: &PlaybackQueueChangedNotification,
    ) -> Result<(), RpcError> {
        self.client
            .send_notification("playbackQueueChanged", Some(change))
    }
}
