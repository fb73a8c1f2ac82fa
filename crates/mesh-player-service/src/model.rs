//! Player state model and the player-facing wire DTOs.
//!
//! The model is the single mutable resource of a player device. Command
//! handlers run on the delivery path and callers may poll concurrently,
//! so all state lives behind one mutex with short critical sections.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One entry of the playback queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackQueueItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Reference to a queue entry in a removal request: by id, optionally
/// pinned to one position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackQueueItemReference {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_queue_pos: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTracksRequest {
    pub items: Vec<PlaybackQueueItem>,
    /// Insertion point; appended at the end when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_queue_pos: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTracksRequest {
    pub items: Vec<PlaybackQueueItemReference>,
}

/// Outcome of a queue mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackQueueModificationResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_queue_pos: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_volume_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResponse {
    pub volume_level: f64,
    pub muted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfigurationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfigurationResponse {
    pub player_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_core_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatusResponse {
    pub playing: bool,
    pub volume_level: f64,
    pub muted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_queue_pos: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<PlaybackQueueItem>,
}

/// Notification payload for queue changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackQueueChangedNotification {
    pub track_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_queue_pos: Option<usize>,
}

struct PlayerState {
    player_name: String,
    hardware_id: Option<String>,
    cloud_core_url: Option<String>,
    access_token: Option<String>,
    playing: bool,
    volume_level: f64,
    muted: bool,
    queue: Vec<PlaybackQueueItem>,
    queue_pos: Option<usize>,
}

/// Shared player state.
pub struct PlayerModel {
    state: Mutex<PlayerState>,
}

impl PlayerModel {
    pub fn new(player_name: impl Into<String>, hardware_id: Option<String>) -> Self {
        Self {
            state: Mutex::new(PlayerState {
                player_name: player_name.into(),
                hardware_id,
                cloud_core_url: None,
                access_token: None,
                playing: false,
                volume_level: 1.0,
                muted: false,
                queue: Vec::new(),
                queue_pos: None,
            }),
        }
    }

    pub fn configuration(&self) -> PlayerConfigurationResponse {
        let state = self.state.lock();
        PlayerConfigurationResponse {
            player_name: state.player_name.clone(),
            hardware_id: state.hardware_id.clone(),
            cloud_core_url: state.cloud_core_url.clone(),
        }
    }

    /// Apply a configuration change and report whether anything changed.
    pub fn apply_configuration(&self, request: &PlayerConfigurationRequest) -> bool {
        let mut state = self.state.lock();
        let mut changed = false;
        if let Some(player_name) = &request.player_name {
            if *player_name != state.player_name {
                state.player_name = player_name.clone();
                changed = true;
            }
        }
        if let Some(access_token) = &request.access_token {
            // An empty token clears the registration.
            let token = if access_token.is_empty() {
                None
            } else {
                Some(access_token.clone())
            };
            if token != state.access_token {
                state.access_token = token;
                changed = true;
            }
        }
        changed
    }

    pub fn has_access_token(&self) -> bool {
        self.state.lock().access_token.is_some()
    }

    pub fn volume(&self) -> VolumeResponse {
        let state = self.state.lock();
        VolumeResponse {
            volume_level: state.volume_level,
            muted: state.muted,
        }
    }

    /// Apply an absolute or relative volume change; levels clamp to
    /// `0.0..=1.0`.
    pub fn apply_volume(&self, request: &VolumeRequest) -> VolumeResponse {
        let mut state = self.state.lock();
        if let Some(level) = request.volume_level {
            state.volume_level = level.clamp(0.0, 1.0);
        } else if let Some(delta) = request.relative_volume_level {
            state.volume_level = (state.volume_level + delta).clamp(0.0, 1.0);
        }
        if let Some(muted) = request.muted {
            state.muted = muted;
        }
        VolumeResponse {
            volume_level: state.volume_level,
            muted: state.muted,
        }
    }

    pub fn set_playing(&self, playing: bool) -> bool {
        let mut state = self.state.lock();
        if state.queue.is_empty() {
            state.playing = false;
            return false;
        }
        state.playing = playing;
        if playing && state.queue_pos.is_none() {
            state.queue_pos = Some(0);
        }
        state.playing
    }

    pub fn status(&self) -> PlayerStatusResponse {
        let state = self.state.lock();
        let track = state
            .queue_pos
            .and_then(|pos| state.queue.get(pos).cloned());
        PlayerStatusResponse {
            playing: state.playing,
            volume_level: state.volume_level,
            muted: state.muted,
            playback_queue_pos: state.queue_pos,
            track,
        }
    }

    pub fn queue_snapshot(&self) -> (Vec<PlaybackQueueItem>, Option<usize>) {
        let state = self.state.lock();
        (state.queue.clone(), state.queue_pos)
    }

    /// Insert tracks at the requested position (end when absent).
    pub fn add_tracks(&self, request: &AddTracksRequest) -> PlaybackQueueModificationResponse {
        let mut state = self.state.lock();
        let insert_at = request
            .playback_queue_pos
            .unwrap_or(state.queue.len())
            .min(state.queue.len());
        for (offset, item) in request.items.iter().enumerate() {
            state.queue.insert(insert_at + offset, item.clone());
        }
        // Keep the current track current when inserting in front of it.
        if let Some(pos) = state.queue_pos {
            if insert_at <= pos {
                state.queue_pos = Some(pos + request.items.len());
            }
        }
        PlaybackQueueModificationResponse {
            result: true,
            playback_queue_pos: state.queue_pos,
        }
    }

    /// Remove tracks by id, or by id pinned to one position. References
    /// whose id does not match the pinned position are ignored.
    pub fn remove_tracks(&self, request: &RemoveTracksRequest) -> PlaybackQueueModificationResponse {
        let mut state = self.state.lock();
        let mut removed_positions: Vec<usize> = Vec::new();
        for reference in &request.items {
            match reference.playback_queue_pos {
                Some(pos) => {
                    if state.queue.get(pos).map(|item| item.id.as_str())
                        == Some(reference.id.as_str())
                    {
                        removed_positions.push(pos);
                    }
                }
                None => {
                    removed_positions.extend(
                        state
                            .queue
                            .iter()
                            .enumerate()
                            .filter(|(_, item)| item.id == reference.id)
                            .map(|(pos, _)| pos),
                    );
                }
            }
        }
        removed_positions.sort_unstable();
        removed_positions.dedup();

        for &pos in removed_positions.iter().rev() {
            state.queue.remove(pos);
        }

        if let Some(current) = state.queue_pos {
            let removed_before = removed_positions
                .iter()
                .filter(|&&pos| pos < current)
                .count();
            let mut new_pos = current - removed_before;
            if removed_positions.contains(&current) || state.queue.is_empty() {
                // The playing track went away.
                state.playing = false;
            }
            if state.queue.is_empty() {
                state.queue_pos = None;
            } else {
                if new_pos >= state.queue.len() {
                    new_pos = state.queue.len() - 1;
                }
                state.queue_pos = Some(new_pos);
            }
        }

        PlaybackQueueModificationResponse {
            result: true,
            playback_queue_pos: state.queue_pos,
        }
    }
}
