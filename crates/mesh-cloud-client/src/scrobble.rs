//! Client for the cloud scrobble service.

use crate::types::PlayedItem;
use shared_jsonrpc::{BlockingRpcClient, RpcError};
use std::time::Duration;

#[derive(Clone)]
pub struct ScrobbleClient {
    rpc: BlockingRpcClient,
}

impl ScrobbleClient {
    pub fn new(rpc: BlockingRpcClient) -> Self {
        Self { rpc }
    }

    /// Report a finished playback. `RpcError::Unauthorized` is the branch
    /// callers take to trigger re-registration.
    pub fn played_track(
        &self,
        played: &PlayedItem,
        timeout: Option<Duration>,
    ) -> Result<bool, RpcError> {
        self.rpc.send_request("playedTrack", Some(played), timeout)
    }
}
