//! Client for the cloud library service.

use crate::types::LibraryItem;
use serde_json::json;
use shared_jsonrpc::{BlockingRpcClient, RpcError};
use std::time::Duration;

#[derive(Clone)]
pub struct LibraryClient {
    rpc: BlockingRpcClient,
}

impl LibraryClient {
    pub fn new(rpc: BlockingRpcClient) -> Self {
        Self { rpc }
    }

    pub fn get_track(
        &self,
        track_id: &str,
        timeout: Option<Duration>,
    ) -> Result<LibraryItem, RpcError> {
        self.rpc
            .send_request("getTrack", Some(&json!({ "trackId": track_id })), timeout)
    }

    pub fn save_track(
        &self,
        item: &LibraryItem,
        timeout: Option<Duration>,
    ) -> Result<bool, RpcError> {
        self.rpc.send_request("saveTrack", Some(item), timeout)
    }

    pub fn remove_track(
        &self,
        track_id: &str,
        timeout: Option<Duration>,
    ) -> Result<bool, RpcError> {
        self.rpc.send_request(
            "removeTrack",
            Some(&json!({ "trackId": track_id })),
            timeout,
        )
    }
}
