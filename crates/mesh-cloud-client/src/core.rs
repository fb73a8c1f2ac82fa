//! Client for the cloud core service: service lookup and device
//! registration.

use crate::types::{
    AddDeviceRequest, AddDeviceResponse, FindServicesRequest, FindServicesResponse,
    ServiceInformation,
};
use serde_json::json;
use shared_jsonrpc::{BlockingRpcClient, RpcError};
use std::time::Duration;

/// Thin typed method set over the shared RPC client.
#[derive(Clone)]
pub struct CoreServiceClient {
    rpc: BlockingRpcClient,
}

impl CoreServiceClient {
    pub fn new(rpc: BlockingRpcClient) -> Self {
        Self { rpc }
    }

    pub fn get_service_information(
        &self,
        timeout: Option<Duration>,
    ) -> Result<ServiceInformation, RpcError> {
        self.rpc
            .send_request("getServiceInformation", None::<&()>, timeout)
    }

    pub fn find_services(
        &self,
        request: &FindServicesRequest,
        timeout: Option<Duration>,
    ) -> Result<FindServicesResponse, RpcError> {
        self.rpc.send_request("findServices", Some(request), timeout)
    }

    pub fn add_device(
        &self,
        request: &AddDeviceRequest,
        timeout: Option<Duration>,
    ) -> Result<AddDeviceResponse, RpcError> {
        self.rpc.send_request("addDevice", Some(request), timeout)
    }

    pub fn remove_device(
        &self,
        device_id: &str,
        timeout: Option<Duration>,
    ) -> Result<bool, RpcError> {
        self.rpc.send_request(
            "removeDevice",
            Some(&json!({ "deviceId": device_id })),
            timeout,
        )
    }
}
