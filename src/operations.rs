//! VM lifecycle operations exposed by the gateway.
//!
//! Each operation is a fixed mapping from a validated input shape to an
//! `OperationRequest`. `VmService` runs the per-request flow: validate,
//! authenticate once, invoke, and build the client-facing reply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::proxmox::{build_client, HttpMethod, OperationRequest, RequestGateway, SessionAuthenticator};

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigData {
    pub ciuser: String,
    pub cipassword: String,
    pub node_name: String,
    pub vm_id: u32,
    pub sshkeys: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlVmRequest {
    pub node_name: String,
    pub vmid: u32,
    pub action: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRequest {
    pub node: String,
    pub vmid: u32,
    pub snapname: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResizeDiskRequest {
    pub node: String,
    pub vmid: u32,
    pub disk: String,
    /// Absolute (`32G`) or relative (`+10G`) size.
    pub size: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloneVmRequest {
    pub node_name: String,
    pub template_vmid: u32,
    pub new_vmid: u32,
    pub name: String,
    pub storage: String,
}

/// Reply body for every successful operation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OperationReply {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmAction {
    Start,
    Stop,
}

impl VmAction {
    /// Only the exact lowercase words are accepted.
    pub fn parse(s: &str) -> GatewayResult<Self> {
        match s {
            "start" => Ok(VmAction::Start),
            "stop" => Ok(VmAction::Stop),
            _ => Err(GatewayError::validation("Invalid action. Use 'start' or 'stop'.")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VmAction::Start => "start",
            VmAction::Stop => "stop",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            VmAction::Start => "started",
            VmAction::Stop => "stopped",
        }
    }
}

/// Percent-encode an SSH key blob the way the Proxmox `sshkeys` option expects.
pub fn encode_sshkeys(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

pub fn update_config_request(data: &ConfigData) -> OperationRequest {
    let payload = json!({
        "ciuser": data.ciuser,
        "cipassword": data.cipassword,
        "sshkeys": encode_sshkeys(&data.sshkeys),
        "ipconfig0": "ip=dhcp",
    });
    OperationRequest::new(data.node_name.as_str(), data.vm_id, "config", HttpMethod::Post).with_payload(object(payload))
}

pub fn control_vm_request(data: &ControlVmRequest) -> GatewayResult<(VmAction, OperationRequest)> {
    let action = VmAction::parse(&data.action)?;
    let path = format!("status/{}", action.as_str());
    Ok((action, OperationRequest::new(data.node_name.clone(), data.vmid, path, HttpMethod::Post)))
}

pub fn snapshot_request(data: &SnapshotRequest) -> OperationRequest {
    let payload = json!({ "snapname": data.snapname, "description": data.description });
    OperationRequest::new(data.node.as_str(), data.vmid, "snapshot", HttpMethod::Post).with_payload(object(payload))
}

pub fn resize_disk_request(data: &ResizeDiskRequest) -> OperationRequest {
    let payload = json!({ "disk": data.disk, "size": data.size });
    OperationRequest::new(data.node.as_str(), data.vmid, "resize", HttpMethod::Put).with_payload(object(payload))
}

/// Full clone of `template_vmid` onto `storage`; linked clones cannot change storage.
pub fn clone_vm_request(data: &CloneVmRequest) -> OperationRequest {
    let payload = json!({
        "newid": data.new_vmid,
        "name": data.name,
        "storage": data.storage,
        "full": 1,
    });
    OperationRequest::new(data.node_name.as_str(), data.template_vmid, "clone", HttpMethod::Post).with_payload(object(payload))
}

/// Authenticator + gateway pair shared by all handlers.
#[derive(Clone)]
pub struct VmService {
    auth: SessionAuthenticator,
    gateway: RequestGateway,
}

impl VmService {
    pub fn new(cfg: GatewayConfig) -> reqwest::Result<Self> {
        let client = build_client(&cfg)?;
        let cfg = Arc::new(cfg);
        Ok(Self {
            auth: SessionAuthenticator::new(cfg.clone(), client.clone()),
            gateway: RequestGateway::new(cfg, client),
        })
    }

    /// One fresh session per relayed operation.
    async fn relay(&self, op: OperationRequest) -> GatewayResult<Value> {
        let creds = self.auth.authenticate().await?;
        let result = self.gateway.invoke(op, creds).await?;
        Ok(result.body)
    }

    pub async fn update_config(&self, data: &ConfigData) -> GatewayResult<OperationReply> {
        let body = self.relay(update_config_request(data)).await?;
        info!(target: "operations", vmid = data.vm_id, "Configuration update response: {}", body);
        Ok(OperationReply { message: "VM configuration updated successfully.".to_string(), details: None })
    }

    pub async fn control_vm(&self, data: &ControlVmRequest) -> GatewayResult<OperationReply> {
        // Validation happens before any remote call, authentication included.
        let (action, op) = control_vm_request(data)?;
        let body = self.relay(op).await?;
        info!(target: "operations", vmid = data.vmid, action = action.as_str(), "Action response: {}", body);
        Ok(OperationReply {
            message: format!("VM {} {} successfully.", data.vmid, action.past_tense()),
            details: None,
        })
    }

    pub async fn create_snapshot(&self, data: &SnapshotRequest) -> GatewayResult<OperationReply> {
        let body = self.relay(snapshot_request(data)).await?;
        info!(target: "operations", vmid = data.vmid, snapname = %data.snapname, "Snapshot creation response: {}", body);
        Ok(OperationReply { message: "Snapshot created successfully".to_string(), details: Some(body) })
    }

    pub async fn resize_disk(&self, data: &ResizeDiskRequest) -> GatewayResult<OperationReply> {
        let body = self.relay(resize_disk_request(data)).await?;
        info!(target: "operations", vmid = data.vmid, disk = %data.disk, "Disk resize response: {}", body);
        Ok(OperationReply { message: "Disk resized successfully".to_string(), details: Some(body) })
    }

    pub async fn clone_vm(&self, data: &CloneVmRequest) -> GatewayResult<OperationReply> {
        let body = self.relay(clone_vm_request(data)).await?;
        info!(target: "operations", template = data.template_vmid, newid = data.new_vmid, "Clone response: {}", body);
        Ok(OperationReply {
            message: format!("VM {} cloned to {} successfully.", data.template_vmid, data.new_vmid),
            details: Some(body),
        })
    }
}
