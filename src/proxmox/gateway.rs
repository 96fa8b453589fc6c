use std::sync::Arc;

use reqwest::header::{HeaderValue, COOKIE};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use super::auth::{Credentials, CSRF_HEADER};
use super::response::normalize;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

/// One relayed call against `/nodes/{node}/qemu/{vmid}/{action}`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    node: String,
    vmid: u32,
    action: String,
    method: HttpMethod,
    payload: Option<Map<String, Value>>,
}

impl OperationRequest {
    pub fn new<S: Into<String>>(node: S, vmid: u32, action: S, method: HttpMethod) -> Self {
        Self { node: node.into(), vmid, action: action.into(), method, payload: None }
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn node(&self) -> &str { &self.node }
    pub fn vmid(&self) -> u32 { self.vmid }
    pub fn method(&self) -> HttpMethod { self.method }
    pub fn payload(&self) -> Option<&Map<String, Value>> { self.payload.as_ref() }

    /// Path below the API base. The node name is escaped as a single segment.
    pub fn path(&self) -> String {
        format!("/nodes/{}/qemu/{}/{}", urlencoding::encode(&self.node), self.vmid, self.action)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub status: u16,
    pub body: Value,
}

/// Attaches credentials to an `OperationRequest`, sends it, and normalizes the reply.
#[derive(Clone)]
pub struct RequestGateway {
    cfg: Arc<GatewayConfig>,
    client: reqwest::Client,
}

impl RequestGateway {
    pub fn new(cfg: Arc<GatewayConfig>, client: reqwest::Client) -> Self {
        Self { cfg, client }
    }

    pub fn url_for(&self, op: &OperationRequest) -> String {
        format!("{}{}", self.cfg.base_url, op.path())
    }

    pub async fn invoke(&self, op: OperationRequest, creds: Credentials) -> GatewayResult<OperationResult> {
        let url = self.url_for(&op);
        debug!(target: "proxmox", method = ?op.method, "relaying to {}", url);

        let csrf = HeaderValue::from_str(creds.csrf_token())
            .map_err(|e| GatewayError::Authentication(format!("unusable CSRF token: {}", e)))?;
        let cookie = HeaderValue::from_str(&creds.cookie_header())
            .map_err(|e| GatewayError::Authentication(format!("unusable ticket: {}", e)))?;

        let mut req = self
            .client
            .request(op.method.as_reqwest(), &url)
            .header(COOKIE, cookie)
            .header(CSRF_HEADER, csrf);
        if let Some(payload) = &op.payload {
            req = req.json(payload);
        }

        let resp = req.send().await.map_err(|e| {
            error!(target: "proxmox", "Request exception for {}: {}", url, e);
            GatewayError::RemoteCall(e.to_string())
        })?;
        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| {
            error!(target: "proxmox", "Failed reading response body from {}: {}", url, e);
            GatewayError::RemoteCall(e.to_string())
        })?;
        debug!(target: "proxmox", status, "response from {}", url);

        let body = normalize(status, &text)?;
        info!(target: "proxmox", node = %op.node, vmid = op.vmid, status, "relayed {}", op.action);
        Ok(OperationResult { status, body })
    }
}
