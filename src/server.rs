//!
//! proxgate HTTP server
//! --------------------
//! Axum-based HTTP facade in front of the Proxmox VE API.
//!
//! Responsibilities:
//! - Accept the VM lifecycle requests (config, power, snapshot, resize, clone).
//! - Delegate each one to `VmService`, which authenticates per call and relays.
//! - Translate failures into `{"detail": ...}` bodies via `GatewayError`.

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::info;

use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::operations::{
    CloneVmRequest, ConfigData, ControlVmRequest, OperationReply, ResizeDiskRequest, SnapshotRequest, VmService,
};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: VmService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "proxgate ok" }))
        .route("/update-config", post(update_config))
        .route("/control-vm", post(control_vm))
        .route("/create-snapshot/", post(create_snapshot))
        .route("/resize-disk/", put(resize_disk))
        .route("/clone-vm", post(clone_vm))
        .with_state(state)
}

/// Start the gateway on `cfg.http_port`, bound to all interfaces.
pub async fn run_with_config(cfg: GatewayConfig) -> anyhow::Result<()> {
    let http_port = cfg.http_port;
    info!(target: "startup", "proxgate relaying to {} (verify_tls={}, timeout={:?})", cfg.base_url, cfg.verify_tls, cfg.timeout);
    let service = VmService::new(cfg)?;
    let app = router(AppState { service });

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn update_config(State(state): State<AppState>, Json(data): Json<ConfigData>) -> GatewayResult<Json<OperationReply>> {
    info!("POST /update-config node={} vm_id={}", data.node_name, data.vm_id);
    state.service.update_config(&data).await.map(Json)
}

async fn control_vm(State(state): State<AppState>, Json(data): Json<ControlVmRequest>) -> GatewayResult<Json<OperationReply>> {
    info!("POST /control-vm node={} vmid={} action={}", data.node_name, data.vmid, data.action);
    state.service.control_vm(&data).await.map(Json)
}

async fn create_snapshot(State(state): State<AppState>, Json(data): Json<SnapshotRequest>) -> GatewayResult<Json<OperationReply>> {
    info!("POST /create-snapshot/ node={} vmid={} snapname={}", data.node, data.vmid, data.snapname);
    state.service.create_snapshot(&data).await.map(Json)
}

async fn resize_disk(State(state): State<AppState>, Json(data): Json<ResizeDiskRequest>) -> GatewayResult<Json<OperationReply>> {
    info!("PUT /resize-disk/ node={} vmid={} disk={} size={}", data.node, data.vmid, data.disk, data.size);
    state.service.resize_disk(&data).await.map(Json)
}

async fn clone_vm(State(state): State<AppState>, Json(data): Json<CloneVmRequest>) -> GatewayResult<Json<OperationReply>> {
    info!("POST /clone-vm node={} template={} new={}", data.node_name, data.template_vmid, data.new_vmid);
    state.service.clone_vm(&data).await.map(Json)
}
