//! Outbound side of the gateway: Proxmox session acquisition and request relay.
//! Keep the public surface thin and split implementation across sub-modules.

mod auth;
mod gateway;
mod response;

pub use auth::{Credentials, SessionAuthenticator, CSRF_HEADER, SESSION_COOKIE};
pub use gateway::{HttpMethod, OperationRequest, OperationResult, RequestGateway};
pub use response::normalize;

use crate::config::GatewayConfig;

/// Build the HTTP client shared by the authenticator and the gateway.
/// The configured timeout bounds every outbound call.
pub fn build_client(cfg: &GatewayConfig) -> reqwest::Result<reqwest::Client> {
    if !cfg.verify_tls {
        tracing::warn!(target: "proxmox", "TLS certificate verification for {} is DISABLED", cfg.base_url);
    }
    reqwest::Client::builder()
        .danger_accept_invalid_certs(!cfg.verify_tls)
        .timeout(cfg.timeout)
        .build()
}
