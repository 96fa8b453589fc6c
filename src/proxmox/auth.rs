use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

pub const SESSION_COOKIE: &str = "PVEAuthCookie";
pub const CSRF_HEADER: &str = "CSRFPreventionToken";

/// Ticket + CSRF token for exactly one remote call. Not `Clone`: the gateway
/// takes it by value, so a pair cannot be replayed against a second call.
pub struct Credentials {
    ticket: String,
    csrf_token: String,
}

impl Credentials {
    pub fn new<S: Into<String>>(ticket: S, csrf_token: S) -> Self {
        Self { ticket: ticket.into(), csrf_token: csrf_token.into() }
    }

    /// `Cookie` header value.
    pub fn cookie_header(&self) -> String { format!("{}={}", SESSION_COOKIE, self.ticket) }

    pub fn csrf_token(&self) -> &str { &self.csrf_token }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TicketEnvelope {
    data: Option<TicketData>,
}

#[derive(Debug, Deserialize)]
struct TicketData {
    ticket: Option<String>,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_prevention_token: Option<String>,
}

/// Acquires a fresh Proxmox session per call. Nothing is cached.
#[derive(Clone)]
pub struct SessionAuthenticator {
    cfg: Arc<GatewayConfig>,
    client: reqwest::Client,
}

impl SessionAuthenticator {
    pub fn new(cfg: Arc<GatewayConfig>, client: reqwest::Client) -> Self {
        Self { cfg, client }
    }

    pub async fn authenticate(&self) -> GatewayResult<Credentials> {
        let url = self.cfg.ticket_url();
        debug!(target: "proxmox", user = %self.cfg.username, "requesting ticket from {}", url);
        let form = [("username", self.cfg.username.as_str()), ("password", self.cfg.password.as_str())];

        let resp = self.client.post(&url).form(&form).send().await.map_err(|e| {
            error!(target: "proxmox", "Authentication failed: {}", e);
            GatewayError::Authentication(e.to_string())
        })?;
        let status = resp.status();
        if !status.is_success() {
            error!(target: "proxmox", "Authentication failed: HTTP {}", status);
            return Err(GatewayError::Authentication(format!("HTTP {}", status)));
        }
        let envelope: TicketEnvelope = resp.json().await.map_err(|e| {
            error!(target: "proxmox", "Authentication failed: unreadable ticket response: {}", e);
            GatewayError::Authentication(format!("unreadable ticket response: {}", e))
        })?;
        extract_credentials(envelope)
    }
}

fn extract_credentials(envelope: TicketEnvelope) -> GatewayResult<Credentials> {
    let data = envelope.data.ok_or_else(|| missing("data"))?;
    let ticket = data.ticket.ok_or_else(|| missing("data.ticket"))?;
    let csrf = data.csrf_prevention_token.ok_or_else(|| missing("data.CSRFPreventionToken"))?;
    Ok(Credentials::new(ticket, csrf))
}

fn missing(field: &str) -> GatewayError {
    error!(target: "proxmox", "Authentication failed: ticket response lacks {}", field);
    GatewayError::Authentication(format!("ticket response lacks {}", field))
}
