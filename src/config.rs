//! Process configuration for the gateway.
//!
//! Values come from the environment and can be overridden by command-line flags.
//! TLS verification towards Proxmox is enforced unless explicitly disabled.

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_HTTP_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct GatewayConfig {
    /// Base API URL, e.g. `https://pve.example:8006/api2/json`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub http_port: u16,
}

// Manual impl so the password never lands in logs.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .field("http_port", &self.http_port)
            .finish()
    }
}

impl GatewayConfig {
    pub fn new<S: Into<String>>(base_url: S, username: S, password: S) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            verify_tls: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            http_port: DEFAULT_HTTP_PORT,
        }
    }

    /// Build from a variable lookup and argv. `lookup` stands in for `std::env::var`.
    pub fn from_sources<F>(lookup: F, args: &[String]) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_value_arg(args, "--proxmox-host")
            .or_else(|| lookup("PROXMOX_HOST"))
            .ok_or_else(|| anyhow!("PROXMOX_HOST is not set"))?;
        let username = lookup("PROXMOX_USERNAME").ok_or_else(|| anyhow!("PROXMOX_USERNAME is not set"))?;
        let password = match (lookup("PROXMOX_PASSWORD"), lookup("PROXMOX_PASSWORD_FILE")) {
            (Some(p), _) => p,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("While reading PROXMOX_PASSWORD_FILE: {}", path))?
                .trim_end_matches(&['\r', '\n'][..])
                .to_string(),
            (None, None) => return Err(anyhow!("PROXMOX_PASSWORD or PROXMOX_PASSWORD_FILE must be set")),
        };

        let mut cfg = GatewayConfig::new(base_url, username, password);
        if let Some(v) = lookup("PROXMOX_VERIFY_SSL") {
            cfg.verify_tls = parse_bool(&v).ok_or_else(|| anyhow!("invalid PROXMOX_VERIFY_SSL value: {}", v))?;
        }
        if has_flag(args, "--insecure") { cfg.verify_tls = false; }
        if let Some(v) = lookup("PROXMOX_TIMEOUT_SECS") {
            let secs = v.parse::<u64>().with_context(|| format!("invalid PROXMOX_TIMEOUT_SECS: {}", v))?;
            cfg.timeout = Duration::from_secs(secs);
        }
        let env_port = lookup("PROXGATE_HTTP_PORT").and_then(|v| v.parse::<u16>().ok());
        let arg_port = parse_value_arg(args, "--http-port").and_then(|v| v.parse::<u16>().ok());
        cfg.http_port = arg_port.or(env_port).unwrap_or(DEFAULT_HTTP_PORT);
        Ok(cfg)
    }

    pub fn from_env(args: &[String]) -> Result<Self> {
        Self::from_sources(|k| std::env::var(k).ok(), args)
    }

    /// `{base}/access/ticket`
    pub fn ticket_url(&self) -> String { format!("{}/access/ticket", self.base_url) }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
