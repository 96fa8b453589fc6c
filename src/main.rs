//!
//! proxgate binary
//! ---------------
//! Starts the HTTP facade. Configuration comes from environment variables,
//! with a few CLI flags taking precedence.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use proxgate::config::{has_flag, GatewayConfig};

const USAGE: &str = "proxgate\n\nUSAGE:\n  proxgate [--http-port N] [--proxmox-host URL] [--insecure]\n\nOPTIONS:\n  --http-port N         HTTP port (env: PROXGATE_HTTP_PORT, default 8000)\n  --proxmox-host URL    Proxmox API base, e.g. https://pve:8006/api2/json (env: PROXMOX_HOST)\n  --insecure            Skip TLS certificate verification (env: PROXMOX_VERIFY_SSL=false)\n\nCREDENTIALS:\n  PROXMOX_USERNAME, and PROXMOX_PASSWORD or PROXMOX_PASSWORD_FILE\n";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let cfg = GatewayConfig::from_env(&args)?;
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "proxgate", "proxgate starting: RUST_LOG='{}', config={:?}", rust_log, cfg);

    proxgate::server::run_with_config(cfg).await
}
