use anyhow::Context;
use ferrumlink::{web, ConnectionRegistry, Dispatcher, Introspection, ServerIdentity};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const CONFIG_ENV: &str = "FERRUMLINK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "ferrumlink.json";

/// Startup configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
struct AppConfig {
    /// Address the admin web interface listens on
    web_addr: String,
    server: ServerIdentity,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            web_addr: "127.0.0.1:8080".to_string(),
            server: ServerIdentity::default().with_admin(true),
        }
    }
}

impl AppConfig {
    fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!("No configuration at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("ferrumlink starting...");

    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(Path::new(&path))?;
    info!(
        "Backing server {}:{} db {} (admin {})",
        config.server.host, config.server.port, config.server.database, config.server.allow_admin
    );

    let registry = Arc::new(ConnectionRegistry::tcp());
    let dispatcher = Dispatcher::new(registry, config.server);
    let introspection = Arc::new(Introspection::new(dispatcher));

    web::run_web_server(&config.web_addr, introspection).await
}
