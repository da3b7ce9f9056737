//! HTTP server implementation

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::handlers::{
    config_handler, health_handler, key_detail_handler, keys_handler, update_config_handler,
};
use crate::introspection::Introspection;

/// Build the application router
pub fn router(introspection: Arc<Introspection>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/keys", get(keys_handler))
        .route("/keys/:key", get(key_detail_handler))
        .route("/config", get(config_handler).post(update_config_handler))
        .layer(CorsLayer::permissive())
        .with_state(introspection)
}

/// Run the web server until it fails
pub async fn run_web_server(addr: &str, introspection: Arc<Introspection>) -> anyhow::Result<()> {
    let app = router(introspection);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Web interface available at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
