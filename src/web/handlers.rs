//! HTTP handlers for the web interface

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::commands::Response;
use crate::introspection::{Introspection, PagingQuery};

/// Shared application state
pub type AppState = Arc<Introspection>;

/// Canonical response as JSON; failures answer 502 since the fault is upstream
fn reply<T: Serialize>(response: Response<T>) -> (StatusCode, Json<Response<T>>) {
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(response))
}

/// PING the backing server
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    reply(state.health().await)
}

/// One page of keys
pub async fn keys_handler(State(state): State<AppState>, Query(query): Query<PagingQuery>) -> impl IntoResponse {
    debug!("Listing keys: {:?}", query);
    reply(state.list_keys(&query).await)
}

pub async fn key_detail_handler(State(state): State<AppState>, Path(key): Path<String>) -> impl IntoResponse {
    let response = state.key_detail(&key).await;
    if response.message.as_deref() == Some("key not found") {
        return (StatusCode::NOT_FOUND, Json(response));
    }
    reply(response)
}

pub async fn config_handler(State(state): State<AppState>) -> impl IntoResponse {
    reply(state.config_get().await)
}

/// Apply the settings named in the body; omitted settings keep their live values
pub async fn update_config_handler(
    State(state): State<AppState>,
    Json(patch): Json<serde_json::Value>,
) -> impl IntoResponse {
    reply(state.config_patch(patch).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{MockConnection, MockConnector};
    use crate::dispatch::Dispatcher;
    use crate::protocol::RespValue;
    use crate::registry::{ConnectionRegistry, ServerIdentity};
    use axum::body::to_bytes;
    use axum::response::Response as HttpResponse;

    fn state(handler: impl Fn(&[String]) -> RespValue + Send + Sync + 'static) -> AppState {
        let connector = MockConnector::new(MockConnection::new(handler));
        let registry = Arc::new(ConnectionRegistry::new(Arc::new(connector)));
        let identity = ServerIdentity::new("cache", 6379).with_admin(true);
        Arc::new(Introspection::new(Dispatcher::new(registry, identity)))
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health_handler(State(state(|_| RespValue::simple_string("PONG"))))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["payload"], "PONG");
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let response = key_detail_handler(
            State(state(|_| RespValue::simple_string("none"))),
            Path("ghost".to_string()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "key not found");
    }

    #[tokio::test]
    async fn test_config_update_lists_applied_settings() {
        let state = state(|args| match args[1].as_str() {
            "GET" => RespValue::array(
                ["hz", "10", "maxclients", "100"]
                    .iter()
                    .map(|s| RespValue::bulk_string(s.to_string()))
                    .collect(),
            ),
            _ => RespValue::simple_string("OK"),
        });

        let response = update_config_handler(State(state), Json(serde_json::json!({ "maxclients": 500 })))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["payload"], serde_json::json!(["maxclients"]));
    }

    #[tokio::test]
    async fn test_backend_fault_is_bad_gateway() {
        let response = config_handler(State(state(|_| RespValue::error("ERR unknown command"))))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["success"], false);
    }
}
