//! HTTP API for a driftkv node
//!
//! The query facade: each route forwards 1:1 to the command actor's
//! get/set/delete operations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::node::DriftNode;

/// API state containing the node
pub type ApiState = Arc<DriftNode>;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Single key-value pair response
#[derive(Serialize)]
pub struct KvResponse {
    pub key: String,
    pub value: String,
}

/// Node status response
#[derive(Serialize)]
pub struct NodeStatusResponse {
    pub name: String,
    pub entries: usize,
    pub peers: usize,
}

/// Create API router
pub fn create_router(state: ApiState) -> Router {
    let mut router = Router::new()
        // Health
        .route("/health", get(health))
        .route("/status", get(status))
        // Key-value
        .route("/kv", get(get_all))
        .route("/kv/:key", get(get_key))
        .route("/kv/:key", post(set_key))
        .route("/kv/:key", delete(delete_key))
        .with_state(state.clone());

    if state.config().api.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Node status
async fn status(State(node): State<ApiState>) -> impl IntoResponse {
    let status = NodeStatusResponse {
        name: node.name().to_string(),
        entries: node.entry_count(),
        peers: node.peer_count(),
    };

    Json(ApiResponse::ok(status))
}

/// Read all visible key-value pairs
async fn get_all(State(node): State<ApiState>) -> impl IntoResponse {
    let all: BTreeMap<String, String> = node.get_all();
    Json(ApiResponse::ok(all))
}

/// Read one key
async fn get_key(State(node): State<ApiState>, Path(key): Path<String>) -> impl IntoResponse {
    match node.get(&key) {
        Some(value) => (
            StatusCode::OK,
            Json(ApiResponse::ok(KvResponse { key, value })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<KvResponse>::err("key not found")),
        ),
    }
}

/// Write one key; the request body is the value
async fn set_key(
    State(node): State<ApiState>,
    Path(key): Path<String>,
    body: String,
) -> impl IntoResponse {
    match node.set(&key, &body).await {
        Ok(value) => (
            StatusCode::OK,
            Json(ApiResponse::ok(KvResponse { key, value })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<KvResponse>::err(e)),
        ),
    }
}

/// Delete one key
async fn delete_key(State(node): State<ApiState>, Path(key): Path<String>) -> impl IntoResponse {
    match node.delete(&key).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(key))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<String>::err(e)),
        ),
    }
}

/// Start API server
pub async fn start_api_server(node: ApiState, listen_addr: &str) -> anyhow::Result<()> {
    let router = create_router(node);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {listen_addr}");

    axum::serve(listener, router).await?;

    Ok(())
}
