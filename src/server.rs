//! HTTP transport for the intent engine
//!
//! Thin routing layer over [`IntentEngine`]: it derives the hashed client
//! identity from the `x-user-id` header (falling back to the connection
//! address), delegates to the engine, and maps engine errors onto HTTP
//! status codes. No pipeline logic lives here.

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::engine::SharedIntentEngine;
use crate::error::EngineError;
use crate::identity::hashed_client_id;
use crate::metrics::MetricsSnapshot;
use crate::types::{ClarifyResponse, DetectionResult, Resolution};

#[derive(Clone)]
struct AppState {
    engine: SharedIntentEngine,
    salt: Arc<str>,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct ClarifyRequest {
    pub query: String,
    #[serde(default)]
    pub factors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub query: String,
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct MemorySetRequest {
    #[serde(default)]
    pub prefs: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    pub prefs: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsentResponse {
    pub accepted: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Rate-limit exhaustion, invalid input, and storage unavailability are
/// distinct signals so callers can decide whether to retry.
fn into_api_error(err: EngineError) -> ApiError {
    let (status, error) = match &err {
        EngineError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded"),
        EngineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid input"),
        EngineError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable"),
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details: Some(err.to_string()),
        }),
    )
}

fn client_id(state: &AppState, addr: &SocketAddr, headers: &HeaderMap) -> String {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| addr.ip().to_string());
    hashed_client_id(&raw, &state.salt)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "clarion".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn detect_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<DetectRequest>,
) -> Result<Json<DetectionResult>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .detect(&client, &req.query)
        .map(Json)
        .map_err(into_api_error)
}

async fn clarify_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ClarifyRequest>,
) -> Result<Json<ClarifyResponse>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .clarify(&client, &req.query, &req.factors)
        .map(Json)
        .map_err(into_api_error)
}

async fn resolve_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<Resolution>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .resolve(&client, &req.query, &req.answers)
        .await
        .map(Json)
        .map_err(into_api_error)
}

async fn answer_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<Resolution>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .answer(&client, &req.query, &req.answers)
        .await
        .map(Json)
        .map_err(into_api_error)
}

async fn get_memory_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<MemoryResponse>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .get_memory(&client)
        .await
        .map(|prefs| Json(MemoryResponse { prefs }))
        .map_err(into_api_error)
}

async fn set_memory_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<MemorySetRequest>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .set_memory(&client, &req.prefs)
        .await
        .map(|prefs| Json(MemoryResponse { prefs }))
        .map_err(into_api_error)
}

async fn clear_memory_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<ClearResponse>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .clear_memory(&client)
        .await
        .map(|_| {
            Json(ClearResponse {
                status: "cleared".to_string(),
            })
        })
        .map_err(into_api_error)
}

async fn get_consent_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<ConsentResponse>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .get_consent(&client)
        .await
        .map(|accepted| Json(ConsentResponse { accepted }))
        .map_err(into_api_error)
}

async fn set_consent_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ConsentRequest>,
) -> Result<Json<ConsentResponse>, ApiError> {
    let client = client_id(&state, &addr, &headers);
    state
        .engine
        .set_consent(&client, req.accepted)
        .await
        .map(|accepted| Json(ConsentResponse { accepted }))
        .map_err(into_api_error)
}

async fn stats_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.engine.metrics_snapshot())
}

/// Create and configure the HTTP router
pub fn create_router(engine: SharedIntentEngine, salt: &str) -> Router {
    let state = AppState {
        engine,
        salt: Arc::from(salt),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/detect", post(detect_handler))
        .route("/v1/clarify", post(clarify_handler))
        .route("/v1/resolve", post(resolve_handler))
        .route("/v1/answer", post(answer_handler))
        .route(
            "/v1/memory",
            get(get_memory_handler)
                .post(set_memory_handler)
                .delete(clear_memory_handler),
        )
        .route(
            "/v1/consent",
            get(get_consent_handler).post(set_consent_handler),
        )
        .route("/v1/stats", get(stats_handler))
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(engine: SharedIntentEngine, salt: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting clarion server on {}", addr);

    let app = create_router(engine, salt);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
