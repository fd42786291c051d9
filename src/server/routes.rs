//! HTTP routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::gate::Privilege;
use crate::hub::BroadcastHub;
use crate::server::auth::Caller;
use crate::server::error::ApiError;
use crate::server::shutdown::ShutdownManager;
use crate::server::ws;
use crate::supervisor::{Diagnostics, StatusSnapshot};

#[derive(Clone)]
pub struct AppState {
    pub hub: BroadcastHub,
    pub shutdown: Arc<ShutdownManager>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/diagnostics", get(diagnostics))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .route("/api/command", post(command))
        .route("/api/ws", get(ws::observe))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub message: String,
    #[serde(rename = "processId")]
    pub pid: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CommandBody {
    pub command: String,
}

/// GET /api/health - Liveness of the panel itself, not the game server.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "mcpanel",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/status
async fn status(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<StatusSnapshot>, ApiError> {
    state.hub.gate().authorize(&caller, Privilege::Observe)?;
    Ok(Json(state.hub.supervisor().status()))
}

/// GET /api/diagnostics
async fn diagnostics(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Diagnostics>, ApiError> {
    state.hub.gate().authorize(&caller, Privilege::Observe)?;
    Ok(Json(state.hub.supervisor().diagnostics()))
}

/// POST /api/start
async fn start(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<StartResponse>, ApiError> {
    state.hub.gate().authorize(&caller, Privilege::Control)?;
    let pid = state.hub.supervisor().spawn()?;
    tracing::info!(caller = %caller.name, "Start requested");
    Ok(Json(StartResponse {
        message: "Server starting".to_string(),
        pid,
    }))
}

/// POST /api/stop
async fn stop(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<MessageResponse>, ApiError> {
    state.hub.gate().authorize(&caller, Privilege::Control)?;
    state.hub.supervisor().terminate()?;
    tracing::info!(caller = %caller.name, "Stop requested");
    Ok(Json(MessageResponse {
        message: "Stop command sent".to_string(),
    }))
}

/// POST /api/command - `{"command": "say hi"}`
async fn command(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<CommandBody>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    state.hub.submit_command(&caller, &body.command)?;
    Ok(Json(MessageResponse {
        message: "Command sent".to_string(),
    }))
}
