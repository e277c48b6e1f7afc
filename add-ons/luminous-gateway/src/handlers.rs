//! `/api/v1` routes for the dashboard shell.
//!
//! POST /api/v1/interact relays a user directive (409 while one is in flight).
//! POST /api/v1/document ingests a plain-text document as a system event.
//! POST /api/v1/sleep and /wake are the dormancy controls.
//! GET /api/v1/status returns state, emotion, heartbeat, and sync backlog.
//! GET /api/v1/gems, /console, /console/stream (SSE) feed the widgets.
//! POST /api/v1/memory/search queries long-term memory.
//! GET|POST /api/v1/settings read (secrets masked) and persist configuration.

use crate::{target_label, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use futures_util::stream::{Stream, StreamExt};
use luminous_core::{
    build_document_directive, validate_document, EngineError, GemType, LogKind, LuminousConfig,
};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/interact", post(interact_post))
        .route("/api/v1/document", post(document_post))
        .route("/api/v1/sleep", post(sleep_post))
        .route("/api/v1/wake", post(wake_post))
        .route("/api/v1/status", get(status_get))
        .route("/api/v1/gems", get(gems_get))
        .route("/api/v1/console", get(console_get))
        .route("/api/v1/console/stream", get(console_stream_get))
        .route("/api/v1/memory/search", post(memory_search_post))
        .route("/api/v1/settings", get(settings_get).post(settings_post))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct InteractRequest {
    pub input: String,
}

/// POST /api/v1/interact: one interactive cycle. The in-flight guard turns
/// concurrent sends into 409; the engine itself never surfaces a transport
/// failure, so a reachable gateway always answers 200 with a cycle result.
async fn interact_post(
    State(state): State<AppState>,
    Json(body): Json<InteractRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let input = body.input.trim();
    if input.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Directive is empty." })),
        );
    }
    match state.engine.handle_interaction(input, false).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::to_value(&result).unwrap_or_default()),
        ),
        Err(EngineError::Busy) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "A directive is already being processed." })),
        ),
    }
}

#[derive(Deserialize)]
pub struct DocumentRequest {
    pub file_name: String,
    pub content: String,
}

/// POST /api/v1/document: assimilate an already-text document as a system
/// event (bypasses the interactive guard).
async fn document_post(
    State(state): State<AppState>,
    Json(body): Json<DocumentRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.console.push(
        "System",
        format!("Reading document: {}...", body.file_name),
        LogKind::System,
    );
    if let Err(e) = validate_document(&body.file_name, &body.content) {
        state
            .console
            .push("System", e.console_message(), LogKind::Error);
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        );
    }

    state
        .gems
        .set_activity(GemType::Learner, "Digesting Document", 90);
    state.console.push(
        "System",
        format!(
            "Document read successfully ({} chars). Assimilating...",
            body.content.chars().count()
        ),
        LogKind::Success,
    );

    let directive = build_document_directive(&body.file_name, &body.content);
    match state.engine.handle_interaction(&directive, true).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::to_value(&result).unwrap_or_default()),
        ),
        Err(EngineError::Busy) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "A directive is already being processed." })),
        ),
    }
}

/// POST /api/v1/sleep: force the dormant state locally.
async fn sleep_post(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.engine.force_sleep();
    Json(serde_json::json!({ "state": state.engine.state() }))
}

/// POST /api/v1/wake: interactive "WAKE UP" directive.
async fn wake_post(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.engine.handle_interaction("WAKE UP", false).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::to_value(&result).unwrap_or_default()),
        ),
        Err(EngineError::Busy) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "A directive is already being processed." })),
        ),
    }
}

/// GET /api/v1/status: everything the header and heartbeat render.
async fn status_get(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "state": state.engine.state(),
        "emotional_state": state.engine.emotional_state(),
        "heart_rate": state.engine.heart_rate(),
        "processing": state.engine.is_processing(),
        "uptime_secs": state.clock.uptime_secs(),
        "clock": Local::now().format("%H:%M:%S").to_string(),
        "pending_sync": state.sync.buffer().pending_len(),
        "backend_target": state.engine.backend_target(),
        "backend_label": target_label(state.engine.backend_target()),
        "generated_code": state.engine.generated_code(),
    }))
}

/// GET /api/v1/gems: the constellation in display order.
async fn gems_get(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "gems": state.gems.snapshot() }))
}

/// GET /api/v1/console: ring contents, oldest first.
async fn console_get(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "entries": state.console.recent() }))
}

/// GET /api/v1/console/stream: live console feed. Lagged subscribers skip
/// dropped entries rather than erroring out.
async fn console_stream_get(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.console.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|entry| async move {
        match entry {
            Ok(entry) => Event::default().event("log").json_data(&entry).ok().map(Ok),
            Err(_) => None,
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Deserialize)]
pub struct MemorySearchRequest {
    pub query: String,
}

/// POST /api/v1/memory/search: semantic search over the agent's long-term
/// memory. Failures come back as an empty result set, like every other
/// memory-side fault.
async fn memory_search_post(
    State(state): State<AppState>,
    Json(body): Json<MemorySearchRequest>,
) -> Json<serde_json::Value> {
    let results = match state.client.search_long_term(body.query.trim()).await {
        Ok(results) => results,
        Err(e) => {
            warn!(target: "luminous::gateway", "long-term search failed: {}", e);
            Vec::new()
        }
    };
    Json(serde_json::json!({ "results": results }))
}

fn mask(secret: &Option<String>) -> Option<&'static str> {
    secret
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|_| "••••••••")
}

/// GET /api/v1/settings: user configuration with secrets masked.
async fn settings_get(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = LuminousConfig::load_from_path(&state.user_config_path).unwrap_or_default();
    Json(serde_json::json!({
        "backend_url": config.backend_url,
        "gemini_api_key": mask(&config.gemini_api_key),
        "shopify": {
            "shop_url": config.shopify.shop_url,
            "admin_token": mask(&config.shopify.admin_token),
        },
        "firebase": {
            "api_key": mask(&config.firebase.api_key),
            "database_url": config.firebase.database_url,
            "project_id": config.firebase.project_id,
            "app_id": config.firebase.app_id,
        },
    }))
}

/// POST /api/v1/settings: persist the user configuration. The new backend
/// target applies on the next start, like the reference shell's reload.
async fn settings_post(
    State(state): State<AppState>,
    Json(config): Json<LuminousConfig>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(e) = config.save_to_path(&state.user_config_path) {
        warn!(target: "luminous::gateway", "settings save failed: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        );
    }
    state.console.push(
        "System",
        "Configuration saved. Restart to apply the new backend target.",
        LogKind::Success,
    );
    (StatusCode::OK, Json(serde_json::json!({ "saved": true })))
}
