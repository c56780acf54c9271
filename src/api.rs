// HTTP surface: the Telegram webhook intake plus health and metrics.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use crate::dispatch::Dispatcher;
use crate::metrics;
use crate::telegram::types::Update;

/// Header Telegram sends when a webhook secret is configured.
const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub webhook_secret: Option<String>,
    pub started_at: DateTime<Utc>,
    pub trail_count: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route("/telegram/webhook", post(webhook))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "trailbot",
        "started_at": state.started_at.to_rfc3339(),
        "trails": state.trail_count,
    }))
}

async fn metrics_text() -> impl IntoResponse {
    metrics::gather_metrics()
}

/// Webhook intake. Always answers quickly; processing happens on the
/// user's queue.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(expected) = &state.webhook_secret {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!(update_id = update.update_id, "webhook secret mismatch");
            return StatusCode::UNAUTHORIZED;
        }
    }
    state.dispatcher.dispatch(update);
    StatusCode::OK
}
