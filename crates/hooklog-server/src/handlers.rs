use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{payload::WebhookPayload, store::StoreError, AppState};

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ── Webhook ───────────────────────────────────────────────────────────────────

/// Runs behind `require_webhook_secret`: by the time this is reached the
/// sender is authorized. Logs the payload, stores it, acknowledges.
pub async fn receive_webhook(
    State(state): State<AppState>,
    WebhookPayload(payload): WebhookPayload,
) -> Response {
    info!(payload = %payload, "Webhook received:");

    match state.store.create(&payload) {
        Ok(log) => {
            debug!(id = log.id, "webhook payload stored");
            Json(json!({"status": "success"})).into_response()
        }
        Err(e) => internal_error(e),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn internal_error(e: StoreError) -> Response {
    tracing::error!(error = %e, "failed to store webhook payload");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal server error"})),
    )
        .into_response()
}
