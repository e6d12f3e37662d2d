use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use constant_time_eq::constant_time_eq;
use http::HeaderName;
use serde_json::json;
use tracing::debug;

use crate::AppState;

/// Header carrying the shared secret on every webhook delivery.
pub static WEBHOOK_SECRET_HEADER: HeaderName = HeaderName::from_static("x-webhook-secret");

/// Shared secret configured for the webhook endpoint.
///
/// Empty or whitespace-only values count as unset, and an unset secret
/// matches nothing: a missing header never passes as "empty equals empty".
#[derive(Clone, Default)]
pub struct WebhookSecret(Option<Arc<str>>);

impl WebhookSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self(
            secret
                .filter(|s| !s.trim().is_empty())
                .map(Arc::from),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// True iff a secret is configured and `provided` equals it byte for byte.
    pub fn verify(&self, provided: Option<&[u8]>) -> bool {
        match (&self.0, provided) {
            (Some(expected), Some(provided)) => constant_time_eq(provided, expected.as_bytes()),
            _ => false,
        }
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.is_configured() { "<redacted>" } else { "<unset>" };
        f.debug_tuple("WebhookSecret").field(&shown).finish()
    }
}

/// Axum middleware that rejects any request whose `X-Webhook-Secret` header
/// does not match the configured secret. The body is never read on rejection.
pub async fn require_webhook_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(&WEBHOOK_SECRET_HEADER)
        .map(|v| v.as_bytes());
    let header_present = provided.is_some();

    if state.secret.verify(provided) {
        return next.run(request).await;
    }

    debug!(header_present, "webhook rejected: secret mismatch");
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": "Unauthorized"})),
    )
        .into_response()
}
