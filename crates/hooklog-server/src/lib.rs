pub mod auth;
pub mod dirs;
pub mod handlers;
pub mod payload;
pub mod server;
pub mod store;

use std::sync::Arc;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn store::PayloadStore>,
    /// Loaded once at startup; never mutated.
    pub secret: auth::WebhookSecret,
}

pub use server::{resolve_data_dir, router, run, ServerConfig, DB_FILE, WEBHOOK_PATH};
