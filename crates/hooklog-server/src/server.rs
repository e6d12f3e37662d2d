use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    auth::{require_webhook_secret, WebhookSecret},
    handlers::{health, receive_webhook},
    store::Store,
    AppState,
};

/// Route the webhook endpoint is mounted at (`/api` prefix + `/webhook`).
pub const WEBHOOK_PATH: &str = "/api/webhook";

/// Database file name inside the data directory.
pub const DB_FILE: &str = "hooklog.db";

pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub webhook_secret: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOOKLOG_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("HOOKLOG_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            webhook_secret: std::env::var("HOOKLOG_WEBHOOK_SECRET").ok(),
            data_dir: std::env::var("HOOKLOG_DATA_DIR").ok().map(PathBuf::from),
            max_body_bytes: std::env::var("HOOKLOG_MAX_BODY_BYTES")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        }
    }
}

/// Use `explicit` when given (creating it if needed), else the platform data dir.
pub fn resolve_data_dir(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(d) => {
            std::fs::create_dir_all(d).context("create data dir")?;
            Ok(d.clone())
        }
        None => crate::dirs::data_dir(),
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let webhook = Router::new()
        .route(WEBHOOK_PATH, post(receive_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_webhook_secret,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(webhook)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    let data_dir = resolve_data_dir(cfg.data_dir.as_ref())?;
    info!(data_dir = %data_dir.display(), "using data directory");

    let store = Store::open(&data_dir.join(DB_FILE)).context("open store")?;

    let secret = WebhookSecret::new(cfg.webhook_secret);
    if !secret.is_configured() {
        warn!("HOOKLOG_WEBHOOK_SECRET is not set; every webhook request will be rejected");
    }

    let state = AppState {
        store: Arc::new(store),
        secret,
    };

    let app = router(state, cfg.max_body_bytes);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, path = WEBHOOK_PATH, "hooklog server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("hooklog server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
