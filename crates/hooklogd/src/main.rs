use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hooklog_server::store::Store;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "hooklogd",
    about = "Hooklogd — receives webhooks and keeps every accepted payload",
    version
)]
struct Cli {
    /// Log level: error, warn, info, debug, verbose (default: $HOOKLOG_LOG_LEVEL or info)
    #[arg(long, global = true, env = "HOOKLOG_LOG_LEVEL", default_value = "info")]
    log_level: String,
    /// Log output format
    #[arg(long, global = true, env = "HOOKLOG_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    /// Directory holding hooklog.db (default: $HOOKLOG_DATA_DIR or the platform data dir)
    #[arg(long, global = true, env = "HOOKLOG_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook HTTP server
    Serve {
        /// Port to listen on (default: $HOOKLOG_PORT or 8080)
        #[arg(long, env = "HOOKLOG_PORT", default_value = "8080")]
        port: u16,
        /// Host to bind (default: $HOOKLOG_HOST or 0.0.0.0)
        #[arg(long, env = "HOOKLOG_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Shared secret expected in the X-Webhook-Secret header
        #[arg(long, env = "HOOKLOG_WEBHOOK_SECRET", hide_env_values = true)]
        webhook_secret: Option<String>,
        /// Largest accepted request body in bytes
        #[arg(long, env = "HOOKLOG_MAX_BODY_BYTES", default_value_t = hooklog_server::server::DEFAULT_MAX_BODY_BYTES)]
        max_body_bytes: usize,
    },
    /// Print the newest stored webhook logs as JSON lines (offline: stop the
    /// server first, the database is locked while it runs).
    Logs {
        /// Number of records to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print one stored webhook log by id (offline).
    Show { id: u64 },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; real env vars still win over it.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Serve {
            port,
            host,
            webhook_secret,
            max_body_bytes,
        } => {
            let cfg = hooklog_server::ServerConfig {
                host,
                port,
                webhook_secret,
                data_dir: cli.data_dir,
                max_body_bytes,
            };
            hooklog_server::run(cfg).await
        }
        Commands::Logs { limit } => cmd_logs(cli.data_dir.as_ref(), limit),
        Commands::Show { id } => cmd_show(cli.data_dir.as_ref(), id),
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let level = if level.eq_ignore_ascii_case("verbose") {
        "debug"
    } else {
        level
    };

    let registry = tracing_subscriber::registry().with(EnvFilter::new(level));
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

fn open_store(data_dir: Option<&PathBuf>) -> Result<Store> {
    let data_dir = hooklog_server::resolve_data_dir(data_dir)?;
    let db_path = data_dir.join(hooklog_server::DB_FILE);
    Store::open(&db_path)
        .with_context(|| format!("open {} — is `hooklogd serve` still running?", db_path.display()))
}

fn cmd_logs(data_dir: Option<&PathBuf>, limit: usize) -> Result<()> {
    let store = open_store(data_dir)?;
    tracing::debug!(limit, total = store.count()?, "listing webhook logs");
    for log in store.list(limit)? {
        println!("{}", serde_json::to_string(&log)?);
    }
    Ok(())
}

fn cmd_show(data_dir: Option<&PathBuf>, id: u64) -> Result<()> {
    let store = open_store(data_dir)?;
    let log = store
        .get(id)?
        .with_context(|| format!("no webhook log with id {id}"))?;
    println!("{}", serde_json::to_string_pretty(&log)?);
    Ok(())
}
