//! Khata API server binary
//!
//! Usage:
//!   khata-server --db khata.db --port 3001
//!   khata-server --no-auth        Local development without init-data checks
//!
//! The bot token for init-data validation comes from KHATA_BOT_TOKEN.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use khata_core::db::Database;
use khata_server::ServerConfig;

#[derive(Parser)]
#[command(name = "khata-server", about = "Khata expense tracker API server")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, default_value = "khata.db")]
    db: String,

    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Disable Telegram init-data authentication (local dev only)
    #[arg(long)]
    no_auth: bool,

    /// Allowed CORS origins (comma-separated)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db = Database::new(&cli.db)
        .with_context(|| format!("Failed to open database at {}", cli.db))?;

    let allowed_origins: Vec<String> = cli
        .cors_origins
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let config = ServerConfig {
        require_auth: !cli.no_auth,
        bot_token: std::env::var("KHATA_BOT_TOKEN").ok().filter(|s| !s.is_empty()),
        allowed_origins,
    };

    khata_server::serve(db, &cli.host, cli.port, config).await
}
