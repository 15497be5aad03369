use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shared_config::AppConfig;
use shared_gateway::{BackendClient, FileSessionStore, Session};

mod commands;

use commands::Command;

const DEFAULT_SESSION_FILE: &str = ".aligner-session.json";

/// Front desk for the aligner practice backend.
#[derive(Parser, Debug)]
#[command(name = "aligner-desk", version)]
struct Cli {
    /// Session file; overrides DENTAL_SESSION_FILE
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let session_path = cli
        .session_file
        .or_else(|| config.session_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
    let store = FileSessionStore::open(&session_path)?;
    let session = Arc::new(Session::init(Arc::new(store)));

    info!("Using backend {} (session {})", config.api_base_url, session_path.display());

    let client = Arc::new(BackendClient::new(&config, session)?);
    commands::run(cli.command, client, &config).await
}
