use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use medibot::core::config::{AppPaths, ConfigService};
use medibot::core::logging;
use medibot::session::terminal;
use medibot::state::AppState;

#[derive(Parser)]
#[command(name = "medibot")]
#[command(author, version, about = "Retrieval-augmented medical question answering", long_about = None)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve {
        /// Bind address, defaults to `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Listen port, defaults to $PORT then `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Interactive chat session in the terminal
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    let mut config = ConfigService::new(paths.clone());
    if let Some(path) = cli.config {
        config = config.with_config_path(path);
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });
    let console = matches!(command, Commands::Serve { .. });
    logging::init(&paths, console, cli.verbose);
    tracing::info!("Using config {}", config.config_path().display());

    let state = AppState::initialize(&config).await?;

    match command {
        Commands::Serve { host, port } => serve(state, host, port).await,
        Commands::Chat => terminal::run(state).await,
    }
}

async fn serve(state: Arc<AppState>, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.settings.server.host.clone());
    let port = port
        .or_else(|| env::var("PORT").ok().and_then(|val| val.parse::<u16>().ok()))
        .unwrap_or(state.settings.server.port);
    let bind_addr = format!("{}:{}", host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = medibot::server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
