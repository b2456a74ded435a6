//! Andesite - Minecraft-style protocol server.
//!
//! Command-line entry point: loads the YAML configuration, sets up logging,
//! and runs the accept loop.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use andesite_server::{handle_connection, spawn_keepalive_ticker, ServerConfig, ServerContext};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config_path: PathBuf,

    /// Overrides the configured bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_config(path: &PathBuf) -> Result<ServerConfig, serde_yml::Error> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yml::from_str(&contents),
        Err(e) => {
            warn!(path = %path.display(), "config file unreadable ({e}), using defaults");
            Ok(ServerConfig::default())
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .init();

    let mut config = match load_config(&args.config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse configuration: {}", e);
            process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    info!(bind = %config.bind, online_mode = config.online_mode, "starting andesite");

    if let Err(e) = run(config).await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}

async fn run(config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.bind).await?;
    let keep_alive = Duration::from_secs(config.keep_alive_interval_secs);
    let ctx = Arc::new(ServerContext::new(config));
    spawn_keepalive_ticker(ctx.sessions.clone(), keep_alive);

    loop {
        let (stream, peer) = listener.accept().await?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%peer, "set_nodelay failed: {}", e);
        }
        info!(%peer, "connection accepted");

        let ctx = ctx.clone();
        tokio::spawn(async move {
            match handle_connection(stream, peer, ctx).await {
                Ok(()) => info!(%peer, "connection closed"),
                Err(e) => warn!(%peer, "connection ended: {}", e),
            }
        });
    }
}
