//! Component H: the process entry point. Parses CLI args, loads config,
//! installs logging, and runs the server until `ctrl_c`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use matchmaker_core::clock::SystemClock;
use matchmaker_core::config::Config;
use matchmaker_core::server::{Server, ServerData};

/// A match-making rendezvous server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a TOML config file. Defaults to built-in settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `listen_port` from the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Log level: error, warn, info, debug, or trace.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.listen_port = port;
    }

    let shutdown = CancellationToken::new();
    let server_data = Arc::new(ServerData::new(config, Box::new(SystemClock)));
    let server = Server::bind(server_data, shutdown.clone()).await?;

    info!(addr = %server.local_addr()?, "listening");

    let ctrl_c = {
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received ctrl_c, shutting down");
                shutdown.cancel();
            }
        }
    };

    tokio::select! {
        _ = server.run() => {}
        _ = ctrl_c => {}
    }

    if !shutdown.is_cancelled() {
        error!("accept loop stopped unexpectedly");
    }

    Ok(())
}
