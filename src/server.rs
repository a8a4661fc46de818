//! Component G: server root. Owns the directories and the listening socket;
//! orchestrates the accept loop and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::clock::Clock;
use crate::config::Config;
use crate::connection::handle_connection;
use crate::directory::RoomDirectory;

/// Process-wide, immutable-after-construction state shared by every session
/// task via `Arc` (§9's "global mutable state" note).
pub struct ServerData {
    pub config: Config,
    pub directories: Vec<RoomDirectory>,
    pub clock: Box<dyn Clock>,
}

impl ServerData {
    pub fn new(config: Config, clock: Box<dyn Clock>) -> Self {
        let directories = config
            .groups
            .iter()
            .map(|group| RoomDirectory::new(group.max_rooms))
            .collect();
        Self {
            config,
            directories,
            clock,
        }
    }

    pub fn directory(&self, group_index: u8) -> Option<&RoomDirectory> {
        self.directories.get(group_index as usize)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.config.session_timeout_seconds)
    }
}

/// The running server: a bound listener plus the shared data every session
/// task borrows.
pub struct Server {
    data: Arc<ServerData>,
    listener: TcpListener,
    connection_limit: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl Server {
    pub async fn bind(data: Arc<ServerData>, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let addr = (data.config.listen_ip, data.config.listen_port);
        let listener = TcpListener::bind(addr).await?;
        let connection_limit = Arc::new(Semaphore::new(data.config.max_concurrent_sessions));
        Ok(Self {
            data,
            listener,
            connection_limit,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until `shutdown` fires, spawning one task per
    /// accepted connection and gating concurrency with `connection_limit`
    /// (the `tokio::sync::Semaphore`-gated accept loop from §4.F).
    pub async fn run(self) {
        loop {
            let permit = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                permit = self.connection_limit.clone().acquire_owned() => permit,
            };
            let Ok(permit) = permit else { break };

            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer_addr)) => {
                    let data = self.data.clone();
                    let shutdown = self.shutdown.clone();
                    info!(%peer_addr, "accepted connection");
                    tokio::spawn(async move {
                        handle_connection(data, stream, peer_addr, shutdown).await;
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!("failed to accept incoming connection: {e}");
                    drop(permit);
                }
            }
        }

        info!("accept loop stopped, waiting for in-flight sessions to finish");
    }
}
