//! HTTP and WebSocket surface.
//!
//! - `routes.rs` - Control and status endpoints
//! - `ws.rs` - Real-time observer channel
//! - `auth.rs` - Bearer token extraction into an [`Identity`](crate::gate::Identity)
//! - `error.rs` - Error to status code mapping
//! - `shutdown.rs` - Signal handling and shutdown fan-out

mod auth;
mod error;
mod routes;
mod shutdown;
mod ws;

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::hub::BroadcastHub;

pub use auth::Caller;
pub use error::ApiError;
pub use routes::{build_router, AppState};
pub use shutdown::ShutdownManager;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("try_bind() must be called before run()")]
    NotBound,

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct PanelServer {
    pub addr: SocketAddr,
    /// Populated by try_bind(), consumed by run().
    listener: Option<TcpListener>,
    state: AppState,
}

impl PanelServer {
    pub fn new(hub: BroadcastHub) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            listener: None,
            state: AppState {
                hub,
                shutdown: Arc::new(ShutdownManager::new()),
            },
        }
    }

    /// Bind the listener now so the address is known (and held) before
    /// [`run`](Self::run). Port 0 picks a free port.
    pub async fn try_bind(&mut self, addr: SocketAddr) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let actual = listener.local_addr()?;
        self.addr = actual;
        self.listener = Some(listener);
        tracing::info!("Panel bound to {}", actual);
        Ok(actual)
    }

    pub fn shutdown_handle(&self) -> Arc<ShutdownManager> {
        self.state.shutdown.clone()
    }

    /// Serve until the shutdown handle is signalled.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self.listener.ok_or(ServerError::NotBound)?;
        tracing::info!("Serving panel API on {}", self.addr);

        let shutdown = self.state.shutdown.clone();
        let app = build_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait_for_shutdown().await })
            .await?;

        tracing::info!("Panel API stopped");
        Ok(())
    }
}
