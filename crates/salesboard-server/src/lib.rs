//! Salesboard dashboard server.
//!
//! Serves the filter-and-aggregate pipeline over HTTP and WebSocket.
//!
//! # Architecture
//!
//! The server consists of:
//! - **Session**: One upload's dataset, filter selection and theme
//! - **Protocol**: Client/server message types
//! - **Routes**: HTTP and WebSocket handlers

pub mod error;
pub mod protocol;
pub mod routes;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use salesboard_core::{DashboardConfig, LoadOptions};

pub use error::{ServerError, ServerResult};
pub use protocol::{ClientMessage, FilterUpdate, ServerMessage, SessionState, Theme};
pub use routes::{AppState, DEFAULT_MAX_UPLOAD_BYTES, create_router};
pub use session::{DashboardSession, SessionHandle, SessionStore};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// How uploads are parsed.
    pub load_options: LoadOptions,
    /// Sizes of ranked and sampled views.
    pub dashboard: DashboardConfig,
    /// Largest accepted upload body.
    pub max_upload_bytes: usize,
    /// Sessions without WebSocket clients are dropped after this long unused.
    pub session_idle_timeout: Duration,
}

/// How often idle sessions are swept.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            load_options: LoadOptions::default(),
            dashboard: DashboardConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl ServerConfig {
    /// Socket address from `host` and `port`.
    pub fn addr(&self) -> ServerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Start the Salesboard server.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    let addr = config.addr()?;
    let state = Arc::new(
        AppState::new(config.load_options, config.dashboard)
            .with_max_upload_bytes(config.max_upload_bytes),
    );
    let app = create_router(state.clone());
    let eviction_task = tokio::spawn(evict_idle_sessions(state, config.session_idle_timeout));

    tracing::info!("Starting Salesboard server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    // Handle Ctrl+C for graceful shutdown
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;

    eviction_task.abort();
    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn evict_idle_sessions(state: Arc<AppState>, max_idle: Duration) {
    let mut interval = tokio::time::interval(EVICTION_INTERVAL);
    loop {
        interval.tick().await;
        state.sessions.evict_idle(max_idle).await;
    }
}
