use tokio::net::TcpListener;
use tracing::info;

use depot_store::Driver;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::router::build_router;
use crate::state::AppState;

/// Depot registry server.
pub struct DepotServer {
    state: AppState,
}

impl DepotServer {
    /// Build the storage driver named by the configuration.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let driver = Driver::from_config(&config.backend)?;
        Ok(Self::with_driver(driver, config))
    }

    pub fn with_driver(driver: Driver, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(driver, config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        self.state.config()
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until SIGINT or SIGTERM, then drain in-flight requests.
    pub async fn serve(self) -> ServerResult<()> {
        let addr = self.config().bind_addr;
        let app = self.router();
        let listener = TcpListener::bind(addr).await?;
        info!(
            addr = %listener.local_addr()?,
            backend = self.state.driver().backend().kind(),
            "depot server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("depot server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
