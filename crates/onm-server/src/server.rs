use tokio::net::TcpListener;

use onm_registry::ModelRegistry;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// onm data store host.
pub struct OnmServer {
    config: ServerConfig,
    state: AppState,
}

impl OnmServer {
    pub fn new(config: ServerConfig, models: ModelRegistry) -> Self {
        Self {
            config,
            state: AppState::new(models),
        }
    }

    /// Load every model declaration in `config.models_dir`.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let models = ModelRegistry::load_dir(&config.models_dir)?;
        Ok(Self::new(config, models))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        if self.config.enable_bulk_delete {
            tracing::warn!("bulk store deletion is enabled; any client can drop every store");
        }
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("onm server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
