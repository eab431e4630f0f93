//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::state::AppState;
use crate::config::AppConfig;
use crate::core::{AuthProvider, HeaderAuthProvider};
use crate::orders::OrderEngine;
use crate::payment::PaymentProvider;
use crate::payment::provider::provider_from_config;
use crate::storage::Storage;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

type CodeSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Builder for creating the HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_storage(Storage::in_memory())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    storage: Option<Storage>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    payment_provider: Option<Arc<dyn PaymentProvider>>,
    code_source: Option<CodeSource>,
    custom_routes: Vec<Router<AppState>>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            storage: None,
            auth_provider: None,
            payment_provider: None,
            code_source: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the storage backend (required)
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replace the default header based identity extraction
    pub fn with_auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    /// Replace the provider built from the payment configuration
    pub fn with_payment_provider(mut self, provider: impl PaymentProvider + 'static) -> Self {
        self.payment_provider = Some(Arc::new(provider));
        self
    }

    /// Replace the random order code generator
    pub fn with_code_source(mut self, codes: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.code_source = Some(Arc::new(codes));
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router<AppState>) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Wire the services without building a router
    pub fn build_state(&mut self) -> Result<AppState> {
        let storage = self
            .storage
            .take()
            .ok_or_else(|| anyhow::anyhow!("Storage is required. Call .with_storage()"))?;

        let auth = self
            .auth_provider
            .take()
            .unwrap_or_else(|| Arc::new(HeaderAuthProvider));
        let payment_provider = match self.payment_provider.take() {
            Some(provider) => provider,
            None => provider_from_config(&self.config.payment)?,
        };

        let mut engine = OrderEngine::new(storage.clone(), self.config.orders.code_attempts);
        if let Some(codes) = self.code_source.take() {
            engine = engine.with_code_source(move || codes());
        }

        Ok(AppState::new(
            self.config.clone(),
            storage,
            auth,
            payment_provider,
            engine,
        ))
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;
        let custom_routes = std::mem::take(&mut self.custom_routes);
        RestExposure::build_router(state, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
