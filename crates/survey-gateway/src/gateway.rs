//! Main Gateway implementation
//!
//! Owns the shared request context and the HTTP server lifecycle.

use axum::{
    http::HeaderValue,
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use survey_core::storage::{GcsObjectStore, LocalObjectStore, MemoryObjectStore, TokenSource};
use survey_core::{ObjectStore, ObjectWriter, RecaptchaClient, Verifier};

use crate::config::{GatewayConfig, StorageBackend};
use crate::handler;
use crate::{GatewayError, Result};

/// Gateway state shared across handlers
///
/// Built once before serving and never mutated afterwards.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub verifier: Arc<dyn Verifier>,
    pub writer: ObjectWriter,
    cors_origin: HeaderValue,
    shutdown_tx: watch::Sender<bool>,
}

impl GatewayState {
    /// Build the reCAPTCHA client and storage backend named by `config`
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let verifier = RecaptchaClient::new(config.recaptcha.private_key.clone().unwrap_or_default())
            .with_endpoint(config.recaptcha.verify_url.clone());
        let store = build_store(&config);
        Self::with_components(config, Arc::new(verifier), store)
    }

    /// Assemble a state from ready-made parts
    pub fn with_components(
        config: GatewayConfig,
        verifier: Arc<dyn Verifier>,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self> {
        config.validate()?;

        let cors_origin = HeaderValue::from_str(&config.allowed_origin).map_err(|e| {
            GatewayError::InvalidConfig(format!("allowed origin is not a header value: {}", e))
        })?;
        let writer =
            ObjectWriter::new(store).with_timeout(Duration::from_secs(config.write_timeout_secs));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            verifier,
            writer,
            cors_origin,
            shutdown_tx,
        })
    }

    pub fn cors_origin(&self) -> &HeaderValue {
        &self.cors_origin
    }
}

fn build_store(config: &GatewayConfig) -> Arc<dyn ObjectStore> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Gcs => {
            let store = match &storage.emulator_host {
                Some(host) => GcsObjectStore::emulator(storage.bucket.clone(), host),
                None => GcsObjectStore::new(storage.bucket.clone()),
            };
            let store = match &storage.access_token {
                Some(token) => store.with_token_source(TokenSource::Static(token.clone())),
                None => store,
            };
            Arc::new(store)
        }
        StorageBackend::Local => Arc::new(LocalObjectStore::new(
            storage.local_root.clone(),
            storage.bucket.clone(),
        )),
        StorageBackend::Memory => Arc::new(MemoryObjectStore::new(storage.bucket.clone())),
    }
}

/// Main Gateway
#[derive(Clone)]
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Create a gateway with configuration
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Ok(Self::from_state(GatewayState::new(config)?))
    }

    /// Wrap an already assembled state
    pub fn from_state(state: GatewayState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Get gateway state
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", any(handler::handle_submission))
            .route("/health", get(Self::handle_health))
            // Rejections are logged once by the handler
            .layer(TraceLayer::new_for_http().on_failure(()))
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until shutdown
    pub async fn start(&self) -> Result<()> {
        let addr = self.state.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until [`Gateway::shutdown`]
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.state.shutdown_tx.subscribe();
        let addr = listener.local_addr()?;

        tracing::info!(
            bucket = %self.state.writer.bucket(),
            verification = self.state.config.recaptcha.enabled(),
            "Survey gateway listening on {}",
            addr
        );

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        tracing::info!("Survey gateway stopped");
        Ok(())
    }

    /// Stop accepting connections and let in-flight requests finish
    pub fn shutdown(&self) {
        self.state.shutdown_tx.send_replace(true);
        tracing::info!("Gateway shutdown initiated");
    }

    async fn handle_health() -> impl IntoResponse {
        axum::Json(serde_json::json!({
            "status": "healthy",
            "version": crate::VERSION
        }))
    }
}
