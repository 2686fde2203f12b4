use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use plume_llm::RelayService;
use plume_spellcheck::SpellCheckGate;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers;

/// Shared application state passed to Axum handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub relay: Arc<RelayService>,
    pub gate: Arc<SpellCheckGate>,
    pub api_key_configured: bool,
}

impl AppState {
    pub fn new(relay: RelayService, gate: SpellCheckGate) -> Self {
        Self {
            relay: Arc::new(relay),
            gate: Arc::new(gate),
            api_key_configured: true,
        }
    }

    pub fn with_api_key_configured(mut self, configured: bool) -> Self {
        self.api_key_configured = configured;
        self
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/limits", get(handlers::limits))
        .route("/api/spellcheck", post(handlers::spellcheck))
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start(
    config: ServerConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<ServerHandle, std::io::Error> {
    let api_key_configured = state.api_key_configured;
    let router = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        host = %config.host,
        port = local_addr.port(),
        api_key_configured,
        "plume server started"
    );
    if !api_key_configured {
        tracing::warn!("ANTHROPIC_API_KEY is not set, chat requests will fail with 401");
    }

    let token = shutdown.clone();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "server stopped with error");
        }
        tracing::info!("plume server stopped");
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        shutdown,
        server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub port: u16,
    shutdown: CancellationToken,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Request a graceful shutdown and wait for in-flight requests.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.server.await;
    }

    /// Wait until the server stops on its own token.
    pub async fn wait(self) {
        let _ = self.server.await;
    }
}

#[cfg(test)]
mod tests {
    use plume_llm::MockProvider;
    use plume_spellcheck::GateOptions;

    use super::*;

    fn state() -> AppState {
        AppState::new(
            RelayService::new(Arc::new(MockProvider::default())),
            SpellCheckGate::local(GateOptions::default()),
        )
    }

    #[tokio::test]
    async fn binds_ephemeral_port_and_shuts_down() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        let handle = start(config, state(), CancellationToken::new()).await.unwrap();
        assert_ne!(handle.port, 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn external_token_stops_server() {
        let token = CancellationToken::new();
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        let handle = start(config, state(), token.clone()).await.unwrap();
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle.wait())
            .await
            .unwrap();
    }

    #[test]
    fn api_key_flag() {
        assert!(state().api_key_configured);
        assert!(!state().with_api_key_configured(false).api_key_configured);
    }
}
