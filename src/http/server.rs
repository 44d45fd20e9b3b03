//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Dispatch requests to the rule router
//! - Forward matched requests, fall back for the rest
//! - Run the optional admin API next to the proxy listener

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::ProxyConfig;
use crate::http::forward::Forwarder;
use crate::http::request::{MakeRequestUuidV4, RequestIdExt};
use crate::observability::metrics;
use crate::routing::{Router as ProxyRouter, RuleError};

/// Error building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub forwarder: Arc<Forwarder>,
    pub static_files: Option<ServeDir>,
}

/// HTTP server for the dev proxy.
pub struct HttpServer {
    router: Router,
    admin: Option<Router>,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let proxy_router = Arc::new(ProxyRouter::from_config(&config.rules)?);
        let forwarder = Arc::new(Forwarder::from_config(&config)?);

        let state = AppState {
            router: proxy_router.clone(),
            forwarder,
            static_files: config.fallback.static_dir.as_ref().map(ServeDir::new),
        };

        let admin = config.admin.enabled.then(|| {
            setup_admin_router(AdminState::new(proxy_router, config.admin.api_key.clone()))
        });

        Ok(Self {
            router: Self::build_router(state),
            admin,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request.request_id(),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The proxy router, without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The admin router, if the admin API is enabled.
    pub fn admin_router(&self) -> Option<Router> {
        self.admin.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.config.rules.len(),
            "HTTP server starting"
        );

        if let Some(admin) = self.admin {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                let served = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API stopped");
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Looks up the rule and forwards, or falls back when none matches.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_owned();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let Some(rule) = state.router.match_path(&path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No rule matched");
        let response = fallback(&state, request).await;
        metrics::record_request(method.as_str(), response.status().as_u16(), metrics::NO_RULE, start_time);
        return response;
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        rule = %rule.name(),
        "Proxying request"
    );

    let response = match state.forwarder.forward(rule, request, client_addr).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                rule = %rule.name(),
                error = %e,
                "Forwarding failed"
            );
            metrics::record_upstream_error(rule.name(), e.kind());
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), rule.name(), start_time);
    response
}

/// Serve unmatched requests from the static directory, or 404.
async fn fallback(state: &AppState, request: Request<Body>) -> Response {
    match &state.static_files {
        Some(files) => match files.clone().oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        },
        None => (StatusCode::NOT_FOUND, "No matching rule").into_response(),
    }
}
