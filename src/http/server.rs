//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all edge handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Buffer request bodies and hand requests to the pipeline
//! - Serve the optional admin API on its own listener
//! - Drain background store writes on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::EdgeConfig;
use crate::http::request::{request_id, request_id_header, MakeEdgeRequestId};
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::lifecycle::{build_pipeline, StartupError};
use crate::observability::metrics;
use crate::pipeline::Pipeline;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub max_body_bytes: usize,
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
    pipeline: Arc<Pipeline>,
}

impl HttpServer {
    /// Create a server with stores and origin built from `config`.
    pub fn new(config: EdgeConfig) -> Result<Self, StartupError> {
        let pipeline = Arc::new(build_pipeline(&config)?);
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an already built pipeline.
    pub fn with_pipeline(config: EdgeConfig, pipeline: Arc<Pipeline>) -> Self {
        let state = AppState {
            pipeline: pipeline.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);

        Self {
            router,
            config,
            pipeline,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        let x_request_id = request_id_header();

        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeEdgeRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(PropagateRequestIdLayer::new(x_request_id)),
            )
    }

    /// The proxy router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then drain background store writes.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), StartupError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address)
                .await
                .map_err(|source| StartupError::Bind {
                    address: self.config.admin.bind_address.clone(),
                    source,
                })?;
            let admin = setup_admin_router(AdminState::new(
                self.pipeline.clone(),
                &self.config.admin.api_key,
            ));
            let admin_shutdown = shutdown.subscribe();

            tracing::info!(address = %self.config.admin.bind_address, "Admin API listening");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(shutdown::wait(admin_shutdown))
                    .await
                {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");

        let deadline = Duration::from_secs(self.config.shutdown.drain_timeout_secs);
        if self.pipeline.background().drain(deadline).await {
            tracing::info!("Background writes drained");
        }
        Ok(())
    }
}

/// Catch-all handler: buffer the body, resolve through the pipeline.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            metrics::record_resolution("rejected", StatusCode::PAYLOAD_TOO_LARGE.as_u16(), start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let span = tracing::info_span!("resolve", request_id = %request_id);
    let resolved = state
        .pipeline
        .resolve(Request::from_parts(parts, body))
        .instrument(span)
        .await;

    let status = resolved.response.status();
    tracing::debug!(
        request_id = %request_id,
        outcome = resolved.outcome.as_str(),
        status = status.as_u16(),
        "Request resolved"
    );
    metrics::record_resolution(resolved.outcome.as_str(), status.as_u16(), start_time);

    resolved.response
}
