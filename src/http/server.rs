//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the note endpoints
//! - Wire up middleware (tracing, timeout, body limit, request ID, metrics)
//! - Resolve the caller through the configured `AuthProvider`
//! - Serve until the shutdown signal fires

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::AuthProvider;
use crate::config::NotesConfig;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::wait_for;
use crate::lifecycle::Services;
use crate::notes::NotesService;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: NotesService,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(services: &Services) -> Self {
        Self {
            notes: services.notes(),
            auth: services.auth.clone(),
        }
    }
}

/// HTTP front end for the notes service.
pub struct HttpServer {
    router: Router,
    config: NotesConfig,
}

impl HttpServer {
    /// Create a new HTTP server over the given collaborators.
    pub fn new(config: NotesConfig, services: &Services) -> Self {
        let router = Self::build_router(&config, AppState::new(services));
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &NotesConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/notes", get(handlers::get_notes).post(handlers::upload_note))
            .route("/notes/{note_id}", delete(handlers::delete_note))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_metrics))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &NotesConfig {
        &self.config
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
