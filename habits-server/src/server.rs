//! HTTP surface: the axum router, response mapping, and server start-up.
//!
//! Every response has an empty body; the status code is the whole answer.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use habits_core::signature::SIGNATURE_HEADER;

use crate::webhook::{Outcome, ProcessError, Rejection, WebhookProcessor};

/// Default maximum accepted body size in bytes (64 KB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Shared server state.
pub struct AppState {
    /// The webhook pipeline.
    pub processor: WebhookProcessor,
    /// Maximum accepted request body size in bytes.
    max_body_size: usize,
}

impl AppState {
    /// Creates state with the default body size limit.
    #[must_use]
    pub fn new(processor: WebhookProcessor) -> Self {
        Self::with_config(processor, DEFAULT_MAX_BODY_SIZE)
    }

    /// Creates state with a custom body size limit.
    #[must_use]
    pub fn with_config(processor: WebhookProcessor, max_body_size: usize) -> Self {
        Self {
            processor,
            max_body_size,
        }
    }
}

impl Outcome {
    /// The HTTP status this outcome is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejected(Rejection::Signature) => StatusCode::FORBIDDEN,
            Self::Rejected(Rejection::Malformed) => StatusCode::BAD_REQUEST,
            Self::Acknowledged(_) => StatusCode::NO_CONTENT,
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Builds the router for the given state.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/webhooks", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(state.max_body_size))
        .with_state(state)
}

/// Starts the server on the given address and returns the bound address
/// and a join handle.
///
/// Binding to port 0 lets the OS pick a free port, which tests rely on.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "webhook server error");
        }
    });

    Ok((bound_addr, handle))
}

/// `POST /webhooks`
async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Outcome, ProcessError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let outcome = state.processor.process(&body, signature).await?;
    tracing::debug!(status = %outcome.status_code(), "webhook handled");
    Ok(outcome)
}

/// `GET /health`
async fn health_handler() -> &'static str {
    "ok"
}
