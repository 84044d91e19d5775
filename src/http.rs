//! HTTP boundary for the aggregator.
//!
//! Exposes `GET /v1/user-posts/:id` and `GET /health`. Aggregate failures are
//! mapped to distinct statuses with a JSON error body naming the failing
//! lookup.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::error::{AggregateFailure, FetchError};
use crate::models::{AggregateResult, UserId};

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

/// Error response for the boundary layer.
#[derive(Debug)]
pub enum ApiError {
    InvalidId(String),
    Aggregate(AggregateFailure),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::Aggregate(failure) => match failure {
                AggregateFailure::Fetch { error, .. } => match error {
                    FetchError::NotFound => StatusCode::NOT_FOUND,
                    FetchError::Transport(_) | FetchError::Decode(_) => StatusCode::BAD_GATEWAY,
                },
                AggregateFailure::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
                AggregateFailure::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                AggregateFailure::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<AggregateFailure> for ApiError {
    fn from(failure: AggregateFailure) -> Self {
        ApiError::Aggregate(failure)
    }
}

/// JSON error body shared by the HTTP and one-shot paths.
pub fn error_body(failure: &AggregateFailure) -> serde_json::Value {
    json!({
        "error": {
            "kind": failure.kind(),
            "source": failure.side().map(|s| s.as_str()),
            "message": failure.to_string(),
        }
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = match &self {
            ApiError::InvalidId(raw) => json!({
                "error": {
                    "kind": "invalid_id",
                    "source": null,
                    "message": format!("invalid user id: {}", raw),
                }
            }),
            ApiError::Aggregate(failure) => error_body(failure),
        };
        body["error"]["code"] = json!(status.as_u16());

        (status, Json(body)).into_response()
    }
}

/// Build the router over the given aggregator.
pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/v1/user-posts/:id", get(get_user_posts))
        .route("/health", get(health))
        .with_state(AppState { aggregator })
}

async fn get_user_posts(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<AggregateResult>, ApiError> {
    let id: UserId = raw_id
        .parse()
        .map_err(|_| ApiError::InvalidId(raw_id.clone()))?;

    debug!("GET /v1/user-posts/{}", id);
    let result = state.aggregator.aggregate(id).await?;
    Ok(Json(result))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn serve(
    bind: &str,
    aggregator: Arc<Aggregator>,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", bind))?;

    info!("Listening on {}", listener.local_addr().context("listener address")?);

    axum::serve(listener, router(aggregator))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}
