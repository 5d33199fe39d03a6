//! HTTP server for browsing and searching decision records.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | List every record in the corpus directory |
//! | `GET`  | `/search?q=` | Fuzzy search over the index built at startup |
//! | `GET`  | `/{item}` | One record, including its body |
//! | `GET`  | `/health` | Version and index statistics |
//! | `GET`  | `/favicon.ico` | Empty response |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "record not found: 0009-x.yaml" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::corpus::Document;
use crate::error::Error;
use crate::search::outputs::{HealthOutput, ListOutput, SearchOutput};
use crate::service::RecordService;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<RecordService>,
}

impl AppState {
    pub fn new(service: RecordService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let timeout = state.service.config().request_timeout();

    Router::new()
        .route("/", get(handle_list))
        .route("/favicon.ico", get(handle_favicon))
        .route("/health", get(handle_health))
        .route("/search", get(handle_search))
        .route("/{item}", get(handle_detail))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Starting server on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Shutting down");
    Ok(())
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Internal error type that converts into an HTTP response
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        if err.is_not_found() {
            return AppError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message: err.to_string(),
            };
        }
        match err {
            Error::Query(_) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "bad_request",
                message: err.to_string(),
            },
            _ => {
                tracing::error!("Request failed: {}", err);
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "internal",
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Request task failed: {}", err);
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: "request task failed".to_string(),
        }
    }
}

/// Run blocking corpus or index work off the async workers
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&RecordService) -> Result<T, Error> + Send + 'static,
{
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || f(&service)).await?;
    Ok(result?)
}

// ============ Handlers ============

async fn handle_list(State(state): State<AppState>) -> Result<Json<ListOutput>, AppError> {
    let output = run_blocking(&state, |service| service.list()).await?;
    Ok(Json(output))
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(item): Path<String>,
) -> Result<Json<Document>, AppError> {
    let doc = run_blocking(&state, move |service| service.detail(&item)).await?;
    Ok(Json(doc))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchOutput>, AppError> {
    let output = run_blocking(&state, move |service| service.search(&params.q)).await?;
    Ok(Json(output))
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthOutput> {
    Json(state.service.health())
}

async fn handle_favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
