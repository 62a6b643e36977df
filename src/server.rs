//! HTTP surface.
//!
//! ```text
//! POST /ActionsTiming/v1/AddAction   {"Action": "Run", "Time": 100}
//! GET  /ActionsTiming/v1/GetStats    [{"Name": "Run", "Avg": 100.0}]
//! GET  /health
//! ```

use crate::error::Error;
use crate::service::ActionsTiming;
use crate::stats::ServerStats;
use crate::types::{ActionStatistic, ActionTiming};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const ADD_ACTION_PATH: &str = "/ActionsTiming/v1/AddAction";
pub const GET_STATS_PATH: &str = "/ActionsTiming/v1/GetStats";
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
struct AppState {
    service: Arc<ActionsTiming>,
    stats: Arc<ServerStats>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    requests_processed: u64,
    requests_failed: u64,
    avg_execution_time_ms: f64,
    store_connections_created: usize,
    store_connections_idle: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    code: &'static str,
    message: String,
}

/// Maps library errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }

        let body = ErrorBody {
            error: ErrorPayload {
                code: self.0.code(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(service: Arc<ActionsTiming>) -> Router {
    let state = AppState {
        service,
        stats: Arc::new(ServerStats::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(ADD_ACTION_PATH, post(add_action))
        .route(GET_STATS_PATH, get(get_stats))
        .route(HEALTH_PATH, get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn_with_state(state.clone(), track_request)),
        )
        .with_state(state)
}

/// Serve until `shutdown` resolves, then finish in-flight requests.
pub async fn serve<F>(
    listener: TcpListener,
    service: Arc<ActionsTiming>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.stats.record_request(start.elapsed(), !response.status().is_success());
    response
}

async fn add_action(
    State(state): State<AppState>,
    payload: Result<Json<ActionTiming>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(timing) = payload.map_err(|rejection| Error::validation(rejection.body_text()))?;
    timing.validate()?;

    let service = Arc::clone(&state.service);
    run_blocking(move || service.record(&timing)).await?;
    Ok(StatusCode::OK)
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<Vec<ActionStatistic>>, ApiError> {
    let service = Arc::clone(&state.service);
    let stats = run_blocking(move || service.statistics()).await?;
    Ok(Json(stats))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (requests, failed, avg_time) = state.stats.get_stats();
    let pool = state.service.pool_stats();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        requests_processed: requests,
        requests_failed: failed,
        avg_execution_time_ms: avg_time,
        store_connections_created: pool.total_created,
        store_connections_idle: pool.idle,
    })
}

/// Store calls block, keep them off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| Error::Internal(format!("store worker failed: {}", err)))?
}
