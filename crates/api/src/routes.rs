use std::any::Any;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use colcap_core::domain::response::{AggregateReport, CorrelationReport, ErrorEnvelope};
use colcap_core::error::AggregateError;
use colcap_core::pipeline::Aggregator;
use colcap_core::time::calendar::resolve_range;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/aggregate", get(aggregate))
        .route("/correlation", get(correlation))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    parallel: Option<String>,
}

/// Absent means parallel; otherwise only `true`, `1` or `yes` enable it.
fn parse_parallel(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
    }
}

async fn aggregate(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<AggregateReport>, ApiError> {
    let Query(q) = query?;
    let range = resolve_range(q.start_date.as_deref(), q.end_date.as_deref(), Utc::now())?;
    let parallel = parse_parallel(q.parallel.as_deref());

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "aggregate",
        %request_id,
        start = %range.start(),
        end = %range.end(),
        parallel
    );

    let report = state
        .aggregator
        .aggregate(range, parallel)
        .instrument(span)
        .await?;
    Ok(Json(report))
}

async fn correlation(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<CorrelationReport>, ApiError> {
    let Query(q) = query?;
    let range = resolve_range(q.start_date.as_deref(), q.end_date.as_deref(), Utc::now())?;
    let parallel = parse_parallel(q.parallel.as_deref());

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "correlation",
        %request_id,
        start = %range.start(),
        end = %range.end()
    );

    let report = state
        .aggregator
        .correlation(range, parallel)
        .instrument(span)
        .await?;
    Ok(Json(report))
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "News/COLCAP Aggregator",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Correlates economic news volume with the COLCAP index",
        "endpoints": {
            "/health": "Service health check",
            "/aggregate": "Merged daily series with correlation (params: start_date, end_date, parallel)",
            "/correlation": "Correlation summary only (params: start_date, end_date, parallel)"
        },
        "example": "GET /aggregate?start_date=2024-01-01&end_date=2024-03-31&parallel=true"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "aggregator"}))
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug)]
pub struct ApiError(AggregateError);

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        Self(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AggregateError::InvalidRange(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            let err = anyhow::anyhow!(self.0.to_string());
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(ErrorEnvelope::new(self.0.to_string()))).into_response()
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(%detail, "handler panicked");
    ApiError(AggregateError::Unexpected(detail)).into_response()
}
