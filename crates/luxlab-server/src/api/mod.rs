mod conversions;
mod downloads;
mod jobs;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use luxlab_jobs::{ConversionRunner, JobError, JobRegistry, StorageError};
use luxlab_scraper::ScraperError;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    limit_conversions, request_id, require_bearer_auth, AuthState, ConversionLimit, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: JobRegistry,
    pub runner: Arc<ConversionRunner>,
    /// Idle interval after which a job stream emits a heartbeat.
    pub heartbeat: Duration,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_job_error(request_id: String, error: &JobError) -> ApiError {
    match error {
        JobError::Scraper(ScraperError::InvalidUrl { .. }) => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        JobError::Scraper(ScraperError::NoProductsFound { .. }) => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        JobError::Scraper(e @ ScraperError::IllegalTransition { .. }) => {
            tracing::error!(error = %e, "catalog pipeline failed");
            ApiError::new(request_id, "internal_error", "internal error")
        }
        JobError::Scraper(e) => {
            tracing::warn!(error = %e, "catalog fetch failed");
            ApiError::new(request_id, "upstream_error", e.to_string())
        }
        JobError::Storage(StorageError::NotFound(name)) => {
            ApiError::new(request_id, "not_found", format!("artifact {name} not found"))
        }
        JobError::Storage(e @ StorageError::InvalidFilename(_)) => {
            ApiError::new(request_id, "bad_request", e.to_string())
        }
        other => {
            tracing::error!(error = %other, "request failed");
            ApiError::new(request_id, "internal_error", "internal error")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

/// Routes that start catalog fetches, counted per caller.
fn conversion_router(limit: ConversionLimit) -> Router<AppState> {
    Router::new()
        .route("/api/v1/analyze", post(conversions::analyze))
        .route("/api/v1/conversions", post(conversions::start_conversion))
        .route_layer(axum::middleware::from_fn_with_state(
            limit,
            limit_conversions,
        ))
}

fn protected_router(auth: AuthState, limit: ConversionLimit) -> Router<AppState> {
    Router::new()
        .merge(conversion_router(limit))
        .route("/api/v1/jobs/{job_id}", get(jobs::get_job))
        .route("/api/v1/jobs/{job_id}/stream", get(jobs::stream_job))
        .route("/api/v1/jobs/{job_id}/cancel", post(jobs::cancel_job))
        .route("/api/v1/downloads/{filename}", get(downloads::download))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState, limit: ConversionLimit) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Conversion and analyze requests allowed per caller each minute.
pub fn default_conversion_limit() -> ConversionLimit {
    ConversionLimit::new(10, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
