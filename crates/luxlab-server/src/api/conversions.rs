use axum::{extract::State, http::StatusCode, Extension, Json};
use luxlab_core::PricingStrategy;
use luxlab_jobs::{AnalysisPreview, ConversionRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{CallerPlan, RequestId};

use super::{map_job_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeBody {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ConversionBody {
    pub url: String,
    pub strategy: Option<String>,
    pub custom_margin: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ConversionAccepted {
    job_id: Uuid,
}

pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(CallerPlan(plan)): Extension<CallerPlan>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<ApiResponse<AnalysisPreview>>, ApiError> {
    let url = validate_url(&req_id, &body.url)?;

    let preview = state
        .runner
        .analyze(url, plan.entitlements())
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: preview,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn start_conversion(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(CallerPlan(plan)): Extension<CallerPlan>,
    Json(body): Json<ConversionBody>,
) -> Result<(StatusCode, Json<ApiResponse<ConversionAccepted>>), ApiError> {
    let url = validate_url(&req_id, &body.url)?;

    let strategy = match body.strategy.as_deref() {
        Some(raw) => raw
            .parse::<PricingStrategy>()
            .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?,
        None => PricingStrategy::Balanced,
    };

    if let Some(margin) = body.custom_margin {
        if !margin.is_finite() || margin <= 0.0 || margin >= 1.0 {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "custom_margin must be between 0 and 1",
            ));
        }
    }

    let job_id = state.runner.spawn(
        &state.registry,
        ConversionRequest {
            url: url.to_owned(),
            strategy,
            custom_margin: body.custom_margin,
        },
        plan.entitlements(),
    );
    tracing::info!(
        job_id = %job_id,
        plan = plan.as_str(),
        strategy = strategy.as_str(),
        "conversion accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ConversionAccepted { job_id },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// Cheap shape check; scheme and host are validated again by the pipeline.
fn validate_url<'a>(req_id: &RequestId, raw: &'a str) -> Result<&'a str, ApiError> {
    let url = raw.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ApiError::new(
            req_id.0.clone(),
            "validation_error",
            "url must be an http(s) catalog URL",
        ))
    }
}
