use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension,
};
use luxlab_jobs::{validate_filename, JobError};

use crate::middleware::RequestId;

use super::{map_job_error, ApiError, AppState};

pub(super) const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub(super) async fn download(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    validate_filename(&filename).map_err(|e| map_job_error(req_id.0.clone(), &JobError::from(e)))?;

    let bytes = state
        .runner
        .store()
        .get(&filename)
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &JobError::from(e)))?;
    tracing::debug!(filename = %filename, size = bytes.len(), "serving artifact");

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|_| ApiError::new(req_id.0.clone(), "bad_request", "invalid filename"))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
