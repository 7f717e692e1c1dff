use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, Sse},
        IntoResponse, Response,
    },
    Extension, Json,
};
use luxlab_jobs::{JobRegistry, JobStatus};
use tokio::sync::{broadcast::error::RecvError, mpsc::unbounded_channel};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

type EventSender = tokio::sync::mpsc::UnboundedSender<Result<SseEvent, Infallible>>;

pub(super) async fn get_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<JobStatus>>, ApiError> {
    let id = parse_job_id(&req_id, &job_id)?;
    let status = state
        .registry
        .status(id)
        .ok_or_else(|| unknown_job(&req_id, &job_id))?;

    Ok(Json(ApiResponse {
        data: status,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn cancel_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<JobStatus>>), ApiError> {
    let id = parse_job_id(&req_id, &job_id)?;
    let current = state
        .registry
        .status(id)
        .ok_or_else(|| unknown_job(&req_id, &job_id))?;

    if !state.registry.cancel(id) {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            format!("job {job_id} already finished ({})", current.phase),
        ));
    }

    let status = state.registry.status(id).unwrap_or(current);
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: status,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// Server-sent events for one job: the current status, then every update as
/// a `progress` event, with `heartbeat` events while the job is quiet. The
/// stream ends after a terminal status.
pub(super) async fn stream_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_job_id(&req_id, &job_id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    if state.registry.status(id).is_none() {
        return unknown_job(&req_id, &job_id).into_response();
    }

    let (tx, rx) = unbounded_channel::<Result<SseEvent, Infallible>>();
    tokio::spawn(forward_updates(state.registry, id, state.heartbeat, tx));

    Sse::new(UnboundedReceiverStream::new(rx)).into_response()
}

async fn forward_updates(registry: JobRegistry, id: Uuid, heartbeat: Duration, tx: EventSender) {
    let Some((snapshot, mut updates)) = registry.subscribe(id) else {
        return;
    };
    if !send_status(&tx, &snapshot) || snapshot.is_terminal() {
        return;
    }

    loop {
        match tokio::time::timeout(heartbeat, updates.recv()).await {
            Ok(Ok(status)) => {
                if !send_status(&tx, &status) || status.is_terminal() {
                    break;
                }
            }
            Ok(Err(RecvError::Lagged(skipped))) => {
                tracing::debug!(job_id = %id, skipped, "stream subscriber lagged");
                // Resync from the registry so a missed terminal status still ends the stream.
                if let Some(status) = registry.status(id) {
                    if !send_status(&tx, &status) || status.is_terminal() {
                        break;
                    }
                }
            }
            Ok(Err(RecvError::Closed)) => break,
            Err(_) => {
                let beat = SseEvent::default().event("heartbeat").data("{}");
                if tx.send(Ok(beat)).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(job_id = %id, "job stream closed");
}

/// Returns `false` once the client has gone away.
fn send_status(tx: &EventSender, status: &JobStatus) -> bool {
    let data = match serde_json::to_string(status) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize job status");
            return true;
        }
    };
    tx.send(Ok(SseEvent::default().event("progress").data(data)))
        .is_ok()
}

fn parse_job_id(req_id: &RequestId, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| unknown_job(req_id, raw))
}

fn unknown_job(req_id: &RequestId, raw: &str) -> ApiError {
    ApiError::new(req_id.0.clone(), "not_found", format!("job {raw} not found"))
}
