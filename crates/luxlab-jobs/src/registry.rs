//! Job-id keyed progress map.
//!
//! Each job has exactly one writer (its [`JobHandle`]) and any number of
//! readers, either polling [`JobRegistry::status`] or following a broadcast
//! subscription. Once a job reaches a terminal phase its status is frozen.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use luxlab_core::{JobPhase, ProgressSink, ProgressUpdate};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Updates buffered per subscriber before a slow reader starts lagging.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub job_id: Uuid,
    pub phase: JobPhase,
    pub progress: u8,
    pub message: String,
    /// `Some(true)` once completed, `Some(false)` on error, else `None`.
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    fn queued(job_id: Uuid) -> Self {
        Self {
            job_id,
            phase: JobPhase::Init,
            progress: 0,
            message: "queued".to_string(),
            success: None,
            extra: Map::new(),
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

struct JobEntry {
    status: JobStatus,
    tx: broadcast::Sender<JobStatus>,
    cancel: CancellationToken,
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<Uuid, JobEntry>>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, JobEntry>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, JobEntry>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new job in the `init` phase and returns its writer.
    #[must_use]
    pub fn create(&self) -> JobHandle {
        let id = Uuid::new_v4();
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        self.write().insert(
            id,
            JobEntry {
                status: JobStatus::queued(id),
                tx,
                cancel: cancel.clone(),
            },
        );
        tracing::debug!(job_id = %id, "job registered");
        JobHandle {
            id,
            registry: self.clone(),
            cancel,
        }
    }

    #[must_use]
    pub fn status(&self, id: Uuid) -> Option<JobStatus> {
        self.read().get(&id).map(|e| e.status.clone())
    }

    /// Current status plus a receiver for every later update. Taken under one
    /// lock so no update falls between the snapshot and the subscription.
    #[must_use]
    pub fn subscribe(&self, id: Uuid) -> Option<(JobStatus, broadcast::Receiver<JobStatus>)> {
        self.read()
            .get(&id)
            .map(|e| (e.status.clone(), e.tx.subscribe()))
    }

    /// Requests cancellation. Returns `false` for unknown or finished jobs.
    pub fn cancel(&self, id: Uuid) -> bool {
        let jobs = self.read();
        match jobs.get(&id) {
            Some(entry) if !entry.status.is_terminal() => {
                entry.cancel.cancel();
                tracing::info!(job_id = %id, "job cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Drops finished jobs last updated before `cutoff`.
    pub fn prune_finished(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, e| !(e.status.is_terminal() && e.status.updated_at < cutoff));
        before - jobs.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn apply(&self, id: Uuid, update: ProgressUpdate) {
        let mut jobs = self.write();
        let Some(entry) = jobs.get_mut(&id) else {
            tracing::warn!(job_id = %id, "progress for unknown job dropped");
            return;
        };
        if entry.status.is_terminal() {
            tracing::debug!(job_id = %id, phase = %update.phase, "job already finished, update dropped");
            return;
        }

        let status = &mut entry.status;
        // An error keeps the percentage reached so far.
        if update.phase != JobPhase::Error {
            status.progress = update.progress;
        }
        status.phase = update.phase;
        status.message = update.message;
        status.extra = update.extra;
        status.success = match update.phase {
            JobPhase::Completed => Some(true),
            JobPhase::Error => Some(false),
            _ => None,
        };
        status.updated_at = Utc::now();

        // No subscribers is fine; pollers still see the stored status.
        let _ = entry.tx.send(status.clone());
    }
}

/// Writer side of one job. Progress emitted here lands in the registry.
#[derive(Clone)]
pub struct JobHandle {
    id: Uuid,
    registry: JobRegistry,
    cancel: CancellationToken,
}

impl JobHandle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Moves the job to `error` with `message`.
    pub fn fail(&self, message: impl Into<String>) {
        self.emit(ProgressUpdate::new(JobPhase::Error, 0, message));
    }
}

impl ProgressSink for JobHandle {
    fn emit(&self, update: ProgressUpdate) {
        self.registry.apply(self.id, update);
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
