//! Progress reporting contract between a running job and whoever observes it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Init,
    Connect,
    Extracting,
    Market,
    Pricing,
    Images,
    Report,
    Storing,
    Completed,
    Error,
}

impl JobPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Error)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobPhase::Init => "init",
            JobPhase::Connect => "connect",
            JobPhase::Extracting => "extracting",
            JobPhase::Market => "market",
            JobPhase::Pricing => "pricing",
            JobPhase::Images => "images",
            JobPhase::Report => "report",
            JobPhase::Storing => "storing",
            JobPhase::Completed => "completed",
            JobPhase::Error => "error",
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub phase: JobPhase,
    /// Percentage in 0..=100.
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ProgressUpdate {
    pub fn new(phase: JobPhase, progress: u8, message: impl Into<String>) -> Self {
        Self {
            phase,
            progress: progress.min(100),
            message: message.into(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Fire-and-forget receiver of progress updates.
///
/// Implementations must not block the caller; a sink with no listeners drops
/// the update.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

/// Sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _update: ProgressUpdate) {}
}

/// Linear interpolation of `done / target` onto `[from, to]`.
#[must_use]
pub fn interpolate(from: u8, to: u8, done: usize, target: usize) -> u8 {
    if target == 0 || to <= from {
        return from;
    }
    let span = usize::from(to - from);
    let step = (done.min(target) * span) / target;
    // step <= span <= 100, so it fits in u8.
    from + u8::try_from(step).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_capped_at_100() {
        let u = ProgressUpdate::new(JobPhase::Completed, 150, "done");
        assert_eq!(u.progress, 100);
    }

    #[test]
    fn terminal_phases() {
        assert!(JobPhase::Completed.is_terminal());
        assert!(JobPhase::Error.is_terminal());
        assert!(!JobPhase::Extracting.is_terminal());
    }

    #[test]
    fn interpolate_maps_ratio_onto_range() {
        assert_eq!(interpolate(10, 60, 0, 100), 10);
        assert_eq!(interpolate(10, 60, 50, 100), 35);
        assert_eq!(interpolate(10, 60, 100, 100), 60);
        assert_eq!(interpolate(10, 60, 250, 100), 60);
        assert_eq!(interpolate(10, 60, 3, 0), 10);
    }

    #[test]
    fn extra_fields_serialize_flat_map() {
        let u = ProgressUpdate::new(JobPhase::Extracting, 20, "page 2").with_extra("page", 2);
        let json = serde_json::to_value(&u).unwrap();
        assert_eq!(json["phase"], "extracting");
        assert_eq!(json["extra"]["page"], 2);
    }
}
