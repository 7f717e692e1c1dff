//! Background conversion jobs: the progress registry, the runner that chains
//! extraction, pricing and report generation, and artifact storage.

pub mod error;
pub mod record;
pub mod registry;
pub mod runner;
pub mod storage;

pub use error::{JobError, StorageError};
pub use record::{url_digest, ConversionRecord, ConversionSink, TracingSink};
pub use registry::{JobHandle, JobRegistry, JobStatus};
pub use runner::{
    effective_strategy, AnalysisPreview, ConversionOutcome, ConversionRequest, ConversionRunner,
    PreviewItem, PREVIEW_LIMIT,
};
pub use storage::{validate_filename, ArtifactStore, FsArtifactStore};
