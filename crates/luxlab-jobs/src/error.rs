use luxlab_core::ConfigError;
use luxlab_report::{ImageError, ReportError};
use luxlab_scraper::ScraperError;
use thiserror::Error;

/// Artifact persistence failure. Fatal for the job that hit it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid artifact filename \"{0}\"")]
    InvalidFilename(String),

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("artifact I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Job-level failure; its display text becomes the `error` event message.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Scraper(ScraperError),

    #[error("report generation failed: {0}")]
    Report(#[from] ReportError),

    #[error("artifact write failed: {0}")]
    Storage(#[from] StorageError),

    #[error("image pipeline unavailable: {0}")]
    Images(#[from] ImageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cancelled")]
    Cancelled,

    #[error("job worker failed: {0}")]
    Worker(String),
}

impl From<ScraperError> for JobError {
    fn from(e: ScraperError) -> Self {
        match e {
            ScraperError::Cancelled => JobError::Cancelled,
            other => JobError::Scraper(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scraper_cancellation_becomes_job_cancellation() {
        let err = JobError::from(ScraperError::Cancelled);
        assert!(matches!(err, JobError::Cancelled));
        assert_eq!(err.to_string(), "cancelled");
    }

    #[test]
    fn scraper_errors_keep_their_message() {
        let err = JobError::from(ScraperError::NoProductsFound {
            url: "https://shop.example/bags".into(),
            pages: 3,
        });
        assert_eq!(
            err.to_string(),
            "no products found at https://shop.example/bags after 3 pages"
        );
    }
}
