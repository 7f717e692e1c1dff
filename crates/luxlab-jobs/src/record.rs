//! Per-job conversion record handed to persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use luxlab_core::PricingStrategy;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRecord {
    pub job_id: Uuid,
    /// Hex SHA-256 of the catalog URL; the URL itself is not kept.
    pub url_sha256: String,
    pub strategy: PricingStrategy,
    pub products_count: usize,
    pub margin_avg: f64,
    pub total_proposed: f64,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

#[must_use]
pub fn url_digest(url: &str) -> String {
    Sha256::digest(url.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[async_trait]
pub trait ConversionSink: Send + Sync {
    async fn record(&self, record: &ConversionRecord) -> Result<(), StorageError>;
}

/// Writes each record to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl ConversionSink for TracingSink {
    async fn record(&self, record: &ConversionRecord) -> Result<(), StorageError> {
        tracing::info!(
            job_id = %record.job_id,
            url_sha256 = %record.url_sha256,
            strategy = %record.strategy,
            products = record.products_count,
            margin_avg = record.margin_avg,
            total_proposed = record.total_proposed,
            filename = %record.filename,
            "conversion recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        assert_eq!(
            url_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        let d = url_digest("https://shop.example/bags?page=2");
        assert_eq!(d.len(), 64);
        assert!(!d.contains("shop"));
    }
}
