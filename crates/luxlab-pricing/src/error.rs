use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("market source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("market source {source_name} has no price for \"{product}\"")]
    NoQuote { source_name: String, product: String },
}
