pub mod client;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod parse;
pub mod pipeline;
pub(crate) mod rate_limit;
pub mod selector;

pub use client::{ClientPool, FetchPolicy, Identity};
pub use error::ScraperError;
pub use extract::FieldExtractor;
pub use pipeline::{CatalogPipeline, PipelineState, StopReason, Sweep};
pub use selector::CompiledSelectors;
