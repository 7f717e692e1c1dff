pub mod app_config;
pub mod config;
pub mod entitlements;
pub mod product;
pub mod progress;
pub mod selectors;
pub mod strategy;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use entitlements::{Entitlements, ImageBox, Plan};
pub use product::{Category, Gender, ProductRecord, Sourced};
pub use progress::{JobPhase, NullSink, ProgressSink, ProgressUpdate};
pub use selectors::{load_selector_config, FieldSelectors, SelectorConfig};
pub use strategy::PricingStrategy;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read selectors file {path}: {source}")]
    SelectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selectors file: {0}")]
    SelectorsFileParse(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
