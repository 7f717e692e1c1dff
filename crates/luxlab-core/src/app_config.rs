use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub export_dir: PathBuf,
    pub selectors_path: Option<PathBuf>,
    /// Raw `token:plan` pairs; parsed by the server's auth layer.
    pub api_keys: Option<String>,
    pub scraper_request_timeout_secs: u64,
    pub scraper_max_attempts: u32,
    pub scraper_min_delay_ms: u64,
    pub scraper_max_delay_ms: u64,
    pub scraper_backoff_base_ms: u64,
    pub scraper_max_pages: u32,
    pub image_timeout_secs: u64,
    pub stream_heartbeat_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn stream_heartbeat(&self) -> Duration {
        Duration::from_secs(self.stream_heartbeat_secs)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("export_dir", &self.export_dir)
            .field("selectors_path", &self.selectors_path)
            .field("api_keys", &self.api_keys.as_ref().map(|_| "[redacted]"))
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_max_attempts", &self.scraper_max_attempts)
            .field("scraper_min_delay_ms", &self.scraper_min_delay_ms)
            .field("scraper_max_delay_ms", &self.scraper_max_delay_ms)
            .field("scraper_backoff_base_ms", &self.scraper_backoff_base_ms)
            .field("scraper_max_pages", &self.scraper_max_pages)
            .field("image_timeout_secs", &self.image_timeout_secs)
            .field("stream_heartbeat_secs", &self.stream_heartbeat_secs)
            .finish()
    }
}
