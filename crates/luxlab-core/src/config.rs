use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to pick up a local `.env` before reading.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the variables already in the process.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parses and validates configuration through `lookup`, so tests can feed a
/// plain map instead of mutating the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("LUXLAB_ENV", "development"))?;

    let bind_addr = or_default("LUXLAB_BIND_ADDR", "0.0.0.0:8080")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("LUXLAB_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("LUXLAB_LOG_LEVEL", "info");
    let export_dir = PathBuf::from(or_default("LUXLAB_EXPORT_DIR", "./exports"));
    let selectors_path = lookup("LUXLAB_SELECTORS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let api_keys = lookup("LUXLAB_API_KEYS")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let scraper_request_timeout_secs = parse_u64("LUXLAB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_max_attempts = parse_u32("LUXLAB_SCRAPER_MAX_ATTEMPTS", "5")?;
    if !(1..=10).contains(&scraper_max_attempts) {
        return Err(invalid(
            "LUXLAB_SCRAPER_MAX_ATTEMPTS",
            format!("{scraper_max_attempts} is outside 1..=10"),
        ));
    }
    let scraper_min_delay_ms = parse_u64("LUXLAB_SCRAPER_MIN_DELAY_MS", "500")?;
    let scraper_max_delay_ms = parse_u64("LUXLAB_SCRAPER_MAX_DELAY_MS", "2000")?;
    if scraper_max_delay_ms < scraper_min_delay_ms {
        return Err(invalid(
            "LUXLAB_SCRAPER_MAX_DELAY_MS",
            format!("{scraper_max_delay_ms} is below LUXLAB_SCRAPER_MIN_DELAY_MS ({scraper_min_delay_ms})"),
        ));
    }
    let scraper_backoff_base_ms = parse_u64("LUXLAB_SCRAPER_BACKOFF_BASE_MS", "1000")?;
    let scraper_max_pages = parse_u32("LUXLAB_SCRAPER_MAX_PAGES", "30")?;
    let image_timeout_secs = parse_u64("LUXLAB_IMAGE_TIMEOUT_SECS", "10")?;
    let stream_heartbeat_secs = parse_u64("LUXLAB_STREAM_HEARTBEAT_SECS", "30")?;
    if stream_heartbeat_secs == 0 {
        return Err(invalid(
            "LUXLAB_STREAM_HEARTBEAT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        export_dir,
        selectors_path,
        api_keys,
        scraper_request_timeout_secs,
        scraper_max_attempts,
        scraper_min_delay_ms,
        scraper_max_delay_ms,
        scraper_backoff_base_ms,
        scraper_max_pages,
        image_timeout_secs,
        stream_heartbeat_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LUXLAB_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
