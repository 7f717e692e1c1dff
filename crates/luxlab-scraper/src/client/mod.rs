//! HTTP client pool for catalog pages.

mod identity;
mod origin;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use luxlab_core::AppConfig;
use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

pub use identity::{Identity, DEFAULT_IDENTITIES};
pub use origin::{extract_domain, extract_origin, resolve_url};

/// Timing and retry knobs for [`ClientPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub request_timeout: Duration,
    pub max_attempts: u32,
    /// Every request, including the first, waits a uniform delay in
    /// `[min_delay, max_delay]` before it is sent.
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub backoff_base_ms: u64,
}

impl FetchPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.scraper_request_timeout_secs),
            max_attempts: config.scraper_max_attempts,
            min_delay: Duration::from_millis(config.scraper_min_delay_ms),
            max_delay: Duration::from_millis(config.scraper_max_delay_ms),
            backoff_base_ms: config.scraper_backoff_base_ms,
        }
    }

    /// No pacing and no backoff; used against local mock servers.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_base_ms: 0,
        }
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_attempts: 5,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(2_000),
            backoff_base_ms: 1_000,
        }
    }
}

/// Rotates through browser identities and fetches pages with retry/backoff.
///
/// Each call to [`ClientPool::fetch`] advances the rotation once per attempt,
/// so consecutive requests never share an identity (given more than one).
pub struct ClientPool {
    client: Client,
    identities: Vec<Identity>,
    cursor: AtomicUsize,
    policy: FetchPolicy,
}

impl ClientPool {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(policy: FetchPolicy) -> Result<Self, ScraperError> {
        Self::with_identities(policy, DEFAULT_IDENTITIES.to_vec())
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_identities(
        policy: FetchPolicy,
        mut identities: Vec<Identity>,
    ) -> Result<Self, ScraperError> {
        if identities.is_empty() {
            identities = DEFAULT_IDENTITIES.to_vec();
        }
        let client = Client::builder()
            .timeout(policy.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            identities,
            cursor: AtomicUsize::new(0),
            policy,
        })
    }

    #[must_use]
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Identity for the next request; advances the rotation.
    pub fn next_identity(&self) -> Identity {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.identities.len();
        self.identities[idx]
    }

    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::FetchExhausted`]: 403/429/5xx or transport failures on every attempt.
    /// - [`ScraperError::NotFound`] / [`ScraperError::UnexpectedStatus`]: other non-2xx (not retried).
    /// - [`ScraperError::InvalidUrl`]: `url` does not parse.
    pub async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        let referer = extract_origin(url);

        retry_with_backoff(
            self.policy.max_attempts,
            self.policy.backoff_base_ms,
            url,
            |attempt| {
                let referer = referer.clone();
                async move {
                    self.pace().await;
                    let identity = self.next_identity();
                    tracing::debug!(url, attempt, user_agent = identity.user_agent, "fetching page");
                    self.fetch_once(url, &referer, identity).await
                }
            },
        )
        .await
    }

    async fn fetch_once(
        &self,
        url: &str,
        referer: &str,
        identity: Identity,
    ) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, identity.user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, identity.accept_language)
            .header("sec-ch-ua-platform", identity.platform)
            .header(reqwest::header::REFERER, referer)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScraperError::Blocked {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if status.is_server_error() {
            return Err(ScraperError::ServerError {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }

    /// Uniform random delay in `[min_delay, max_delay]`.
    async fn pace(&self) {
        let min = self.policy.min_delay;
        let max = self.policy.max_delay.max(min);
        let delay = min + (max - min).mul_f64(rand::random::<f64>());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_never_repeats_consecutively() {
        let pool = ClientPool::new(FetchPolicy::immediate(1)).unwrap();
        let mut previous = pool.next_identity();
        for _ in 0..12 {
            let next = pool.next_identity();
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn rotation_wraps_around() {
        let pool = ClientPool::new(FetchPolicy::immediate(1)).unwrap();
        let first = pool.next_identity();
        for _ in 1..DEFAULT_IDENTITIES.len() {
            pool.next_identity();
        }
        assert_eq!(pool.next_identity(), first);
    }

    #[test]
    fn empty_identity_list_falls_back_to_defaults() {
        let pool = ClientPool::with_identities(FetchPolicy::immediate(1), Vec::new()).unwrap();
        assert_eq!(pool.next_identity(), DEFAULT_IDENTITIES[0]);
    }

    #[tokio::test]
    async fn fetch_rejects_unparseable_url() {
        let pool = ClientPool::new(FetchPolicy::immediate(1)).unwrap();
        let err = pool.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidUrl { .. }));
    }
}
