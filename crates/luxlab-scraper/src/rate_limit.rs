//! Retry and backoff for catalog page fetches.
//!
//! Block (403) and throttle (429) responses are retried after a randomized
//! delay scaled by severity, throttling waiting longest. Server errors and
//! transport failures are retried after a shorter delay. Every other failure
//! (404, other 4xx, bad URLs) is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    Blocked,
    Throttled { retry_after_secs: Option<u64> },
    Transient,
}

/// Maps an error to its retry signal, or `None` when retrying cannot help.
pub(crate) fn classify(err: &ScraperError) -> Option<Signal> {
    match err {
        ScraperError::Blocked { .. } => Some(Signal::Blocked),
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => Some(Signal::Throttled {
            retry_after_secs: *retry_after_secs,
        }),
        ScraperError::ServerError { .. } | ScraperError::Http(_) => Some(Signal::Transient),
        ScraperError::NotFound { .. }
        | ScraperError::UnexpectedStatus { .. }
        | ScraperError::FetchExhausted { .. }
        | ScraperError::InvalidUrl { .. }
        | ScraperError::NoProductsFound { .. }
        | ScraperError::Cancelled
        | ScraperError::IllegalTransition { .. } => None,
    }
}

/// Delay before the next attempt. `roll` is a uniform sample in `[0, 1)`.
///
/// | Signal     | Delay                          |
/// |------------|--------------------------------|
/// | Blocked    | base × U(1, 2)                 |
/// | Throttled  | base × U(2, 4), ≥ `Retry-After`|
/// | Transient  | base × U(0.5, 1)               |
///
/// Capped at 60 s.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn backoff_delay(signal: Signal, backoff_base_ms: u64, roll: f64) -> Duration {
    let (low, high) = match signal {
        Signal::Blocked => (1.0, 2.0),
        Signal::Throttled { .. } => (2.0, 4.0),
        Signal::Transient => (0.5, 1.0),
    };
    let factor = low + (high - low) * roll.clamp(0.0, 1.0);
    let mut delay_ms = (backoff_base_ms as f64 * factor) as u64;

    if let Signal::Throttled {
        retry_after_secs: Some(secs),
    } = signal
    {
        delay_ms = delay_ms.max(secs.saturating_mul(1_000));
    }

    Duration::from_millis(delay_ms.min(MAX_DELAY_MS))
}

/// Runs `operation` up to `max_attempts` times.
///
/// `operation` receives the 1-based attempt number so callers can rotate
/// identities per attempt. Retriable failures that use up every attempt
/// become [`ScraperError::FetchExhausted`]; non-retriable failures are
/// returned as-is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_ms: u64,
    url: &str,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(signal) = classify(&err) else {
            return Err(err);
        };

        if attempt >= max_attempts {
            return Err(ScraperError::FetchExhausted {
                url: url.to_owned(),
                attempts: attempt,
                last_error: err.to_string(),
            });
        }

        let delay = backoff_delay(signal, backoff_base_ms, rand::random::<f64>());
        tracing::warn!(
            url,
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "page fetch failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
