use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use luxlab_core::Plan;
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Plan resolved for the caller, stored as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerPlan(pub Plan);

/// Index of the configured key that authenticated the request. `None` when
/// auth is disabled and every caller shares one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallerId(pub Option<usize>);

/// Bearer-token to plan mapping used by the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<(String, Plan)>>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("keys", &self.api_keys.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AuthState {
    /// Builds auth from `LUXLAB_API_KEYS` (`token:plan` pairs, comma separated).
    ///
    /// In development, empty/missing keys disable auth and every caller is
    /// treated as `demo`. Outside development, empty/missing keys fail startup.
    pub fn from_keys(raw: Option<&str>, is_development: bool) -> anyhow::Result<Self> {
        let mut keys = Vec::new();
        for pair in raw.unwrap_or_default().split(',').map(str::trim) {
            if pair.is_empty() {
                continue;
            }
            let Some((token, plan)) = pair.rsplit_once(':') else {
                anyhow::bail!("LUXLAB_API_KEYS entry must be `token:plan`");
            };
            let token = token.trim();
            if token.is_empty() {
                anyhow::bail!("LUXLAB_API_KEYS entry has an empty token");
            }
            let plan: Plan = plan.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            keys.push((token.to_owned(), plan));
        }

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "LUXLAB_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "LUXLAB_API_KEYS is required outside development; provide comma-separated token:plan pairs"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    /// Key index and plan for `token`. Every configured key is compared in
    /// constant time.
    fn caller_for(&self, token: &str) -> Option<(usize, Plan)> {
        let mut found = None;
        for (i, (key, plan)) in self.api_keys.iter().enumerate() {
            if bool::from(key.as_bytes().ct_eq(token.as_bytes())) {
                found = Some((i, *plan));
            }
        }
        found
    }
}

#[derive(Debug, Clone, Copy)]
struct CallerWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed window per caller on the endpoints that start catalog fetches
/// (`/conversions` and `/analyze`). Polling, streaming and downloads are
/// not counted.
#[derive(Debug, Clone)]
pub struct ConversionLimit {
    max_per_window: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<CallerId, CallerWindow>>>,
}

impl ConversionLimit {
    #[must_use]
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request for `caller`. Returns `false` once its window is
    /// spent. Expired windows are dropped on every call.
    async fn admit(&self, caller: CallerId) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let entry = windows.entry(caller).or_insert(CallerWindow {
            started_at: now,
            count: 0,
        });
        if entry.count >= self.max_per_window {
            return false;
        }
        entry.count += 1;
        true
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware resolving the caller's plan from the bearer token.
///
/// With auth disabled every request proceeds as [`Plan::Demo`].
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(CallerPlan(Plan::Demo));
        req.extensions_mut().insert(CallerId(None));
        return next.run(req).await;
    }

    let caller =
        extract_bearer_token(req.headers().get(AUTHORIZATION)).and_then(|t| auth.caller_for(t));

    match caller {
        Some((index, plan)) => {
            req.extensions_mut().insert(CallerPlan(plan));
            req.extensions_mut().insert(CallerId(Some(index)));
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }),
        )
            .into_response(),
    }
}

/// Middleware applying [`ConversionLimit`] to the authenticated caller.
/// Runs after [`require_bearer_auth`].
pub async fn limit_conversions(
    State(limit): State<ConversionLimit>,
    req: Request,
    next: Next,
) -> Response {
    let caller = req
        .extensions()
        .get::<CallerId>()
        .copied()
        .unwrap_or(CallerId(None));

    if !limit.admit(caller).await {
        tracing::debug!(caller = ?caller.0, path = %req.uri().path(), "conversion limit reached");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "too many conversion requests, retry later",
                },
            }),
        )
            .into_response();
    }

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
