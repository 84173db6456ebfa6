use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::{Entry, future::Cache, ops::compute::Op};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config::RateLimitConfig;
use crate::error::GatewayError;

static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Health routes under the API prefix that are never counted
const EXEMPT_ROUTES: [&str; 2] = ["/health", "/ready"];

/// One client's counter for the current window
#[derive(Debug)]
struct Window {
    started: Instant,
    count: AtomicU32,
}

impl Window {
    fn open() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            count: AtomicU32::new(0),
        })
    }
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets
    pub reset_after: Duration,
}

impl Decision {
    fn reset_secs(&self) -> u64 {
        self.reset_after.as_millis().div_ceil(1000).max(1) as u64
    }

    fn apply_headers(&self, headers: &mut HeaderMap) {
        let reset_at = chrono::Utc::now().timestamp() as u64 + self.reset_secs();
        headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(self.remaining));
        headers.insert(X_RATELIMIT_RESET.clone(), HeaderValue::from(reset_at));
    }
}

/// Fixed-window request counter keyed by client.
///
/// Windows live in a moka cache whose TTL equals the window length, so idle
/// clients drop out on their own.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Cache<String, Arc<Window>>,
    max_requests: u32,
    window: Duration,
    trust_proxy: bool,
    exempt: Arc<[String]>,
    rejected: Arc<AtomicU64>,
}

impl RateLimiter {
    /// `api_prefix` locates the health routes that bypass counting
    pub fn new(config: &RateLimitConfig, api_prefix: &str) -> Self {
        let windows = Cache::builder()
            .max_capacity(config.max_tracked_clients)
            .time_to_live(config.window())
            .build();

        Self {
            windows,
            max_requests: config.max_requests,
            window: config.window(),
            trust_proxy: config.trust_proxy,
            exempt: exempt_paths(api_prefix),
            rejected: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Count one request for `key`
    pub async fn check(&self, key: &str) -> Decision {
        let window = self.current_window(key).await;
        let count = window.count.fetch_add(1, Ordering::SeqCst) + 1;
        let reset_after = self.window.saturating_sub(window.started.elapsed());
        let allowed = count <= self.max_requests;
        if !allowed {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }

        Decision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_after,
        }
    }

    /// Open window for `key`, replacing an expired one under the entry lock
    async fn current_window(&self, key: &str) -> Arc<Window> {
        let length = self.window;
        self.windows
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().started.elapsed() < length => Op::Nop,
                    _ => Op::Put(Window::open()),
                };
                std::future::ready(op)
            })
            .await
            .into_entry()
            .map_or_else(Window::open, Entry::into_value)
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt.iter().any(|exempt| exempt == path)
    }

    /// Total requests rejected since start-up
    pub fn rejected_total(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Number of clients with an open window
    pub fn tracked_clients(&self) -> u64 {
        self.windows.entry_count()
    }

    /// Client key: first forwarded address when behind a trusted proxy,
    /// otherwise the peer address
    fn client_key(&self, req: &Request) -> String {
        if self.trust_proxy
            && let Some(forwarded) = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string())
    }
}

/// Reject requests over the per-client budget with 429
pub async fn rate_limit(State(limiter): State<RateLimiter>, req: Request, next: Next) -> Response {
    if limiter.is_exempt(req.uri().path()) {
        return next.run(req).await;
    }

    let key = limiter.client_key(&req);
    let decision = limiter.check(&key).await;

    if !decision.allowed {
        warn!(
            client = %key,
            path = %req.uri().path(),
            method = %req.method(),
            retry_after = decision.reset_secs(),
            "Rate limit exceeded"
        );

        let mut response = GatewayError::RateLimited {
            retry_after: Duration::from_secs(decision.reset_secs()),
        }
        .into_response();
        decision.apply_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(req).await;
    decision.apply_headers(response.headers_mut());
    response
}

fn exempt_paths(api_prefix: &str) -> Arc<[String]> {
    let prefix = api_prefix.trim_end_matches('/');
    EXEMPT_ROUTES
        .iter()
        .map(|route| format!("{prefix}{route}"))
        .collect()
}
