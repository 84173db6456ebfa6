use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::cache::{CacheStats, ResponseCache};
use crate::config::UpstreamConfig;

/// Scheduling delay above which the runtime is reported as degraded
const SCHEDULER_LAG_LIMIT: Duration = Duration::from_millis(100);

/// Process-wide request counters
#[derive(Debug, Default)]
pub struct RequestMetrics {
    total: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
}

impl RequestMetrics {
    /// Record one finished request by status code
    pub fn record(&self, status: u16) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match status {
            400..=499 => self.client_errors.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.server_errors.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
    }

    pub fn snapshot(&self) -> RequestCounts {
        RequestCounts {
            total: self.total.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCounts {
    pub total: u64,
    pub client_errors: u64,
    pub server_errors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub timestamp: String,
    pub pid: u32,
    /// Seconds since start-up
    pub uptime: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Degraded,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub status: CheckStatus,
    #[serde(flatten)]
    pub detail: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    /// `ready` or `not_ready`
    pub status: &'static str,
    pub timestamp: String,
    pub checks: BTreeMap<&'static str, Check>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitCounts {
    pub rejected: u64,
    pub tracked_clients: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub timestamp: String,
    pub started_at: String,
    pub uptime: f64,
    pub cpus: usize,
    pub platform: &'static str,
    pub arch: &'static str,
    pub version: &'static str,
    pub requests: RequestCounts,
    pub rate_limit: RateLimitCounts,
    pub cache: CacheStats,
}

/// Liveness, readiness and metrics reporting
#[derive(Debug)]
pub struct Health {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Health {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn liveness(&self) -> Liveness {
        Liveness {
            status: "alive",
            timestamp: now(),
            pid: std::process::id(),
            uptime: self.uptime().as_secs_f64(),
        }
    }

    /// Run readiness checks; any `error` makes the service not ready
    pub async fn readiness(&self, cache: &ResponseCache, upstream: &UpstreamConfig) -> Readiness {
        let mut checks = BTreeMap::new();
        checks.insert("scheduler", scheduler_check().await);
        checks.insert("cache", cache_check(cache));
        checks.insert("upstreams", upstream_check(upstream));

        let failed = checks.values().any(|c| c.status == CheckStatus::Error);
        Readiness {
            status: if failed { "not_ready" } else { "ready" },
            timestamp: now(),
            checks,
        }
    }

    pub fn metrics(
        &self,
        requests: RequestCounts,
        rate_limit: RateLimitCounts,
        cache: CacheStats,
    ) -> Metrics {
        Metrics {
            timestamp: now(),
            started_at: self.started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            uptime: self.uptime().as_secs_f64(),
            cpus: num_cpus::get(),
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            version: env!("CARGO_PKG_VERSION"),
            requests,
            rate_limit,
            cache,
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new()
    }
}

/// Time for a yielded task to be scheduled again
async fn scheduler_check() -> Check {
    let start = Instant::now();
    tokio::task::yield_now().await;
    let lag = start.elapsed();

    let workers = tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_workers())
        .unwrap_or(0);

    Check {
        status: if lag > SCHEDULER_LAG_LIMIT {
            CheckStatus::Degraded
        } else {
            CheckStatus::Ok
        },
        detail: json!({ "lagMs": lag.as_secs_f64() * 1000.0, "workers": workers }),
    }
}

fn cache_check(cache: &ResponseCache) -> Check {
    let stats = cache.stats();
    Check {
        status: CheckStatus::Ok,
        detail: json!({ "enabled": stats.enabled, "entries": stats.entries }),
    }
}

/// Every configured base URL must be an absolute http(s) URL
fn upstream_check(upstream: &UpstreamConfig) -> Check {
    let invalid: Vec<&str> = upstream
        .base_urls()
        .into_iter()
        .filter(|(_, url)| {
            reqwest::Url::parse(url)
                .map(|u| !matches!(u.scheme(), "http" | "https"))
                .unwrap_or(true)
        })
        .map(|(name, _)| name)
        .collect();

    if invalid.is_empty() {
        Check {
            status: CheckStatus::Ok,
            detail: json!({ "configured": upstream.base_urls().len() }),
        }
    } else {
        Check {
            status: CheckStatus::Error,
            detail: json!({ "invalid": invalid }),
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
