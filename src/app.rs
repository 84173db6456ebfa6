use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{
    cache::ResponseCache,
    config::AppConfig,
    error::Result,
    middleware::{self, RateLimiter},
    routes,
    services::{RequestMetrics, Services},
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct Ctx {
    pub config: Arc<AppConfig>,
    pub cache: ResponseCache,
    pub services: Arc<Services>,
    pub limiter: RateLimiter,
    pub metrics: Arc<RequestMetrics>,
}

impl Ctx {
    pub fn new(config: AppConfig) -> Result<Self> {
        let services = Services::new(&config)?;

        Ok(Self {
            cache: ResponseCache::new(&config.cache),
            limiter: RateLimiter::new(&config.rate_limit, &config.server.api_prefix),
            metrics: Arc::new(RequestMetrics::default()),
            services: Arc::new(services),
            config: Arc::new(config),
        })
    }
}

/// Assemble routes and middleware.
///
/// Outermost first: trace, request id, compression, CORS, security headers,
/// request metrics, rate limiting, body limit.
pub fn build_router(ctx: Ctx) -> Router {
    let config = Arc::clone(&ctx.config);
    let prefix = config.server.api_prefix.trim_end_matches('/');

    let api = routes::api::mount();
    let mut router = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(prefix, api)
    };
    if !prefix.is_empty() {
        router = router.route("/", get(routes::root));
    }

    router = router
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes));

    if config.rate_limit.enabled {
        router = router.layer(from_fn_with_state(
            ctx.limiter.clone(),
            middleware::rate_limit,
        ));
    }
    router = router.layer(from_fn_with_state(
        Arc::clone(&ctx.metrics),
        middleware::track_requests,
    ));
    if config.security.headers {
        router = router.layer(from_fn(middleware::security_headers));
    }
    if config.cors.enabled {
        router = router.layer(middleware::cors_layer(&config.cors));
    }
    if config.security.compression {
        router = router.layer(CompressionLayer::new());
    }

    router
        .layer(from_fn_with_state(
            !config.is_production(),
            middleware::request_id,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
