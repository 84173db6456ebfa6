use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::{
    ApiResponse, ApiResult, Ctx,
    services::health::{Liveness, Metrics, RateLimitCounts, Readiness},
};

/// Liveness probe
async fn health(State(ctx): State<Ctx>) -> ApiResult<Liveness> {
    Ok(ApiResponse::ok(
        "Service is alive",
        ctx.services.health.liveness(),
    ))
}

/// Readiness probe, 503 when any check fails
async fn ready(State(ctx): State<Ctx>) -> ApiResult<Readiness> {
    let readiness = ctx
        .services
        .health
        .readiness(&ctx.cache, &ctx.config.upstream)
        .await;

    if readiness.is_ready() {
        return Ok(ApiResponse::ok("Service is ready", readiness));
    }

    let mut response = ApiResponse::ok("Service is not ready", readiness)
        .with_status(StatusCode::SERVICE_UNAVAILABLE);
    response.success = false;
    Ok(response)
}

async fn metrics(State(ctx): State<Ctx>) -> ApiResult<Metrics> {
    let rate_limit = RateLimitCounts {
        rejected: ctx.limiter.rejected_total(),
        tracked_clients: ctx.limiter.tracked_clients(),
    };

    Ok(ApiResponse::ok(
        "Metrics retrieved successfully",
        ctx.services
            .health
            .metrics(ctx.metrics.snapshot(), rate_limit, ctx.cache.stats()),
    ))
}

pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
}
