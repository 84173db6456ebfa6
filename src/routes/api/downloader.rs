use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use validator::Validate;

use crate::{
    ApiResponse, ApiResult, Ctx,
    cache::CacheKey,
    services::{AioMedia, ThreadsMedia, VideyLink},
    validate::ValidatedQuery,
};

#[derive(Debug, Deserialize, Validate)]
pub struct UrlQuery {
    #[validate(length(min = 1, max = 2000, message = "Parameter url is required"))]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AioQuery {
    #[validate(length(min = 1, max = 2000, message = "Parameter url is required"))]
    pub url: String,
    /// Explicit platform; detected from the URL when omitted
    pub platform: Option<String>,
}

async fn videy(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<UrlQuery>,
) -> ApiResult<VideyLink> {
    let link = ctx.services.videy.resolve(query.url.trim())?;
    Ok(ApiResponse::ok("Download link generated successfully", link))
}

async fn threads(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<UrlQuery>,
) -> ApiResult<ThreadsMedia> {
    let url = query.url.trim();
    let cache_key = CacheKey::new("threads").part(url);

    if let Some(media) = ctx
        .cache
        .get(&cache_key)
        .await
        .and_then(|value| serde_json::from_value::<ThreadsMedia>(value).ok())
    {
        return Ok(ApiResponse::ok("Response from cache", media).with_meta("cached", true));
    }

    let media = ctx.services.threads.download(url).await?;
    if let Ok(value) = serde_json::to_value(&media) {
        ctx.cache.insert(cache_key, value).await;
    }

    Ok(ApiResponse::ok("Media fetched successfully", media).with_meta("cached", false))
}

/// All-in-one downloader
async fn aio(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<AioQuery>,
) -> ApiResult<AioMedia> {
    let media = ctx
        .services
        .aio
        .download(query.url.trim(), query.platform.as_deref())
        .await?;

    let platform = media.platform.as_str();
    Ok(ApiResponse::ok("Media fetched successfully", media).with_meta("platform", platform))
}

pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/downloader/videy", get(videy))
        .route("/downloader/threads", get(threads))
        .route("/downloader/aio", get(aio))
}
