use axum::{
    Router,
    extract::State,
    http::{HeaderName, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use crate::{
    ApiResponse, ApiResult, Ctx,
    cache::CacheKey,
    error::GatewayError,
    services::{
        GeminiReply, UpscaleOptions,
        sora2::{AspectRatio, VideoJobResult, VideoRequest},
        waifu2x::{NoiseLevel, Scale, Style},
        wainsfw::{ImageJobResult, ImageRequest, WaiModel},
    },
    validate::{ValidatedJson, ValidatedQuery, http_url, not_blank, trimmed_min_5, trimmed_min_10},
};

static X_ORIGINAL_SIZE: HeaderName = HeaderName::from_static("x-original-size");
static X_RESULT_SIZE: HeaderName = HeaderName::from_static("x-result-size");

#[derive(Debug, Deserialize, Validate)]
pub struct GeminiQuery {
    #[validate(
        length(max = 5000, message = "Text must be between 1 and 5000 characters"),
        custom(function = "not_blank", message = "Text must be between 1 and 5000 characters")
    )]
    pub text: String,
    /// Falls back to the configured key when omitted
    #[validate(length(min = 10, message = "API key must be at least 10 characters"))]
    pub apikey: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GeminiSystemQuery {
    #[validate(
        length(max = 5000, message = "Text must be between 1 and 5000 characters"),
        custom(function = "not_blank", message = "Text must be between 1 and 5000 characters")
    )]
    pub text: String,
    #[validate(
        length(max = 2000, message = "System instruction must be between 1 and 2000 characters"),
        custom(function = "not_blank", message = "System instruction must be between 1 and 2000 characters")
    )]
    pub system: String,
    #[validate(length(min = 10, message = "API key must be at least 10 characters"))]
    pub apikey: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Sora2Body {
    #[validate(custom(function = "trimmed_min_10", message = "Prompt must be at least 10 characters"))]
    pub prompt: String,
    #[serde(default)]
    pub ratio: AspectRatio,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WainsfwBody {
    #[validate(custom(function = "trimmed_min_5", message = "Prompt must be at least 5 characters"))]
    pub prompt: String,
    #[serde(default)]
    pub model: WaiModel,
    #[validate(range(min = 256, max = 2048, message = "Width must be between 256 and 2048"))]
    pub width: Option<u32>,
    #[validate(range(min = 256, max = 2048, message = "Height must be between 256 and 2048"))]
    pub height: Option<u32>,
    #[validate(range(min = 0.0, max = 20.0, message = "Guidance scale must be between 0 and 20"))]
    pub guidance_scale: Option<f64>,
    #[validate(range(min = 1, max = 100, message = "Inference steps must be between 1 and 100"))]
    pub inference_steps: Option<u32>,
    pub quality_prompt: Option<String>,
    pub negative_prompt: Option<String>,
}

impl From<WainsfwBody> for ImageRequest {
    fn from(body: WainsfwBody) -> Self {
        let mut request = Self::new(body.prompt);
        request.model = body.model;
        if let Some(width) = body.width {
            request.width = width;
        }
        if let Some(height) = body.height {
            request.height = height;
        }
        if let Some(scale) = body.guidance_scale {
            request.guidance_scale = scale;
        }
        if let Some(steps) = body.inference_steps {
            request.inference_steps = steps;
        }
        if let Some(prompt) = body.quality_prompt.filter(|p| !p.trim().is_empty()) {
            request.quality_prompt = prompt;
        }
        if let Some(prompt) = body.negative_prompt.filter(|p| !p.trim().is_empty()) {
            request.negative_prompt = prompt;
        }
        request
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct Waifu2xBody {
    #[validate(custom(function = "http_url"))]
    pub image: String,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub noice: NoiseLevel,
    #[serde(default)]
    pub upscaling: Scale,
}

/// Text generation, cached per text and key
async fn gemini(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<GeminiQuery>,
) -> ApiResult<GeminiReply> {
    let gemini = &ctx.services.gemini;
    let key = gemini.resolve_key(query.apikey.as_deref())?;
    let cache_key = CacheKey::new("gemini")
        .part(gemini.model())
        .part(&query.text)
        .secret(key);

    if let Some(reply) = ctx
        .cache
        .get(&cache_key)
        .await
        .and_then(|value| serde_json::from_value::<GeminiReply>(value).ok())
    {
        debug!("Gemini cache hit");
        return Ok(ApiResponse::ok("Response from cache", reply)
            .with_meta("cached", true)
            .with_meta("model", gemini.model()));
    }

    let reply = gemini.generate(&query.text, None, key).await?;
    if let Ok(value) = serde_json::to_value(&reply) {
        ctx.cache.insert(cache_key, value).await;
    }

    Ok(ApiResponse::ok("Response generated successfully", reply)
        .with_meta("cached", false)
        .with_meta("model", gemini.model()))
}

/// Text generation with a system instruction
async fn gemini_with_system(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<GeminiSystemQuery>,
) -> ApiResult<GeminiReply> {
    let gemini = &ctx.services.gemini;
    let key = gemini.resolve_key(query.apikey.as_deref())?;
    let reply = gemini.generate(&query.text, Some(&query.system), key).await?;

    Ok(ApiResponse::ok("Response generated successfully", reply).with_meta("model", gemini.model()))
}

async fn sora2(
    State(ctx): State<Ctx>,
    ValidatedJson(body): ValidatedJson<Sora2Body>,
) -> ApiResult<VideoJobResult> {
    let result = ctx
        .services
        .sora2
        .generate(VideoRequest {
            prompt: body.prompt,
            ratio: body.ratio,
        })
        .await?;

    Ok(ApiResponse::ok("Video generated successfully", result))
}

async fn wainsfw(
    State(ctx): State<Ctx>,
    ValidatedJson(body): ValidatedJson<WainsfwBody>,
) -> ApiResult<ImageJobResult> {
    let result = ctx.services.wainsfw.generate(body.into()).await?;

    Ok(ApiResponse::ok("Image generated successfully", result))
}

/// Upscale an image and return its bytes
async fn waifu2x(
    State(ctx): State<Ctx>,
    ValidatedJson(body): ValidatedJson<Waifu2xBody>,
) -> Result<Response, GatewayError> {
    let options = UpscaleOptions {
        style: body.style,
        noise: body.noice,
        scale: body.upscaling,
    };
    let upscaled = ctx.services.waifu2x.upscale(body.image.trim(), options).await?;

    let headers = [
        (header::CONTENT_TYPE, upscaled.content_type),
        (
            X_ORIGINAL_SIZE.clone(),
            upscaled.metadata.original_size.to_string(),
        ),
        (
            X_RESULT_SIZE.clone(),
            upscaled.metadata.result_size.to_string(),
        ),
    ];
    Ok((headers, upscaled.bytes).into_response())
}

pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/ai/gemini", get(gemini))
        .route("/ai/gemini-with-system", get(gemini_with_system))
        .route("/ai/sora2", post(sora2))
        .route("/ai/wainsfw", post(wainsfw))
        .route("/ai/waifu2x", post(waifu2x))
}
