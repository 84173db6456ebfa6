use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    ApiResponse, ApiResult, Ctx,
    error::GatewayError,
    services::{LinkPreview, Preset, Screenshot, ScreenshotOptions},
    validate::{ValidatedQuery, http_url},
};

const PNG_CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(length(max = 2000, message = "URL is too long"), custom(function = "http_url"))]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotQuery {
    #[validate(length(max = 2000, message = "URL is too long"), custom(function = "http_url"))]
    pub url: String,
    #[validate(range(min = 100, max = 4096, message = "Width must be between 100 and 4096 pixels"))]
    pub width: Option<u32>,
    #[validate(range(min = 100, max = 4096, message = "Height must be between 100 and 4096 pixels"))]
    pub height: Option<u32>,
    pub full_page: Option<bool>,
}

impl From<ScreenshotQuery> for ScreenshotOptions {
    fn from(query: ScreenshotQuery) -> Self {
        let (width, height) = Preset::Desktop.dimensions();
        Self {
            url: query.url.trim().to_string(),
            width: query.width.unwrap_or(width),
            height: query.height.unwrap_or(height),
            full_page: query.full_page.unwrap_or(false),
        }
    }
}

/// Capture a page and return the screenshot URL
async fn ssweb(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<ScreenshotQuery>,
) -> ApiResult<Screenshot> {
    let shot = ctx.services.screenshots.capture(&query.into()).await?;
    Ok(ApiResponse::ok("Screenshot captured successfully", shot))
}

/// Capture with a fixed viewport and proxy the PNG
async fn ssweb_png(ctx: &Ctx, url: &str, preset: Preset) -> Result<Response, GatewayError> {
    let png = ctx.services.screenshots.capture_png(url.trim(), preset).await?;
    let content_type = png
        .content_type
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or_else(|| "image/png".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, PNG_CACHE_CONTROL.to_string()),
        ],
        png.bytes,
    )
        .into_response())
}

async fn ssweb_pc(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Response, GatewayError> {
    ssweb_png(&ctx, &query.url, Preset::Desktop).await
}

async fn ssweb_hp(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Response, GatewayError> {
    ssweb_png(&ctx, &query.url, Preset::Mobile).await
}

/// Title, description and image of a page
async fn preview(
    State(ctx): State<Ctx>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<LinkPreview> {
    let preview = ctx.services.previews.preview(query.url.trim()).await?;
    Ok(ApiResponse::ok("Preview generated successfully", preview))
}

pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/tools/ssweb", get(ssweb))
        .route("/tools/ssweb-pc", get(ssweb_pc))
        .route("/tools/ssweb-hp", get(ssweb_hp))
        .route("/tools/preview", get(preview))
}
