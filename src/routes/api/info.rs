use axum::{Router, extract::State, routing::get};
use serde::Serialize;

use crate::{ApiResponse, ApiResult, Ctx};

/// (method, path, description) of every public endpoint
const ENDPOINTS: [(&str, &str, &str); 17] = [
    ("GET", "/health", "Liveness probe"),
    ("GET", "/ready", "Readiness probe"),
    ("GET", "/metrics", "Process and request metrics"),
    ("GET", "/info", "Service information"),
    ("GET", "/ai/gemini", "Text generation with Gemini"),
    ("GET", "/ai/gemini-with-system", "Gemini with a system instruction"),
    ("POST", "/ai/sora2", "Text-to-video generation"),
    ("POST", "/ai/wainsfw", "Illustration generation"),
    ("POST", "/ai/waifu2x", "Image upscaling"),
    ("GET", "/downloader/videy", "Videy download link"),
    ("GET", "/downloader/threads", "Threads media download"),
    ("GET", "/downloader/aio", "All-in-one media downloader"),
    ("GET", "/tools/ssweb", "Website screenshot"),
    ("GET", "/tools/ssweb-pc", "Desktop screenshot as PNG"),
    ("GET", "/tools/ssweb-hp", "Mobile screenshot as PNG"),
    ("GET", "/tools/preview", "Link preview"),
    ("GET", "/", "Redirects here"),
];

const FEATURES: [&str; 6] = [
    "Rate limiting",
    "Request IDs",
    "Response caching",
    "Async job polling",
    "Security headers",
    "Structured logging",
];

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: String,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub environment: &'static str,
    pub api_prefix: String,
    pub endpoints: Vec<Endpoint>,
    pub features: &'static [&'static str],
}

async fn info(State(ctx): State<Ctx>) -> ApiResult<ServiceInfo> {
    let server = &ctx.config.server;
    let endpoints = ENDPOINTS
        .iter()
        .map(|&(method, path, description)| Endpoint {
            method,
            path: if path == "/" {
                path.to_string()
            } else {
                format!("{}{path}", server.api_prefix)
            },
            description,
        })
        .collect();

    Ok(ApiResponse::ok(
        "Service information retrieved successfully",
        ServiceInfo {
            name: server.name.clone(),
            version: server.version.clone(),
            environment: if ctx.config.is_production() {
                "production"
            } else {
                "development"
            },
            api_prefix: server.api_prefix.clone(),
            endpoints,
            features: &FEATURES,
        },
    ))
}

pub fn mount() -> Router<Ctx> {
    Router::new().route("/info", get(info))
}
