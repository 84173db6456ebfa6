use axum::body::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::services::http::HttpClient;

const UPSCALE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Artwork,
    Scans,
    Photo,
}

impl Style {
    const fn form_value(self) -> &'static str {
        match self {
            Self::Artwork => "art",
            Self::Scans => "art_scan",
            Self::Photo => "photo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseLevel {
    None,
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

impl NoiseLevel {
    const fn form_value(self) -> &'static str {
        match self {
            Self::None => "-1",
            Self::Low => "0",
            Self::Medium => "1",
            Self::High => "2",
            Self::Highest => "3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scale {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "1.6x")]
    X1_6,
    #[default]
    #[serde(rename = "2x")]
    X2,
}

impl Scale {
    const fn form_value(self) -> &'static str {
        match self {
            Self::None => "-1",
            Self::X1_6 => "1",
            Self::X2 => "2",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpscaleOptions {
    pub style: Style,
    pub noise: NoiseLevel,
    pub scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpscaleMetadata {
    pub style: Style,
    pub noise_level: NoiseLevel,
    pub scale: Scale,
    pub original_size: usize,
    pub result_size: usize,
}

/// Upscaled image bytes
#[derive(Debug, Clone)]
pub struct Upscaled {
    pub bytes: Bytes,
    pub content_type: String,
    pub metadata: UpscaleMetadata,
}

/// Image upscaling through waifu2x.net
pub struct Waifu2x {
    api: HttpClient,
    source: HttpClient,
}

impl Waifu2x {
    /// `source` fetches the caller's image, `api` talks to waifu2x
    pub const fn new(api: HttpClient, source: HttpClient) -> Self {
        Self { api, source }
    }

    pub async fn upscale(&self, image_url: &str, options: UpscaleOptions) -> Result<Upscaled> {
        if !image_url.starts_with("http") {
            return Err(GatewayError::validation(
                "Image URL must start with http:// or https://",
            ));
        }

        let original = self.source.get_bytes(image_url).await?;
        if original.bytes.is_empty() {
            return Err(GatewayError::validation("Image URL returned an empty body"));
        }
        let original_size = original.bytes.len();

        let file = Part::bytes(original.bytes.to_vec())
            .file_name(format!("waifu2x_{}.jpg", chrono::Utc::now().timestamp_millis()));
        let form = Form::new()
            .text("recap", "")
            .text("url", "")
            .part("file", file)
            .text("style", options.style.form_value())
            .text("noice", options.noise.form_value())
            .text("scale", options.scale.form_value())
            .text("format", "0")
            .text("cf-turnstile-response", "");

        let origin = self.api.base_url().to_string();
        let referer = format!("{origin}/");
        let result = self
            .api
            .post_form(
                "/api",
                form,
                &[("Origin", origin.as_str()), ("Referer", referer.as_str())],
                UPSCALE_TIMEOUT,
            )
            .await?;

        if result.bytes.is_empty() {
            return Err(GatewayError::upstream("waifu2x", "Empty response from waifu2x"));
        }

        info!(original_size, result_size = result.bytes.len(), "Image upscaled");

        Ok(Upscaled {
            metadata: UpscaleMetadata {
                style: options.style,
                noise_level: options.noise,
                scale: options.scale,
                original_size,
                result_size: result.bytes.len(),
            },
            content_type: result
                .content_type
                .filter(|ct| ct.starts_with("image/"))
                .unwrap_or_else(|| "image/png".to_string()),
            bytes: result.bytes,
        })
    }
}
