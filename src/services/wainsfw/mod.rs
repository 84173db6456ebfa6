mod api_types;
mod provider;

pub use provider::{WainsfwProvider, parse_events};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::jobs::JobPoller;

pub const DEFAULT_QUALITY_PROMPT: &str = "masterpiece, best quality, fine details, high quality";
pub const DEFAULT_NEGATIVE_PROMPT: &str = "lowres, bad anatomy, bad hands, text, error, missing finger, extra digits, fewer digits, cropped, worst quality, low quality, low score, bad score, average score, signature, watermark, username, blurry";

/// Model checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaiModel {
    #[default]
    V140,
    V130,
    V120,
}

impl WaiModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V140 => "v140",
            Self::V130 => "v130",
            Self::V120 => "v120",
        }
    }
}

/// Parameters that start an image job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    pub model: WaiModel,
    pub quality_prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub guidance_scale: f64,
    pub inference_steps: u32,
}

impl ImageRequest {
    /// Request with the default generation settings
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: WaiModel::default(),
            quality_prompt: DEFAULT_QUALITY_PROMPT.to_string(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            width: 1024,
            height: 1024,
            guidance_scale: 6.0,
            inference_steps: 30,
        }
    }
}

/// Finished image generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageJobResult {
    pub prompt: String,
    pub image_url: String,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub model: WaiModel,
    pub width: u32,
    pub height: u32,
    pub guidance_scale: f64,
    pub inference_steps: u32,
    pub quality_prompt: String,
    pub negative_prompt: String,
    pub generated_at: DateTime<Utc>,
    pub attempts: u32,
}

/// Image generation through the Gradio queue
pub struct Wainsfw {
    provider: WainsfwProvider,
    poller: JobPoller,
}

impl Wainsfw {
    pub const fn new(provider: WainsfwProvider, poller: JobPoller) -> Self {
        Self { provider, poller }
    }

    pub async fn generate(&self, request: ImageRequest) -> Result<ImageJobResult> {
        let done = self.poller.run(&self.provider, &request).await?;

        Ok(ImageJobResult {
            image_url: done.output,
            metadata: ImageMetadata {
                model: request.model,
                width: request.width,
                height: request.height,
                guidance_scale: request.guidance_scale,
                inference_steps: request.inference_steps,
                quality_prompt: request.quality_prompt,
                negative_prompt: request.negative_prompt,
                generated_at: Utc::now(),
                attempts: done.attempts,
            },
            prompt: request.prompt,
        })
    }
}
