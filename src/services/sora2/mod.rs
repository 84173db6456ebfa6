mod api_types;
mod provider;

pub use provider::Sora2Provider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::jobs::JobPoller;

/// Output orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    #[default]
    Portrait,
    Landscape,
}

impl AspectRatio {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// Parameters that start a video job
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub ratio: AspectRatio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub url: String,
    pub thumbnail: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

/// Finished video generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJobResult {
    pub task_id: String,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub video: VideoArtifact,
    pub metadata: GenerationMetadata,
    /// Status calls it took
    pub attempts: u32,
}

/// Video generation through the Sora2 job API
pub struct Sora2 {
    provider: Sora2Provider,
    poller: JobPoller,
}

impl Sora2 {
    pub const fn new(provider: Sora2Provider, poller: JobPoller) -> Self {
        Self { provider, poller }
    }

    /// Submit a prompt and wait for the rendered video
    pub async fn generate(&self, request: VideoRequest) -> Result<VideoJobResult> {
        let done = self.poller.run(&self.provider, &request).await?;

        Ok(VideoJobResult {
            task_id: done.handle.to_string(),
            prompt: request.prompt,
            aspect_ratio: request.ratio,
            video: done.output,
            metadata: GenerationMetadata {
                model: provider::MODEL.to_string(),
                created_at: Utc::now(),
                status: "completed".to_string(),
            },
            attempts: done.attempts,
        })
    }
}
