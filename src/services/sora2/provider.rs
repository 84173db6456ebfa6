use super::api_types::{CompleteData, CreateVideoRequest, CreateVideoResponse, TaskStatusResponse};
use super::{VideoArtifact, VideoRequest};
use crate::{
    error::{GatewayError, Result},
    jobs::{JobBackend, JobError, JobHandle, JobStatus},
    services::http::HttpClient,
};
use async_trait::async_trait;
use serde_json::Value;

pub(super) const MODEL: &str = "sora_video2";
const CHANNEL: &str = "SORA2";
const PAGE_ID: u32 = 536;
const SOURCE: &str = "bylo.ai";
const ORIGIN: &str = "https://bylo.ai";
const REFERER: &str = "https://bylo.ai/features/sora-2";

/// Text-to-video job API
pub struct Sora2Provider {
    client: HttpClient,
}

impl Sora2Provider {
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobBackend for Sora2Provider {
    type Request = VideoRequest;
    type Output = VideoArtifact;

    fn id(&self) -> &'static str {
        "sora2"
    }

    async fn create(&self, request: &VideoRequest) -> Result<JobHandle> {
        let body = CreateVideoRequest {
            prompt: &request.prompt,
            channel: CHANNEL,
            page_id: PAGE_ID,
            source: SOURCE,
            watermark_flag: true,
            private_flag: true,
            is_temp: true,
            vip_flag: true,
            model: MODEL,
            video_type: "text-to-video",
            aspect_ratio: request.ratio.as_str(),
        };

        let response: CreateVideoResponse = self
            .client
            .post_json(
                "/video/create",
                &body,
                &[("Origin", ORIGIN), ("Referer", REFERER)],
            )
            .await?;

        JobHandle::from_json(&response.data).ok_or_else(|| {
            GatewayError::upstream(
                self.id(),
                response
                    .message
                    .unwrap_or_else(|| "Video task was not created".to_string()),
            )
        })
    }

    async fn check(&self, handle: &JobHandle) -> Result<JobStatus> {
        let response: TaskStatusResponse = self
            .client
            .get(&format!("/{handle}"), &[("channel", CHANNEL)])
            .await?;

        Ok(match response.data {
            Some(task) if task.state > 0 => {
                JobStatus::Complete(task.complete_data.map_or(Value::Null, Value::String))
            }
            _ => JobStatus::Pending,
        })
    }

    fn decode(&self, handle: &JobHandle, payload: Value) -> std::result::Result<VideoArtifact, JobError> {
        let raw = payload.as_str().ok_or_else(|| {
            JobError::ResultParse(format!("task {handle} finished without completeData"))
        })?;
        let data: CompleteData = serde_json::from_str(raw)
            .map_err(|e| JobError::ResultParse(format!("completeData is not valid JSON: {e}")))?;

        let url = first_non_empty([data.video_url, data.url])
            .ok_or_else(|| JobError::ResultParse(format!("task {handle} has no video url")))?;

        Ok(VideoArtifact {
            url,
            thumbnail: first_non_empty([data.thumbnail, data.cover]),
            duration: data
                .duration
                .and_then(|d| d.as_f64().or_else(|| d.as_str()?.parse().ok())),
        })
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|value| !value.is_empty())
}
