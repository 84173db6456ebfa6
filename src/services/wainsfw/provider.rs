use super::ImageRequest;
use super::api_types::{FN_INDEX, FileData, QueueEvent, QueueJoinRequest, QueueJoinResponse, TRIGGER_ID};
use crate::{
    error::{GatewayError, Result},
    jobs::{JobBackend, JobError, JobHandle, JobStatus},
    services::http::HttpClient,
};
use async_trait::async_trait;
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use serde_json::{Value, json};

const SESSION_HASH_LEN: usize = 11;

/// Gradio queue running the illustration model
pub struct WainsfwProvider {
    client: HttpClient,
}

impl WainsfwProvider {
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

fn session_hash() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_HASH_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Decode every `data:` line of a server-sent event stream
pub fn parse_events(body: &str) -> Vec<Value> {
    body.split("\n\n")
        .flat_map(str::lines)
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str(data.trim()).ok())
        .collect()
}

#[async_trait]
impl JobBackend for WainsfwProvider {
    type Request = ImageRequest;
    type Output = String;

    fn id(&self) -> &'static str {
        "wainsfw"
    }

    async fn create(&self, request: &ImageRequest) -> Result<JobHandle> {
        let hash = session_hash();
        let body = QueueJoinRequest {
            data: vec![
                json!(request.model.as_str()),
                json!(request.prompt),
                json!(request.quality_prompt),
                json!(request.negative_prompt),
                json!(0),
                json!(true),
                json!(request.width),
                json!(request.height),
                json!(request.guidance_scale),
                json!(request.inference_steps),
                json!(1),
                Value::Null,
                json!(true),
            ],
            event_data: None,
            fn_index: FN_INDEX,
            trigger_id: TRIGGER_ID,
            session_hash: &hash,
        };

        let response: QueueJoinResponse = self
            .client
            .post_json("/gradio_api/queue/join?", &body, &[])
            .await?;

        match response.event_id.filter(|id| !id.trim().is_empty()) {
            Some(_) => JobHandle::new(hash)
                .ok_or_else(|| GatewayError::Internal("empty session hash".to_string())),
            None => Err(GatewayError::upstream(self.id(), "Failed to join the generation queue")),
        }
    }

    async fn check(&self, handle: &JobHandle) -> Result<JobStatus> {
        let body = self
            .client
            .get_text("/gradio_api/queue/data", &[("session_hash", handle.as_str())])
            .await?;

        Ok(parse_events(&body)
            .into_iter()
            .find(|event| QueueEvent::deserialize(event).is_ok_and(|e| e.is_completed()))
            .map_or(JobStatus::Pending, JobStatus::Complete))
    }

    fn decode(&self, handle: &JobHandle, payload: Value) -> std::result::Result<String, JobError> {
        let event: QueueEvent = serde_json::from_value(payload)
            .map_err(|e| JobError::ResultParse(format!("unexpected queue event: {e}")))?;
        if !event.is_completed() {
            return Err(JobError::ResultParse(format!(
                "session {handle} sent {} instead of a completed event",
                event.msg
            )));
        }
        let output = event
            .output
            .ok_or_else(|| JobError::ResultParse(format!("session {handle} completed without output")))?;

        if event.success == Some(false) || output.error.is_some() {
            return Err(JobError::ResultParse(
                output.error.unwrap_or_else(|| "generation failed".to_string()),
            ));
        }

        output
            .data
            .into_iter()
            .next()
            .and_then(|first| serde_json::from_value::<FileData>(first).ok())
            .and_then(|file| file.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| JobError::ResultParse(format!("session {handle} returned no image url")))
    }
}
