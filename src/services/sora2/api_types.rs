use serde::{Deserialize, Serialize};
use serde_json::Value;

// Job creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest<'a> {
    pub prompt: &'a str,
    pub channel: &'static str,
    pub page_id: u32,
    pub source: &'static str,
    pub watermark_flag: bool,
    pub private_flag: bool,
    pub is_temp: bool,
    pub vip_flag: bool,
    pub model: &'static str,
    pub video_type: &'static str,
    pub aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoResponse {
    /// Task id, string or number
    #[serde(default)]
    pub data: Value,
    pub message: Option<String>,
}

// Status polling
#[derive(Debug, Deserialize)]
pub struct TaskStatusResponse {
    pub data: Option<TaskState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    #[serde(default)]
    pub state: i64,
    /// JSON document encoded as a string
    pub complete_data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteData {
    pub video_url: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub cover: Option<String>,
    pub duration: Option<Value>,
}
