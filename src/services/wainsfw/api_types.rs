use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gradio function slot of the text-to-image pipeline
pub const FN_INDEX: u32 = 9;
pub const TRIGGER_ID: u32 = 18;

// Queue join
#[derive(Debug, Serialize)]
pub struct QueueJoinRequest<'a> {
    /// Positional pipeline arguments
    pub data: Vec<Value>,
    pub event_data: Option<Value>,
    pub fn_index: u32,
    pub trigger_id: u32,
    pub session_hash: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct QueueJoinResponse {
    pub event_id: Option<String>,
}

// Queue events, one per `data:` line
#[derive(Debug, Deserialize)]
pub struct QueueEvent {
    pub msg: String,
    pub success: Option<bool>,
    pub output: Option<QueueOutput>,
}

impl QueueEvent {
    pub const COMPLETED: &'static str = "process_completed";

    pub fn is_completed(&self) -> bool {
        self.msg == Self::COMPLETED
    }
}

#[derive(Debug, Deserialize)]
pub struct QueueOutput {
    #[serde(default)]
    pub data: Vec<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileData {
    pub url: Option<String>,
}
