use async_trait::async_trait;
use serde_json::Value;

use super::{JobError, JobHandle, JobStatus};
use crate::error::Result;

/// A remote API that runs work asynchronously behind a handle
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Payload that starts a job
    type Request: Send + Sync;
    /// Artifact descriptor decoded from a completed job
    type Output: Send;

    /// Backend identifier used in logs (e.g. "sora2")
    fn id(&self) -> &'static str;

    /// Start a job and return its handle
    async fn create(&self, request: &Self::Request) -> Result<JobHandle>;

    /// Read the job's current status
    async fn check(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Turn a completion payload into the final artifact
    fn decode(&self, handle: &JobHandle, payload: Value) -> std::result::Result<Self::Output, JobError>;
}
