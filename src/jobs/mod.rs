//! Submit-and-poll client for remote job APIs.
//!
//! A job moves `SUBMITTED -> POLLING -> {COMPLETED | TIMED_OUT}`, or fails at
//! submission. Handles belong to the request that created them and are never
//! shared or resumed.

mod backend;
mod poller;
mod types;


pub use backend::JobBackend;
pub use poller::{Completed, JobPoller, PollOptions};
pub use types::{JobHandle, JobStatus};

/// Job lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Job did not complete after {attempts} polls")]
    PollTimeout { attempts: u32 },

    #[error("Malformed job result: {0}")]
    ResultParse(String),
}
