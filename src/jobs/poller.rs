use std::time::Duration;
use tracing::{debug, info, warn};

use super::{JobBackend, JobError, JobHandle, JobStatus};
use crate::config::PollerConfig;

/// Cadence and budget for one poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Fixed sleep before every status check
    pub interval: Duration,
    pub max_attempts: u32,
    /// Bound on a single status call
    pub per_poll_timeout: Duration,
    /// Bound on the job creation call
    pub submit_timeout: Duration,
}

impl PollOptions {
    /// Options from configuration with a specific attempt budget
    pub const fn from_config(config: &PollerConfig, max_attempts: u32) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts,
            per_poll_timeout: Duration::from_millis(config.per_poll_timeout_ms),
            submit_timeout: Duration::from_millis(config.submit_timeout_ms),
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from_config(&PollerConfig::default(), PollerConfig::default().image_max_attempts)
    }
}

/// A finished job
#[derive(Debug, Clone)]
pub struct Completed<T> {
    pub handle: JobHandle,
    pub output: T,
    /// Number of status calls issued
    pub attempts: u32,
}

/// Submit-then-poll driver for [`JobBackend`]s.
///
/// Transient status failures are swallowed and retried on the next tick at
/// the same cadence; only the attempt budget ends the loop early.
#[derive(Debug, Clone, Copy)]
pub struct JobPoller {
    options: PollOptions,
}

impl JobPoller {
    pub const fn new(options: PollOptions) -> Self {
        Self { options }
    }

    /// Start a job. Exactly one creation call, never retried.
    pub async fn submit<B: JobBackend>(
        &self,
        backend: &B,
        request: &B::Request,
    ) -> Result<JobHandle, JobError> {
        let handle = tokio::time::timeout(self.options.submit_timeout, backend.create(request))
            .await
            .map_err(|_| {
                JobError::Submission(format!(
                    "{} did not answer within {:?}",
                    backend.id(),
                    self.options.submit_timeout
                ))
            })?
            .map_err(|e| JobError::Submission(e.to_string()))?;

        info!(backend = backend.id(), handle = %handle, "Job submitted");
        Ok(handle)
    }

    /// Poll `handle` until it completes or the attempt budget runs out
    pub async fn poll_until_done<B: JobBackend>(
        &self,
        backend: &B,
        handle: &JobHandle,
    ) -> Result<Completed<B::Output>, JobError> {
        for attempt in 1..=self.options.max_attempts {
            tokio::time::sleep(self.options.interval).await;

            let status = match tokio::time::timeout(
                self.options.per_poll_timeout,
                backend.check(handle),
            )
            .await
            {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    debug!(backend = backend.id(), %handle, attempt, error = %e, "Poll failed, continuing");
                    continue;
                }
                Err(_) => {
                    debug!(backend = backend.id(), %handle, attempt, "Poll timed out, continuing");
                    continue;
                }
            };

            match status {
                JobStatus::Pending => {
                    debug!(backend = backend.id(), %handle, attempt, "Job pending");
                }
                JobStatus::Complete(payload) => {
                    info!(backend = backend.id(), %handle, attempt, "Job completed");
                    let output = backend.decode(handle, payload)?;
                    return Ok(Completed {
                        handle: handle.clone(),
                        output,
                        attempts: attempt,
                    });
                }
            }
        }

        warn!(
            backend = backend.id(),
            %handle,
            attempts = self.options.max_attempts,
            "Job did not complete in time"
        );
        Err(JobError::PollTimeout {
            attempts: self.options.max_attempts,
        })
    }

    /// Submit and wait for the result
    pub async fn run<B: JobBackend>(
        &self,
        backend: &B,
        request: &B::Request,
    ) -> Result<Completed<B::Output>, JobError> {
        let handle = self.submit(backend, request).await?;
        self.poll_until_done(backend, &handle).await
    }
}
