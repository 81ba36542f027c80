//! # Prediction Polling
//!
//! Drives an asynchronous prediction to completion: submit once, then check
//! its status at a fixed interval until it reaches a terminal state or the
//! attempt budget runs out. Status transitions are only ever observed from
//! the provider, never inferred locally. Nothing here retries a failed call;
//! a failed status check ends the whole job.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    adapters::PredictionUpstream,
    config::Config,
    error::RelayError,
    schemas::{ImageJobRequest, PredictionJob, PredictionStatus},
};

pub const MAX_POLL_ATTEMPTS: u32 = 120;
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

pub const GENERATION_FAILED: &str = "Image generation failed";
pub const GENERATION_TIMED_OUT: &str = "Image generation timed out";
pub const NO_IMAGE_GENERATED: &str = "No image was generated";

/// How often and how many times a pending job is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_POLL_ATTEMPTS,
            interval: POLL_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_poll_attempts, config.poll_interval())
    }
}

/// Check `job` until it is terminal or `policy.max_attempts` checks have been
/// made. Every check is preceded by one `policy.interval` wait. Returns the
/// last observed job, terminal or not.
pub async fn poll_until_terminal<U>(
    upstream: &U,
    mut job: PredictionJob,
    api_key: &str,
    policy: PollPolicy,
) -> Result<PredictionJob, RelayError>
where
    U: PredictionUpstream + ?Sized,
{
    for attempt in 0..policy.max_attempts {
        if job.status.is_terminal() {
            break;
        }

        sleep(policy.interval).await;

        debug!(attempt, status = ?job.status, "Checking prediction status");
        job = upstream.fetch_prediction(&job.poll_url, api_key).await?;
    }

    Ok(job)
}

/// Map the last observed job to the caller's result.
///
/// A `canceled` job takes the same path as one that never finished.
pub fn interpret_outcome(job: &PredictionJob) -> Result<String, RelayError> {
    match job.status {
        PredictionStatus::Failed => {
            let message = job.error.clone().unwrap_or_else(|| GENERATION_FAILED.to_string());
            Err(RelayError::internal(message))
        }
        PredictionStatus::Succeeded => job
            .output
            .image_reference()
            .ok_or_else(|| RelayError::internal(NO_IMAGE_GENERATED)),
        _ => Err(RelayError::timeout(GENERATION_TIMED_OUT)),
    }
}

/// Submit an image job and wait for its single image reference.
pub async fn run_async_image_job<U>(
    upstream: &U,
    request: &ImageJobRequest,
    policy: PollPolicy,
) -> Result<String, RelayError>
where
    U: PredictionUpstream + ?Sized,
{
    let job = upstream.create_prediction(request).await?;
    info!(id = ?job.id, status = ?job.status, "Image generation started");

    let job = poll_until_terminal(upstream, job, &request.api_key, policy).await?;

    match interpret_outcome(&job) {
        Ok(image_url) => {
            info!(id = ?job.id, "Image generation succeeded");
            Ok(image_url)
        }
        Err(err) => {
            warn!(id = ?job.id, status = ?job.status, "Image generation did not produce an image: {}", err);
            Err(err)
        }
    }
}
