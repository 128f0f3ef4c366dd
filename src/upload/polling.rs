use std::time::Duration;

use tokio::time::sleep;

use crate::prelude::*;

use super::interfaces::{ProjectId, UploadId, UploadStatus};
use super::metadata_client::MetadataClient;

pub const POLLING_INTERVAL_UNIT: Duration = Duration::from_secs(3);
pub const MIN_PROCESSING_WAIT: Duration = Duration::from_secs(60);

/// How the status of an upload is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    /// Step by which the delay between two polls grows.
    pub interval_unit: Duration,
    /// Lower bound of the waiting budget, whatever timeout the caller asks for.
    pub min_wait: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            interval_unit: POLLING_INTERVAL_UNIT,
            min_wait: MIN_PROCESSING_WAIT,
        }
    }
}

impl PollingPolicy {
    /// Total time that may be spent sleeping between polls.
    pub fn budget(&self, timeout: Duration) -> Duration {
        timeout.max(self.min_wait)
    }

    pub fn schedule(&self, timeout: Duration) -> PollSchedule {
        PollSchedule {
            interval_unit: self.interval_unit,
            multiplier: 1,
            waited: Duration::ZERO,
            budget: self.budget(timeout),
        }
    }
}

/// Linearly growing delays between polls, ending once the accumulated wait reaches the budget.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval_unit: Duration,
    multiplier: u32,
    waited: Duration,
    budget: Duration,
}

impl PollSchedule {
    pub fn waited(&self) -> Duration {
        self.waited
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.waited >= self.budget {
            return None;
        }
        self.multiplier += 1;
        let delay = self.interval_unit * self.multiplier;
        self.waited += delay;
        Some(delay)
    }
}

/// Poll the metadata service until the upload is processed and return the number of polls.
///
/// Returns an error if the upload fails processing or the schedule runs out.
pub async fn wait_for_processing(
    metadata: &MetadataClient,
    project_id: &ProjectId,
    upload_id: &UploadId,
    token: &str,
    mut schedule: PollSchedule,
) -> UploadResult<u32> {
    let mut polls = 0;
    loop {
        let record = metadata.poll_status(project_id, upload_id, token).await?;
        polls += 1;

        match record.status {
            UploadStatus::Completed => return Ok(polls),
            UploadStatus::Failed => {
                return Err(UploadError::ProcessingFailed {
                    reason: record
                        .failure_reason
                        .unwrap_or_else(|| "no reason given".to_string()),
                });
            }
            status => {
                let Some(delay) = schedule.next() else {
                    return Err(UploadError::Timeout {
                        waited: schedule.budget(),
                    });
                };
                trace!("Upload status is {status}, polling again in {delay:?}");
                sleep(delay).await;
                debug!(
                    "Upload still not processed after {}s",
                    schedule.waited().as_secs()
                );
            }
        }
    }
}
