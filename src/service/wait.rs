use std::thread;
use std::time::{Duration, Instant};

use super::error::{Result, ServiceError};
use super::status::JobStatus;

/// Anything that can report a job's status.
pub trait JobStatusSource {
    fn job_status(&self, video_id: &str) -> Result<JobStatus>;
}

/// Poll `source` every `interval` until the job completes.
///
/// `on_status` sees every status observed. An `Unknown` before the job was
/// first seen is tolerated (the submit may not have landed yet); after that it
/// means the backend lost the job.
pub fn wait_for_job<S, F>(
    source: &S,
    video_id: &str,
    interval: Duration,
    timeout: Duration,
    mut on_status: F,
) -> Result<()>
where
    S: JobStatusSource + ?Sized,
    F: FnMut(JobStatus),
{
    let started = Instant::now();
    let mut seen = false;

    loop {
        let status = source.job_status(video_id)?;
        on_status(status);

        if status.is_terminal() {
            return match status {
                JobStatus::Completed => Ok(()),
                _ => Err(ServiceError::JobFailed(video_id.to_string())),
            };
        }
        if status.is_active() {
            seen = true;
        } else if seen {
            return Err(ServiceError::JobDisappeared(video_id.to_string()));
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(ServiceError::Timeout {
                id: video_id.to_string(),
                waited,
            });
        }
        log::debug!("job '{video_id}' is {status}; next poll in {interval:?}");
        thread::sleep(interval);
    }
}
