use std::fmt;
use std::str::FromStr;

use super::error::ServiceError;

/// Lifecycle of a separation job as reported by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Downloading,
    Separating,
    Completed,
    Failed,
    /// Never submitted, or forgotten by the backend.
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Accepted by the backend and not yet finished.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Downloading | JobStatus::Separating)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Downloading => "DOWNLOADING",
            JobStatus::Separating => "SEPARATING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for JobStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PENDING" => Ok(JobStatus::Pending),
            "DOWNLOADING" => Ok(JobStatus::Downloading),
            "SEPARATING" => Ok(JobStatus::Separating),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            "UNKNOWN" => Ok(JobStatus::Unknown),
            other => Err(ServiceError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
