use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("unrecognised job status '{0}'")]
    InvalidStatus(String),

    #[error("separation failed for '{0}'")]
    JobFailed(String),

    #[error("job '{0}' is no longer known to the service")]
    JobDisappeared(String),

    #[error("gave up waiting for '{id}' after {waited:?}")]
    Timeout { id: String, waited: Duration },

    #[error("invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<ureq::Error> for ServiceError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => ServiceError::UnexpectedStatus(code),
            ureq::Error::Transport(t) => ServiceError::Http(t.to_string()),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
