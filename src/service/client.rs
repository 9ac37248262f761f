use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ServiceSettings;

use super::error::{Result, ServiceError};
use super::status::JobStatus;
use super::wait::JobStatusSource;

const PROCESS_PATH: &str = "api/audio/process";
const STATUS_PATH: &str = "api/audio/status";
const TRACK_PATH: &str = "api/audio/serve/track";
const VIDEOS_PATH: &str = "api/audio/videos";

/// Body of a separation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub video_id: String,
    pub video_title: String,
    /// ISO 8601 duration as the catalog reports it, e.g. `PT3M25S`.
    pub duration: String,
}

/// A track whose stems the backend has already produced.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTrack {
    pub video_id: String,
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub duration: Option<String>,
}

/// Blocking HTTP client for the separation backend.
#[derive(Debug, Clone)]
pub struct SeparationClient {
    agent: ureq::Agent,
    base: Url,
    track_endpoint: Url,
}

impl SeparationClient {
    pub fn new(settings: &ServiceSettings) -> Result<Self> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)?;
        let track_endpoint = base.join(TRACK_PATH)?;

        let agent = ureq::AgentBuilder::new()
            .timeout(settings.request_timeout())
            .build();

        Ok(Self {
            agent,
            base,
            track_endpoint,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Ask the backend to separate a track. Resubmitting a finished or failed
    /// job restarts it; an in-flight job is left alone.
    pub fn submit(&self, request: &ProcessRequest) -> Result<()> {
        let url = self.base.join(PROCESS_PATH)?;
        let response = self.agent.post(url.as_str()).send_json(request)?;
        let code = response.status();
        if !(200..300).contains(&code) {
            return Err(ServiceError::UnexpectedStatus(code));
        }
        log::info!("submitted '{}' for separation ({code})", request.video_id);
        Ok(())
    }

    pub fn status(&self, video_id: &str) -> Result<JobStatus> {
        let url = self.base.join(STATUS_PATH)?;
        match self.agent.get(url.as_str()).query("videoId", video_id).call() {
            Ok(response) => response.into_string()?.parse(),
            Err(ureq::Error::Status(404, _)) => Ok(JobStatus::Unknown),
            Err(e) => Err(e.into()),
        }
    }

    /// Where a stem of a completed job is served from.
    pub fn stem_url(&self, video_id: &str, stem: &str) -> String {
        let mut url = self.track_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("videoId", video_id)
            .append_pair("trackName", stem);
        url.into()
    }

    /// Tracks with completed stems, most recent first.
    pub fn processed_tracks(&self) -> Result<Vec<ProcessedTrack>> {
        let url = self.base.join(VIDEOS_PATH)?;
        let tracks = self.agent.get(url.as_str()).call()?.into_json()?;
        Ok(tracks)
    }
}

impl JobStatusSource for SeparationClient {
    fn job_status(&self, video_id: &str) -> Result<JobStatus> {
        self.status(video_id)
    }
}
