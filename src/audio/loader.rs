//! Stem loading: fetch bytes for every stem of a session and decode them.
//!
//! Each stem is its own failure domain. Loads fan out on scoped threads and
//! are joined once every stem has settled into either a buffer or an error.

use std::io::Read;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use super::decode::decode_stem;
use super::error::AudioError;
use super::types::PcmBuffer;

/// Where one stem's bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub struct StemSource {
    pub name: String,
    pub url: String,
}

/// A load job for one session, tagged with the session generation that
/// issued it.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub generation: u64,
    pub stems: Vec<StemSource>,
}

/// Per-stem results of a [`LoadRequest`], in request order.
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub results: Vec<(String, Result<PcmBuffer, AudioError>)>,
}

/// Fetches raw stem bytes by URL.
pub trait StemFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AudioError>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl StemFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AudioError> {
        let fail = |reason: String| AudioError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self.agent.get(url).call().map_err(|e| fail(e.to_string()))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| fail(e.to_string()))?;
        Ok(bytes)
    }
}

fn load_one(fetcher: &dyn StemFetcher, source: &StemSource) -> Result<PcmBuffer, AudioError> {
    let bytes = fetcher.fetch(&source.url)?;
    log::debug!("fetched {} bytes for stem '{}'", bytes.len(), source.name);
    decode_stem(bytes)
}

/// Load every stem in `request` concurrently and wait for all of them.
pub fn load_stems(request: &LoadRequest, fetcher: &dyn StemFetcher) -> LoadOutcome {
    let results = thread::scope(|scope| {
        let handles: Vec<_> = request
            .stems
            .iter()
            .map(|source| scope.spawn(move || load_one(fetcher, source)))
            .collect();

        handles
            .into_iter()
            .zip(&request.stems)
            .map(|(handle, source)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(AudioError::Decode("loader thread panicked".to_string())));
                if let Err(e) = &result {
                    log::warn!("stem '{}' unavailable: {e}", source.name);
                }
                (source.name.clone(), result)
            })
            .collect()
    });

    LoadOutcome {
        generation: request.generation,
        results,
    }
}

/// Run [`load_stems`] on a background thread; the outcome arrives on the
/// returned channel once every stem has settled.
pub fn spawn_loader(request: LoadRequest, fetcher: Arc<dyn StemFetcher>) -> Receiver<LoadOutcome> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let outcome = load_stems(&request, fetcher.as_ref());
        // The receiver is gone when the session was torn down mid-load.
        let _ = tx.send(outcome);
    });
    rx
}
