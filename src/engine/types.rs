//! Engine-facing value types: sessions, lifecycle state and snapshots.

use super::error::EngineError;

/// Lifecycle of the playback engine. Pausing returns to `Ready`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No session open.
    #[default]
    Idle,
    /// Stems are being fetched and decoded.
    Loading,
    /// Loaded and stopped.
    Ready,
    Playing,
}

/// One mixing session for one source recording. The stem list is fixed at
/// creation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSession {
    source_id: String,
    display_title: String,
    stem_names: Vec<String>,
}

impl TrackSession {
    pub fn new(source_id: impl Into<String>, display_title: impl Into<String>, stem_names: Vec<String>) -> Self {
        Self {
            source_id: source_id.into(),
            display_title: display_title.into(),
            stem_names,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn display_title(&self) -> &str {
        &self.display_title
    }

    pub fn stem_names(&self) -> &[String] {
        &self.stem_names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopSnapshot {
    pub enabled: bool,
    pub start: f64,
    pub end: f64,
    /// `false` while the markers are inverted; the loop is inert until fixed.
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StemSnapshot {
    pub name: String,
    pub volume: f32,
    pub muted: bool,
    pub load_error: bool,
    /// Why the stem failed to load, when it did.
    pub error: Option<String>,
    /// Whether a voice is currently scheduled for this stem.
    pub sounding: bool,
}

/// Point-in-time view of the engine for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub title: Option<String>,
    pub is_playing: bool,
    pub position: f64,
    pub total_duration: f64,
    pub loop_region: LoopSnapshot,
    pub stems: Vec<StemSnapshot>,
    pub error: Option<EngineError>,
}

impl EngineSnapshot {
    pub fn playable_stems(&self) -> usize {
        self.stems.iter().filter(|s| !s.load_error).count()
    }

    pub fn errored_stems(&self) -> usize {
        self.stems.iter().filter(|s| s.load_error).count()
    }
}
