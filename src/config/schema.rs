use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/stemdeck/config.toml` or `~/.config/stemdeck/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `STEMDECK__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub playback: PlaybackSettings,
    pub stems: StemSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Root URL of the separation backend.
    pub base_url: String,
    /// How often to ask for job status while waiting (milliseconds).
    pub poll_interval_ms: u64,
    /// Per-request timeout, including stem downloads (milliseconds).
    pub request_timeout_ms: u64,
    /// Give up waiting for a separation job after this long (seconds).
    pub job_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            poll_interval_ms: 3000,
            request_timeout_ms: 15_000,
            job_timeout_secs: 900,
        }
    }
}

impl ServiceSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Delay between a transport command and the moment all stems start
    /// sounding together (milliseconds).
    pub schedule_lead_ms: u64,
    /// Initial fader value for every stem, `0.0..=1.0`.
    pub default_volume: f32,
    /// Seconds to jump with `h` / `l`.
    pub skip_seconds: f64,
    /// Fader change per `+` / `-` press.
    pub volume_step: f32,
    /// Seconds a loop marker moves per `[` / `]` / `{` / `}` press.
    pub loop_nudge_seconds: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            schedule_lead_ms: 50,
            default_volume: 0.8,
            skip_seconds: 5.0,
            volume_step: 0.05,
            loop_nudge_seconds: 0.25,
        }
    }
}

impl PlaybackSettings {
    pub fn schedule_lead(&self) -> f64 {
        self.schedule_lead_ms as f64 / 1000.0
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StemSettings {
    /// Stems requested for every track, in display order.
    pub names: Vec<String>,
}

impl Default for StemSettings {
    fn default() -> Self {
        Self {
            names: ["vocals", "drums", "bass", "other"].map(String::from).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Redraw interval while idle (milliseconds).
    pub refresh_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ stemdeck ~ ".to_string(),
            refresh_ms: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Log file. The terminal is owned by the UI, so logs never go to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
