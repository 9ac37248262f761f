use std::collections::HashSet;
use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `STEMDECK__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("STEMDECK")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.schedule_lead_ms == 0 {
            return Err("playback.schedule_lead_ms must be >= 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.playback.default_volume) {
            return Err("playback.default_volume must be within 0.0..=1.0".to_string());
        }
        if self.stems.names.is_empty() {
            return Err("stems.names must list at least one stem".to_string());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.stems.names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(format!("stems.names lists '{dup}' more than once"));
        }
        if self.ui.refresh_ms == 0 {
            return Err("ui.refresh_ms must be >= 1".to_string());
        }
        Ok(())
    }

    /// The configured log file, or the XDG state default.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.logging.file.clone().or_else(default_log_path)
    }
}

/// Resolve the config path from `STEMDECK_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("STEMDECK_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/stemdeck/config.toml`
/// or `~/.config/stemdeck/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join("stemdeck").join("config.toml"))
}

/// `$XDG_STATE_HOME/stemdeck/stemdeck.log` or `~/.local/state/stemdeck/stemdeck.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", &[".local", "state"]).map(|d| d.join("stemdeck").join("stemdeck.log"))
}

fn xdg_dir(var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| home_fallback.iter().fold(PathBuf::from(home), |p, c| p.join(c)))
    }
}
