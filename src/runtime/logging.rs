use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::config::LoggingSettings;

/// Route `log` records to `path`. The TUI owns the terminal, so when the file
/// cannot be opened logging stays disabled rather than falling back to stderr.
pub fn init(settings: &LoggingSettings, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };

    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("stemdeck: cannot open log file {}: {e}", path.display());
            return;
        }
    };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.level.as_str()))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();

    log::info!("stemdeck {} starting up", env!("CARGO_PKG_VERSION"));
}
