//! Configuration loader and schema types.
//!
//! This module exposes the settings that drive the separation client, the
//! playback engine and the terminal shell, plus helpers to load them from disk.

mod load;
mod schema;

pub use load::{default_config_path, default_log_path, resolve_config_path};
pub use schema::*;
