//! Application module: the mixer view state used by the TUI and runtime.
//!
//! The `App` model lives in `app::model`. It turns key presses into engine
//! commands and keeps the notice shown under the transport.

mod model;

pub use model::*;
