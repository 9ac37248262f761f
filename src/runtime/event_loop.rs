use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{self, App};
use crate::audio::{AudioOutput, LoadOutcome};
use crate::config;
use crate::engine::PlaybackEngine;
use crate::ui;

/// Main terminal event loop: picks up the stem load, draws, and feeds key
/// presses to the engine. Returns `Ok(())` when the user quits.
pub fn run<O: AudioOutput>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    engine: &mut PlaybackEngine<O>,
    loads: Receiver<LoadOutcome>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pending = Some(loads);
    let refresh = Duration::from_millis(settings.ui.refresh_ms);

    loop {
        let received = pending.as_ref().map(|rx| rx.try_recv());
        match received {
            Some(Ok(outcome)) => {
                engine.apply_load(outcome);
                pending = None;
            }
            Some(Err(TryRecvError::Disconnected)) => {
                log::error!("stem loader exited without a result");
                app.notice = Some("Loading stopped unexpectedly.".to_string());
                pending = None;
            }
            Some(Err(TryRecvError::Empty)) | None => {}
        }

        let snapshot = engine.snapshot();
        terminal.draw(|f| ui::draw(f, app, &snapshot, &settings.ui, &settings.playback))?;

        if event::poll(refresh)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(action) = app::action_for_key(key, &settings.playback) {
                    if app.apply(action, engine) {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
