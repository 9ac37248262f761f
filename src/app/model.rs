//! Application model types: `App` and the `Action`s keys map to.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::audio::AudioOutput;
use crate::config::PlaybackSettings;
use crate::engine::{EngineError, EngineState, PlaybackEngine};

/// A user command, decoupled from the key that produced it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Action {
    TogglePlay,
    Skip(f64),
    /// Seek to this fraction of the track, `0.0..1.0`.
    SeekFraction(f64),
    SelectNext,
    SelectPrev,
    AdjustVolume(f32),
    ToggleMute,
    MarkLoopStart,
    MarkLoopEnd,
    ToggleLoop,
    NudgeLoopStart(f64),
    NudgeLoopEnd(f64),
    Quit,
}

/// Map a key press to an action using the configured step sizes.
pub fn action_for_key(key: KeyEvent, playback: &PlaybackSettings) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    let nudge = playback.loop_nudge_seconds;
    let action = match key.code {
        KeyCode::Char(' ') => Action::TogglePlay,
        KeyCode::Char('h') | KeyCode::Left => Action::Skip(-playback.skip_seconds),
        KeyCode::Char('l') | KeyCode::Right => Action::Skip(playback.skip_seconds),
        KeyCode::Char(c @ '0'..='9') => Action::SeekFraction(f64::from(c as u8 - b'0') / 10.0),
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrev,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::AdjustVolume(playback.volume_step),
        KeyCode::Char('-') => Action::AdjustVolume(-playback.volume_step),
        KeyCode::Char('m') => Action::ToggleMute,
        KeyCode::Char('a') => Action::MarkLoopStart,
        KeyCode::Char('b') => Action::MarkLoopEnd,
        KeyCode::Char('o') => Action::ToggleLoop,
        KeyCode::Char('[') => Action::NudgeLoopStart(-nudge),
        KeyCode::Char(']') => Action::NudgeLoopStart(nudge),
        KeyCode::Char('{') => Action::NudgeLoopEnd(-nudge),
        KeyCode::Char('}') => Action::NudgeLoopEnd(nudge),
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    /// Index of the highlighted stem row.
    pub selected: usize,
    /// Feedback from the last command that failed, cleared by the next one.
    pub notice: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_next(&mut self, stems: usize) {
        if stems > 0 && self.selected + 1 < stems {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn selected_stem<O: AudioOutput>(&self, engine: &PlaybackEngine<O>) -> Option<(String, f32)> {
        engine
            .channels()
            .get(self.selected)
            .map(|c| (c.name().to_string(), c.gain()))
    }

    /// Run `action` against `engine`. Returns `true` when the app should exit.
    pub fn apply<O: AudioOutput>(&mut self, action: Action, engine: &mut PlaybackEngine<O>) -> bool {
        let result = match action {
            Action::Quit => return true,
            Action::TogglePlay => engine.toggle_play(),
            Action::Skip(delta) => engine.skip(delta),
            Action::SeekFraction(f) => engine.seek(engine.total_duration() * f),
            Action::SelectNext => {
                self.select_next(engine.channels().len());
                Ok(())
            }
            Action::SelectPrev => {
                self.select_prev();
                Ok(())
            }
            Action::AdjustVolume(delta) => match self.selected_stem(engine) {
                Some((name, gain)) => engine.set_volume(&name, gain + delta),
                None => Ok(()),
            },
            Action::ToggleMute => match self.selected_stem(engine) {
                Some((name, _)) => engine.toggle_muted(&name).map(|_| ()),
                None => Ok(()),
            },
            Action::MarkLoopStart => engine.mark_loop_start(),
            Action::MarkLoopEnd => engine.mark_loop_end(),
            Action::ToggleLoop => engine.toggle_loop(),
            Action::NudgeLoopStart(delta) => {
                engine.drag_loop_start(engine.loop_region().start + delta);
                engine.release_loop_drag()
            }
            Action::NudgeLoopEnd(delta) => {
                engine.drag_loop_end(engine.loop_region().end + delta);
                engine.release_loop_drag()
            }
        };

        self.notice = result.err().map(|e| notice_for(&e));
        false
    }
}

/// Human wording for an engine error.
pub fn notice_for(err: &EngineError) -> String {
    match err {
        EngineError::InvalidLoopRegion { start, end } => {
            format!("Loop start ({start:.2}s) must be before loop end ({end:.2}s)")
        }
        EngineError::PlaybackStart(_) => "Playback failed to start. Press space to retry.".to_string(),
        EngineError::AllStemsFailed => "No stem could be loaded for this track.".to_string(),
        EngineError::NotReady(EngineState::Loading) => "Stems are still loading...".to_string(),
        EngineError::NotReady(_) => "No track is open.".to_string(),
        other => other.to_string(),
    }
}
