//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`. It only
//! reads an `EngineSnapshot`; it never touches the engine itself.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::config::{PlaybackSettings, UiSettings};
use crate::engine::{EngineSnapshot, EngineState, StemSnapshot};

/// Render the controls help text, incorporating step sizes.
fn controls_text(playback: &PlaybackSettings) -> String {
    [
        "[space] play/pause".to_string(),
        format!("[h/l] -/+{}s", playback.skip_seconds),
        "[0-9] seek".to_string(),
        "[j/k] select stem".to_string(),
        "[+/-] volume".to_string(),
        "[m] mute".to_string(),
        "[a/b] mark loop A/B".to_string(),
        "[o] loop on/off".to_string(),
        "[ [ ] ] move A".to_string(),
        "[{ }] move B".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

/// Format seconds as `M:SS.t`.
pub fn format_clock(secs: f64) -> String {
    let tenths = (secs.max(0.0) * 10.0).floor() as u64;
    let whole = tenths / 10;
    format!("{}:{:02}.{}", whole / 60, whole % 60, tenths % 10)
}

/// Draw the timeline as characters: `=` played, `-` ahead, `A`/`B` for markers
/// and `|` for the playhead.
pub fn timeline(width: usize, snapshot: &EngineSnapshot) -> String {
    if width == 0 {
        return String::new();
    }
    let total = snapshot.total_duration;
    let col = |t: f64| -> usize {
        if total <= 0.0 {
            0
        } else {
            ((t / total) * (width - 1) as f64).round().clamp(0.0, (width - 1) as f64) as usize
        }
    };

    let head = col(snapshot.position);
    let mut cells: Vec<char> = (0..width).map(|i| if i < head { '=' } else { '-' }).collect();

    let region = &snapshot.loop_region;
    if region.enabled && region.valid {
        for cell in cells.iter_mut().take(col(region.end)).skip(col(region.start)) {
            if *cell == '-' {
                *cell = '~';
            }
        }
    }
    cells[col(region.start)] = 'A';
    cells[col(region.end)] = 'B';
    cells[head] = '|';
    cells.into_iter().collect()
}

fn stem_line(stem: &StemSnapshot, bar_width: usize) -> Line<'static> {
    let filled = ((stem.volume as f64) * bar_width as f64).round() as usize;
    let bar: String = (0..bar_width).map(|i| if i < filled { '#' } else { '.' }).collect();

    let mut spans = vec![
        Span::raw(format!("{:<10} ", stem.name)),
        Span::raw(format!("[{bar}] {:>3}% ", (stem.volume * 100.0).round() as u32)),
    ];
    if stem.muted {
        spans.push(Span::styled("MUTE ", Style::default().fg(Color::Yellow)));
    }
    if let Some(err) = &stem.error {
        spans.push(Span::styled(format!("ERROR: {err}"), Style::default().fg(Color::Red)));
    } else if stem.sounding {
        spans.push(Span::styled("*", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}

/// One-line summary of the transport.
fn transport_text(snapshot: &EngineSnapshot) -> String {
    let state = match snapshot.state {
        EngineState::Idle => "Idle",
        EngineState::Loading => "Loading stems...",
        EngineState::Ready => "Paused",
        EngineState::Playing => "Playing",
    };
    let region = &snapshot.loop_region;
    let loop_text = if region.enabled && region.valid {
        format!("Loop: {} - {}", format_clock(region.start), format_clock(region.end))
    } else {
        "Loop: off".to_string()
    };
    format!(
        "{state} • {} / {} • {loop_text}",
        format_clock(snapshot.position),
        format_clock(snapshot.total_duration)
    )
}

/// Render the entire UI into the provided `frame` using app state and the
/// latest engine snapshot.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    snapshot: &EngineSnapshot,
    ui_settings: &UiSettings,
    playback: &PlaybackSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let title = snapshot
        .title
        .as_deref()
        .map(|t| format!(" {t} "))
        .unwrap_or_else(|| " stemdeck ".to_string());
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_transport(frame, app, snapshot, chunks[1]);
    draw_stems(frame, app, snapshot, chunks[2]);

    let footer = Paragraph::new(controls_text(playback))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

fn draw_transport(frame: &mut Frame, app: &App, snapshot: &EngineSnapshot, area: Rect) {
    let block = Block::bordered()
        .padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        })
        .title(" transport ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(transport_text(snapshot)), rows[0]);

    let ratio = if snapshot.total_duration > 0.0 {
        (snapshot.position / snapshot.total_duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label("");
    frame.render_widget(gauge, rows[1]);

    frame.render_widget(
        Paragraph::new(timeline(rows[2].width as usize, snapshot)),
        rows[2],
    );

    let mut notices: Vec<Line> = Vec::new();
    if snapshot.state == EngineState::Ready && snapshot.playable_stems() == 0 {
        notices.push(Line::from("No stem could be loaded; nothing to play.").red().bold());
    }
    if !snapshot.loop_region.valid && snapshot.total_duration > 0.0 {
        notices.push(Line::from("Loop markers are inverted: A must come before B.").yellow());
    }
    if let Some(notice) = &app.notice {
        notices.push(Line::from(notice.as_str()).yellow());
    }
    if !notices.is_empty() {
        frame.render_widget(Paragraph::new(notices).wrap(Wrap { trim: true }), rows[3]);
    }
}

fn draw_stems(frame: &mut Frame, app: &App, snapshot: &EngineSnapshot, area: Rect) {
    let bar_width = (area.width as usize).saturating_sub(40).clamp(5, 30);
    let items: Vec<ListItem> = snapshot
        .stems
        .iter()
        .map(|s| ListItem::new(stem_line(s, bar_width)))
        .collect();

    let errored = snapshot.errored_stems();
    let title = if errored > 0 {
        format!(" stems ({} ok, {errored} failed) ", snapshot.playable_stems())
    } else {
        " stems ".to_string()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !snapshot.stems.is_empty() {
        state.select(Some(app.selected.min(snapshot.stems.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
