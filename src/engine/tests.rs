use std::rc::Rc;

use crate::audio::fake::{Counters, FakeOutput, FakeVoice};
use crate::audio::{LoadOutcome, PcmBuffer, Voice};

use super::testing::{RATE, loaded_engine};
use super::*;

const LEAD: f64 = 0.05;

struct Rig {
    shared: Rc<Counters>,
    engine: PlaybackEngine<FakeOutput>,
}

impl Rig {
    fn new() -> Self {
        let output = FakeOutput::new();
        let shared = output.counters.clone();
        shared.now.set(100.0);
        let engine = PlaybackEngine::new(
            output,
            EngineOptions {
                schedule_lead: LEAD,
                default_volume: 0.8,
            },
        );
        Self { shared, engine }
    }

    /// Open a session whose stems decode to the given durations (`None` fails).
    fn loaded(stems: &[(&str, Option<f64>)]) -> Self {
        let mut rig = Self::new();
        loaded_engine(&mut rig.engine, stems);
        rig
    }

    fn four_stems() -> Self {
        Self::loaded(&[
            ("vocals", Some(60.0)),
            ("drums", Some(60.0)),
            ("bass", Some(60.0)),
            ("other", Some(60.0)),
        ])
    }

    fn advance(&self, secs: f64) {
        self.shared.advance(secs);
    }

    /// Move the clock to `secs` after the onset of the current voices.
    fn past_onset(&self, secs: f64) {
        let onset = self.engine.channels()[0].voice().unwrap().start_at();
        self.shared.now.set(onset + secs);
    }

    fn voices(&self) -> Vec<&FakeVoice> {
        self.engine.channels().iter().filter_map(|c| c.voice()).collect()
    }
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{a} != {b}");
}

#[test]
fn failed_stem_is_excluded_and_the_rest_play() {
    let mut rig = Rig::loaded(&[
        ("vocals", Some(60.0)),
        ("drums", Some(61.5)),
        ("bass", None),
        ("other", Some(59.0)),
    ]);

    let snap = rig.engine.snapshot();
    let errored: Vec<&str> = snap.stems.iter().filter(|s| s.load_error).map(|s| s.name.as_str()).collect();
    assert_eq!(errored, vec!["bass"]);
    assert_close(snap.total_duration, 61.5);
    assert!(matches!(
        rig.engine.load_errors().as_slice(),
        [EngineError::StemLoad { stem, .. }] if stem == "bass"
    ));

    rig.engine.play().unwrap();
    let snap = rig.engine.snapshot();
    assert!(snap.is_playing);
    assert_eq!(snap.playable_stems(), 3);
    assert_eq!(snap.errored_stems(), 1);
    assert_eq!(rig.voices().len(), 3);
    assert!(!snap.stems[2].sounding);
}

#[test]
fn play_refuses_when_no_stem_loaded() {
    let mut rig = Rig::loaded(&[("vocals", None), ("drums", None)]);
    assert_eq!(rig.engine.snapshot().error, Some(EngineError::AllStemsFailed));

    assert_eq!(rig.engine.play(), Err(EngineError::AllStemsFailed));
    assert!(!rig.engine.is_playing());
    assert_eq!(rig.engine.state(), EngineState::Ready);
    assert_eq!(rig.shared.started.get(), 0);
}

#[test]
fn all_voices_share_one_onset_and_offset() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(12.0).unwrap();
    rig.engine.play().unwrap();

    let voices = rig.voices();
    assert_eq!(voices.len(), 4);
    for v in &voices {
        assert_close(v.start_at(), 100.0 + LEAD);
        assert_close(v.offset(), 12.0);
    }

    rig.advance(0.3);
    let elapsed: Vec<f64> = voices.iter().map(|v| v.elapsed()).collect();
    let spread = elapsed.iter().cloned().fold(f64::MIN, f64::max) - elapsed.iter().cloned().fold(f64::MAX, f64::min);
    assert!(spread < LEAD);
}

#[test]
fn position_holds_until_scheduled_onset() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(5.0).unwrap();
    rig.engine.play().unwrap();
    assert_close(rig.engine.current_position(), 5.0);
    rig.advance(LEAD + 1.0);
    assert_close(rig.engine.current_position(), 6.0);
}

#[test]
fn position_folds_over_track_length_without_loop() {
    let mut rig = Rig::four_stems();
    rig.engine.play().unwrap();
    rig.past_onset(67.5);
    assert_close(rig.engine.current_position(), 7.5);
    rig.past_onset(185.0);
    assert_close(rig.engine.current_position(), 5.0);
}

#[test]
fn position_folds_into_loop_region() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(10.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(20.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.set_loop_enabled(true).unwrap();
    rig.engine.seek(12.0).unwrap();
    rig.engine.play().unwrap();

    let v = rig.voices()[0];
    assert_close(v.loop_start, 10.0);
    assert_close(v.loop_end, 20.0);

    rig.past_onset(13.0);
    // raw 25 -> 10 + (25 - 20) mod 10
    assert_close(rig.engine.current_position(), 15.0);
    rig.past_onset(31.0);
    // raw 43 -> 10 + 23 mod 10
    assert_close(rig.engine.current_position(), 13.0);
}

#[test]
fn pause_then_play_resumes_at_same_position() {
    let mut rig = Rig::four_stems();
    rig.engine.play().unwrap();
    rig.past_onset(12.34);
    rig.engine.pause();

    let p = rig.engine.current_position();
    assert_close(p, 12.34);
    assert!(rig.voices().is_empty());
    assert_eq!(rig.shared.stopped.get(), 4);

    rig.advance(3.0);
    rig.engine.play().unwrap();
    assert_close(rig.engine.current_position(), p);
    for v in rig.voices() {
        assert_close(v.offset(), p);
    }
}

#[test]
fn unmute_restores_exact_fader_value() {
    let mut rig = Rig::four_stems();
    rig.engine.play().unwrap();
    rig.engine.set_volume("drums", 0.37).unwrap();
    rig.engine.set_muted("drums", true).unwrap();

    let drums = &rig.engine.channels()[1];
    assert_eq!(drums.effective_gain(), 0.0);
    assert_eq!(drums.voice().unwrap().gain.get(), 0.0);
    assert_eq!(drums.gain(), 0.37);

    rig.engine.set_muted("drums", false).unwrap();
    let drums = &rig.engine.channels()[1];
    assert_eq!(drums.voice().unwrap().gain.get(), 0.37);
    assert_eq!(rig.engine.snapshot().stems[1].volume, 0.37);
}

#[test]
fn volume_changes_apply_to_live_voice_without_restart() {
    let mut rig = Rig::four_stems();
    rig.engine.play().unwrap();
    let started = rig.shared.started.get();

    rig.engine.set_volume("vocals", 0.5).unwrap();
    assert_eq!(rig.shared.started.get(), started);
    assert_eq!(rig.engine.channels()[0].voice().unwrap().gain.get(), 0.5);

    rig.engine.set_muted("vocals", true).unwrap();
    rig.engine.set_volume("vocals", 0.9).unwrap();
    assert_eq!(rig.engine.channels()[0].voice().unwrap().gain.get(), 0.0);
}

#[test]
fn volume_is_clamped_and_unknown_stems_are_reported() {
    let mut rig = Rig::four_stems();
    rig.engine.set_volume("bass", 1.7).unwrap();
    assert_eq!(rig.engine.channels()[2].gain(), 1.0);
    assert_eq!(
        rig.engine.set_volume("kazoo", 0.5),
        Err(EngineError::UnknownStem("kazoo".to_string()))
    );
}

#[test]
fn disabling_loop_resets_bounds_and_keeps_position() {
    let mut rig = Rig::loaded(&[("vocals", Some(100.0)), ("drums", Some(100.0))]);
    rig.engine.seek(12.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(45.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.set_loop_enabled(true).unwrap();
    rig.engine.seek(20.0).unwrap();
    rig.engine.play().unwrap();
    rig.past_onset(3.0);
    let before = rig.engine.current_position();
    assert_close(before, 23.0);

    rig.engine.set_loop_enabled(false).unwrap();

    let region = rig.engine.loop_region();
    assert!(!region.enabled);
    assert!(region.start > 0.0 && region.start <= LOOP_EPSILON);
    assert_close(region.end, 100.0);
    assert!(rig.engine.is_playing());
    assert_close(rig.engine.current_position(), before);
    for v in rig.voices() {
        assert_close(v.loop_start, 0.0);
        assert_close(v.loop_end, 100.0);
    }
}

#[test]
fn disabling_loop_while_stopped_only_resets_bounds() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(12.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(45.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.set_loop_enabled(true).unwrap();

    rig.engine.set_loop_enabled(false).unwrap();
    assert!(!rig.engine.is_playing());
    assert_eq!(rig.shared.started.get(), 0);
    assert_close(rig.engine.loop_region().end, 60.0);
}

#[test]
fn disabling_loop_that_is_already_off_leaves_voices_running() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(12.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.play().unwrap();
    let started = rig.shared.started.get();

    rig.engine.set_loop_enabled(false).unwrap();
    assert!(rig.engine.is_playing());
    assert_eq!(rig.shared.started.get(), started);
    assert_eq!(rig.shared.stopped.get(), 0);
    let region = rig.engine.loop_region();
    assert!(region.start <= LOOP_EPSILON);
    assert_close(region.end, 60.0);
}

#[test]
fn enabling_loop_takes_effect_on_next_restart() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(10.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(20.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.seek(15.0).unwrap();
    rig.engine.play().unwrap();

    let started = rig.shared.started.get();
    rig.engine.set_loop_enabled(true).unwrap();
    assert_eq!(rig.shared.started.get(), started);
    assert_close(rig.voices()[0].loop_end, 60.0);

    rig.engine.seek(16.0).unwrap();
    assert_close(rig.voices()[0].loop_end, 20.0);
}

#[test]
fn seek_outside_active_loop_snaps_to_loop_start() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(10.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(20.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.set_loop_enabled(true).unwrap();
    rig.engine.play().unwrap();

    rig.engine.seek(25.0).unwrap();
    assert_close(rig.engine.current_position(), 10.0);
    for v in rig.voices() {
        assert_close(v.offset(), 10.0);
    }
}

#[test]
fn seek_clamps_to_track_and_is_visible_while_stopped() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(-4.0).unwrap();
    assert_close(rig.engine.current_position(), 0.0);
    rig.engine.seek(75.0).unwrap();
    assert_close(rig.engine.current_position(), 60.0);
    rig.engine.seek(33.0).unwrap();
    assert_close(rig.engine.snapshot().position, 33.0);
}

#[test]
fn seek_while_playing_replaces_every_voice() {
    let mut rig = Rig::four_stems();
    rig.engine.play().unwrap();
    rig.engine.seek(30.0).unwrap();

    assert_eq!(rig.shared.started.get(), 8);
    assert_eq!(rig.shared.stopped.get(), 4);
    assert_eq!(rig.voices().len(), 4);
    for v in rig.voices() {
        assert_close(v.offset(), 30.0);
    }
}

#[test]
fn skip_wraps_around_track_end() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(58.0).unwrap();
    rig.engine.skip(5.0).unwrap();
    assert_close(rig.engine.current_position(), 3.0);
    rig.engine.skip(-5.0).unwrap();
    assert_close(rig.engine.current_position(), 58.0);
}

#[test]
fn inverted_markers_are_kept_but_leave_loop_inert() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(20.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.seek(30.0).unwrap();

    let err = rig.engine.mark_loop_start().unwrap_err();
    assert_eq!(err, EngineError::InvalidLoopRegion { start: 30.0, end: 20.0 });
    assert_close(rig.engine.loop_region().start, 30.0);
    assert!(!rig.engine.snapshot().loop_region.valid);

    assert!(matches!(
        rig.engine.set_loop_enabled(true),
        Err(EngineError::InvalidLoopRegion { .. })
    ));
    assert!(!rig.engine.loop_region().enabled);

    rig.engine.seek(50.0).unwrap();
    assert_close(rig.engine.current_position(), 50.0);
}

#[test]
fn inverting_an_enabled_loop_makes_it_inert() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(10.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(20.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.set_loop_enabled(true).unwrap();

    // Still parked on B, so A == B.
    assert!(rig.engine.mark_loop_start().is_err());
    assert!(rig.engine.loop_region().enabled);

    rig.engine.play().unwrap();
    rig.engine.seek(40.0).unwrap();
    assert_close(rig.voices()[0].offset(), 40.0);
    assert_close(rig.voices()[0].loop_end, 60.0);
}

#[test]
fn drag_handles_keep_markers_apart() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(10.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(20.0).unwrap();
    rig.engine.mark_loop_end().unwrap();

    rig.engine.drag_loop_start(50.0);
    assert_close(rig.engine.loop_region().start, 20.0 - LOOP_EPSILON);

    rig.engine.drag_loop_start(-3.0);
    assert_close(rig.engine.loop_region().start, 0.0);

    rig.engine.drag_loop_end(-1.0);
    assert_close(rig.engine.loop_region().end, LOOP_EPSILON);

    rig.engine.drag_loop_end(99.0);
    assert_close(rig.engine.loop_region().end, 60.0);
}

#[test]
fn releasing_drag_while_playing_restarts_with_new_bounds() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(10.0).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(30.0).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.set_loop_enabled(true).unwrap();
    rig.engine.seek(12.0).unwrap();
    rig.engine.play().unwrap();
    rig.past_onset(4.0);

    rig.engine.drag_loop_end(25.0);
    assert_close(rig.voices()[0].loop_end, 30.0);

    rig.engine.release_loop_drag().unwrap();
    for v in rig.voices() {
        assert_close(v.loop_end, 25.0);
        assert_close(v.offset(), 16.0);
    }
}

#[test]
fn releasing_drag_while_stopped_does_nothing() {
    let mut rig = Rig::four_stems();
    rig.engine.drag_loop_end(25.0);
    rig.engine.release_loop_drag().unwrap();
    assert_eq!(rig.shared.started.get(), 0);
}

#[test]
fn voice_start_failure_excludes_only_that_stem() {
    let mut rig = Rig::loaded(&[("vocals", Some(60.0)), ("drums", Some(59.0))]);
    rig.shared.reject_frames.set(Some(5900));
    rig.engine.play().unwrap();
    assert!(rig.engine.is_playing());
    assert_eq!(rig.voices().len(), 1);
}

#[test]
fn play_reports_error_when_no_voice_starts() {
    let mut rig = Rig::loaded(&[("vocals", Some(60.0))]);
    rig.shared.reject_frames.set(Some(6000));
    assert!(matches!(rig.engine.play(), Err(EngineError::PlaybackStart(_))));
    assert!(!rig.engine.is_playing());
    assert!(matches!(rig.engine.snapshot().error, Some(EngineError::PlaybackStart(_))));

    rig.shared.reject_frames.set(None);
    rig.engine.play().unwrap();
    assert!(rig.engine.snapshot().error.is_none());
}

#[test]
fn late_load_for_previous_session_is_ignored() {
    let mut rig = Rig::new();
    let stale = rig
        .engine
        .open_session(TrackSession::new("first", "First", vec!["vocals".to_string()]), |n| n.to_string());
    let fresh = rig
        .engine
        .open_session(TrackSession::new("second", "Second", vec!["vocals".to_string()]), |n| n.to_string());
    assert_ne!(stale.generation, fresh.generation);

    let applied = rig.engine.apply_load(LoadOutcome {
        generation: stale.generation,
        results: vec![("vocals".to_string(), Ok(PcmBuffer::new(vec![0.0; 100], 1, RATE)))],
    });
    assert!(!applied);
    assert_eq!(rig.engine.state(), EngineState::Loading);
    assert_eq!(rig.engine.session().unwrap().source_id(), "second");
}

#[test]
fn opening_a_session_silences_the_previous_one() {
    let mut rig = Rig::four_stems();
    rig.engine.play().unwrap();

    let request = rig
        .engine
        .open_session(TrackSession::new("next", "Next", vec!["vocals".to_string()]), |n| n.to_string());
    assert_eq!(rig.shared.stopped.get(), 4);
    assert_eq!(rig.engine.state(), EngineState::Loading);
    assert_eq!(request.stems.len(), 1);
    assert_eq!(rig.engine.play(), Err(EngineError::NotReady(EngineState::Loading)));
}

#[test]
fn close_session_tears_everything_down() {
    let mut rig = Rig::four_stems();
    rig.engine.play().unwrap();
    rig.engine.close_session();

    assert_eq!(rig.engine.state(), EngineState::Idle);
    assert!(rig.engine.channels().is_empty());
    assert_eq!(rig.shared.stopped.get(), 4);
    assert!(rig.engine.session().is_none());
}

#[test]
fn stem_urls_are_resolved_once_per_channel() {
    let rig = Rig::four_stems();
    assert_eq!(rig.engine.channels()[2].source_url(), "mem://bass");
}

#[test]
fn loop_bounds_fold_matches_voice_wrap() {
    let b = LoopBounds::new(10.0, 20.0);
    assert_close(b.fold(15.0), 15.0);
    assert_close(b.fold(20.0), 10.0);
    assert_close(b.fold(47.5), 17.5);
    assert_close(b.clamp(25.0), 10.0);
    assert_close(b.clamp(9.0), 10.0);
    assert_close(b.clamp(19.0), 19.0);
    assert_close(LoopBounds::new(5.0, 5.0).fold(30.0), 5.0);
}

#[test]
fn region_bounds_fall_back_to_whole_track_when_inactive() {
    let mut r = LoopRegion::whole_track(60.0);
    r.start = 10.0;
    r.end = 20.0;
    assert_eq!(r.bounds(60.0), LoopBounds::new(0.0, 60.0));
    r.enabled = true;
    assert_eq!(r.bounds(60.0), LoopBounds::new(10.0, 20.0));
    r.start = 25.0;
    assert_eq!(r.bounds(60.0), LoopBounds::new(0.0, 60.0));
}

#[test]
fn clock_reports_logical_position_while_stopped() {
    let mut clock = TransportClock::new(60.0);
    clock.set_position(8.0);
    assert_close(clock.current_position(1000.0), 8.0);

    clock.mark_started(8.0, 10.0, LoopBounds::new(0.0, 60.0));
    assert_close(clock.current_position(12.5), 10.5);
    clock.mark_stopped(12.5);
    assert!(!clock.is_playing());
    assert!(clock.anchor().is_none());
    assert_close(clock.current_position(99.0), 10.5);
}

#[test]
fn loop_bounds_and_offset_land_on_the_sample_grid() {
    let mut rig = Rig::four_stems();
    rig.engine.seek(10.004).unwrap();
    rig.engine.mark_loop_start().unwrap();
    rig.engine.seek(20.006).unwrap();
    rig.engine.mark_loop_end().unwrap();
    rig.engine.set_loop_enabled(true).unwrap();
    rig.engine.seek(12.3449).unwrap();
    rig.engine.play().unwrap();

    for v in rig.voices() {
        assert_close(v.loop_start, 10.0);
        assert_close(v.loop_end, 20.01);
        assert_close(v.offset(), 12.34);
    }
    assert_close(rig.engine.current_position(), 12.34);
    rig.past_onset(7.675);
    // raw 20.015 wraps at the snapped end, 20.01
    assert_close(rig.engine.current_position(), 10.005);
}

#[test]
fn stem_with_a_different_sample_rate_is_excluded() {
    let mut rig = Rig::new();
    let names = vec!["vocals".to_string(), "drums".to_string()];
    let request = rig
        .engine
        .open_session(TrackSession::new("abc123", "Test Track", names), |n| format!("mem://{n}"));
    assert!(rig.engine.apply_load(LoadOutcome {
        generation: request.generation,
        results: vec![
            ("vocals".to_string(), Ok(PcmBuffer::new(vec![0.0; 6000], 1, RATE))),
            ("drums".to_string(), Ok(PcmBuffer::new(vec![0.0; 12000], 1, RATE * 2))),
        ],
    }));

    let snap = rig.engine.snapshot();
    assert_eq!(snap.playable_stems(), 1);
    assert!(snap.stems[1].load_error);
    assert!(matches!(
        rig.engine.load_errors().as_slice(),
        [EngineError::StemLoad { stem, .. }] if stem == "drums"
    ));
    rig.engine.play().unwrap();
    assert_eq!(rig.voices().len(), 1);
}
