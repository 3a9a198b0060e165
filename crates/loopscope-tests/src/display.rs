//! Integration tests for display preparation.
//!
//! Exercises loopscope-core messages through the loopscope-display engine,
//! including the JSON wire form a timeline view sends and receives.

use loopscope_core::{
    ChannelInput, DisplayConfig, DisplayRequest, DisplayResponse, LoopscopeError, MagnitudeStat,
    NoteEvent,
};
use loopscope_display::DisplayEngine;

// ── Helpers ────────────────────────────────────────────────────

fn engine() -> DisplayEngine {
    crate::init_tracing();
    DisplayEngine::new(DisplayConfig::without_lead_in())
}

fn prepare_json(engine: &DisplayEngine, json: &str) -> DisplayResponse {
    let request = DisplayRequest::from_json(json.as_bytes()).unwrap();
    engine.prepare(&request).unwrap()
}

// ── Alignment & binning ────────────────────────────────────────

#[test]
fn two_channels_with_different_offsets() {
    let resp = prepare_json(
        &engine(),
        r#"{
            "request_id": 1,
            "samples_per_bin": 4,
            "channels_data": [
                ["A", {"audio": [1, -1, 1, -1, 1, -1, 1, -1], "start_offset": 0}],
                ["B", {"audio": [2, 2], "start_offset": -4}]
            ]
        }"#,
    );

    assert_eq!(resp.render_start_pos, 0);
    assert_eq!(resp.n_bins(), Some(2));

    let a = resp.channel("A").unwrap();
    let a_audio = a.audio.as_ref().unwrap();
    assert_eq!(a.included_pre_padding, 0);
    assert_eq!(a_audio.transient_positive, vec![1.0, 1.0]);
    assert_eq!(a_audio.transient_negative, vec![-1.0, -1.0]);
    assert_eq!(a_audio.rms, vec![1.0, 1.0]);

    let b = resp.channel("B").unwrap();
    let b_audio = b.audio.as_ref().unwrap();
    assert_eq!(b.included_pre_padding, 4);
    assert_eq!(b_audio.transient_positive, vec![0.0, 2.0]);
    assert_eq!(b_audio.transient_negative, vec![0.0, 0.0]);
    assert_eq!(b_audio.rms, vec![0.0, 1.0]);
}

#[test]
fn midi_note_rescales_to_bins() {
    // Audio channel starting at -5 pulls the render start to -5
    let resp = prepare_json(
        &engine(),
        r#"{
            "request_id": 2,
            "samples_per_bin": 5,
            "channels_data": [
                ["audio", {"audio": [0, 0, 0, 0, 0], "start_offset": 5}],
                ["midi", {"midi_notes": [{"start": 0, "end": 10, "note": 100, "channel": 4}], "start_offset": 0}]
            ]
        }"#,
    );

    assert_eq!(resp.render_start_pos, -5);
    let midi = resp.channel("midi").unwrap();
    assert!(midi.audio.is_none());
    assert_eq!(midi.included_pre_padding, 5);
    let notes = midi.midi_notes.as_ref().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].start, 1.0);
    assert_eq!(notes[0].end, 3.0);
    assert_eq!(notes[0].note, 100);
    assert_eq!(notes[0].channel, 4);
}

#[test]
fn single_sample_bins_reproduce_the_signal() {
    let samples: Vec<f32> = vec![0.5, -0.25, 0.0, 0.75, -1.0];
    let req = DisplayRequest::new(3, 1).with_channel("a", ChannelInput::audio(samples.clone(), 0));
    let resp = engine().prepare(&req).unwrap();
    let audio = resp.channel("a").unwrap().audio.as_ref().unwrap();

    for (i, &s) in samples.iter().enumerate() {
        let s = s as f64;
        assert_eq!(audio.rms[i], s.abs());
        assert_eq!(audio.transient_positive[i], s.max(0.0));
        assert_eq!(audio.transient_negative[i], s.min(0.0));
    }
}

#[test]
fn empty_audio_channel_is_all_silence() {
    let req = DisplayRequest::new(4, 2)
        .with_channel("long", ChannelInput::audio(vec![0.3; 10], 6))
        .with_channel("empty", ChannelInput::audio(Vec::new(), 0));
    let resp = engine().prepare(&req).unwrap();

    let empty = resp.channel("empty").unwrap();
    let audio = empty.audio.as_ref().unwrap();
    assert_eq!(audio.len(), resp.n_bins().unwrap());
    assert!(audio.is_silent());
    assert_eq!(empty.included_pre_padding as i64, -resp.render_start_pos);
}

#[test]
fn lead_in_adds_leading_silent_bins() {
    let config = DisplayConfig {
        lead_in_bins: 3,
        ..DisplayConfig::default()
    };
    let req = DisplayRequest::new(5, 4).with_channel("a", ChannelInput::audio(vec![1.0; 8], 0));
    let resp = DisplayEngine::new(config).prepare(&req).unwrap();

    assert_eq!(resp.render_start_pos, -12);
    let a = resp.channel("a").unwrap();
    assert_eq!(a.included_pre_padding, 12);
    assert_eq!(a.audio.as_ref().unwrap().rms, vec![0.0, 0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn mixed_audio_and_midi_channel() {
    let req = DisplayRequest::new(6, 4).with_channel(
        "both",
        ChannelInput::audio_and_midi(vec![0.5; 8], vec![NoteEvent::new(4, 8, 60, 1)], 0),
    );
    let resp = engine().prepare(&req).unwrap();
    let both = resp.channel("both").unwrap();
    assert_eq!(both.audio.as_ref().unwrap().len(), 2);
    let notes = both.midi_notes.as_ref().unwrap();
    assert_eq!((notes[0].start, notes[0].end), (1.0, 2.0));
}

#[test]
fn true_rms_is_opt_in() {
    let req = DisplayRequest::new(7, 2).with_channel("a", ChannelInput::audio(vec![1.0, 0.0], 0));
    let mean_abs = engine().prepare(&req).unwrap();
    let rms = DisplayEngine::new(DisplayConfig {
        magnitude: MagnitudeStat::RootMeanSquare,
        ..DisplayConfig::without_lead_in()
    })
    .prepare(&req)
    .unwrap();

    assert_eq!(mean_abs.channel("a").unwrap().audio.as_ref().unwrap().rms, vec![0.5]);
    let r = rms.channel("a").unwrap().audio.as_ref().unwrap().rms[0];
    assert!((r - 0.5f64.sqrt()).abs() < 1e-12);
}

// ── Wire form ──────────────────────────────────────────────────

#[test]
fn response_json_omits_absent_fields() {
    let resp = prepare_json(
        &engine(),
        r#"{
            "request_id": 8,
            "samples_per_bin": 2,
            "channels_data": [
                ["m", {"midi_notes": [{"start": 0, "end": 2, "note": 60, "channel": 0}], "start_offset": 0}]
            ]
        }"#,
    );
    let json: serde_json::Value = serde_json::from_slice(&resp.to_json().unwrap()).unwrap();
    let chan = &json["channels_data"][0];
    assert_eq!(chan[0], "m");
    assert!(chan[1].get("audio").is_none());
    assert_eq!(chan[1]["included_pre_padding"], 0);
    assert_eq!(chan[1]["midi_notes"][0]["end"], 1.0);
    assert_eq!(json["render_start_pos"], 0);
    assert_eq!(json["samples_per_bin"], 2);
}

#[test]
fn identical_requests_give_identical_bytes() {
    let req = DisplayRequest::new(9, 3)
        .with_channel("a", ChannelInput::audio((0..100).map(|i| (i as f32).cos()).collect(), 13))
        .with_channel("m", ChannelInput::midi(vec![NoteEvent::new(1, 40, 61, 2)], -7));
    let engine = DisplayEngine::default();
    let first = engine.prepare(&req).unwrap().to_json().unwrap();
    let second = engine.prepare(&req).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

// ── Rejections ─────────────────────────────────────────────────

#[test]
fn channel_without_data_is_invalid_input() {
    let err = DisplayRequest::from_json(
        br#"{"request_id":1,"samples_per_bin":4,"channels_data":[["x",{"start_offset":0}]]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, LoopscopeError::InvalidInput(_)));
    assert!(err.is_precondition());
    assert!(err.to_string().contains("neither audio nor midi_notes"));
}

#[test]
fn offsets_at_the_axis_limits_are_rejected() {
    let engine = engine();

    let req = DisplayRequest::new(1, 4).with_channel("a", ChannelInput::audio(vec![0.5; 8], i64::MIN));
    assert!(matches!(engine.prepare(&req), Err(LoopscopeError::InvalidInput(_))));

    let req = DisplayRequest::new(2, 4).with_channel(
        "m",
        ChannelInput::midi(vec![NoteEvent::new(0, i64::MAX, 60, 0)], -1),
    );
    assert!(matches!(engine.prepare(&req), Err(LoopscopeError::InvalidInput(_))));

    // Last bin would end past i64::MAX
    let req = DisplayRequest::new(3, i64::MAX / 2 + 1).with_channel(
        "m",
        ChannelInput::midi(vec![NoteEvent::new(0, i64::MAX - 1, 60, 0)], 0),
    );
    assert!(matches!(engine.prepare(&req), Err(LoopscopeError::InvalidInput(_))));
}

#[test]
fn unsorted_notes_are_rejected() {
    let req = DisplayRequest::new(10, 4).with_channel(
        "m",
        ChannelInput::midi(vec![NoteEvent::new(8, 9, 60, 0), NoteEvent::new(2, 3, 60, 0)], 0),
    );
    assert!(matches!(
        engine().prepare(&req),
        Err(LoopscopeError::MalformedNoteList { .. })
    ));
}

#[test]
fn negative_bin_width_is_rejected() {
    let req = DisplayRequest::new(11, -16).with_channel("a", ChannelInput::audio(vec![0.0], 0));
    let err = engine().prepare(&req).unwrap_err();
    assert!(matches!(err, LoopscopeError::InvalidInput(_)));
    assert!(err.is_precondition());
}
