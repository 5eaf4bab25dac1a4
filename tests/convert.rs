//! End-to-end conversions of in-memory MIDI files.

use midi_mml::{Conversion, ConvertError, EncoderConfig, midi_bytes_to_mml};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

const PPQ: u16 = 480;

/// (start, end, pitch) notes at velocity 100, turned into one delta-timed track.
fn note_track(notes: &[(u32, u32, u8)]) -> Vec<TrackEvent<'static>> {
    let mut timed: Vec<(u32, bool, u8)> = Vec::new();
    for &(start, end, pitch) in notes {
        timed.push((start, true, pitch));
        timed.push((end, false, pitch));
    }
    timed.sort_by_key(|&(tick, is_on, _)| (tick, is_on));

    let mut events = Vec::new();
    let mut last = 0;
    for (tick, is_on, pitch) in timed {
        let vel: u8 = if is_on { 100 } else { 0 };
        events.push(TrackEvent {
            delta: (tick - last).into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key: pitch.into(),
                    vel: vel.into(),
                },
            },
        });
        last = tick;
    }
    events.push(end_of_track());
    events
}

fn tempo_track(mpqn: u32) -> Vec<TrackEvent<'static>> {
    vec![
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(mpqn.into())),
        },
        end_of_track(),
    ]
}

/// Tempo changes as (tick, microseconds per beat), absolute ticks.
fn tempo_changes(changes: &[(u32, u32)]) -> Vec<TrackEvent<'static>> {
    let mut events = Vec::new();
    let mut last = 0;
    for &(tick, mpqn) in changes {
        events.push(TrackEvent {
            delta: (tick - last).into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(mpqn.into())),
        });
        last = tick;
    }
    events.push(end_of_track());
    events
}

fn end_of_track() -> TrackEvent<'static> {
    TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

fn smf_bytes(tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(PPQ.into()),
        },
        tracks,
    };
    let mut out: Vec<u8> = Vec::new();
    smf.write(&mut out).unwrap();
    out
}

fn convert(tracks: Vec<Vec<TrackEvent<'static>>>) -> Conversion {
    env_logger::try_init().unwrap_or(());
    midi_bytes_to_mml(&smf_bytes(tracks), &EncoderConfig::default()).unwrap()
}

/// Body of a track after the "T<bpm>R.V13L8" prefix and setup block.
fn body(text: &str) -> &str {
    let start = text.find("L8").map(|i| i + 2).unwrap_or(text.len());
    &text[start..]
}

/// `count` eighth notes of `pitch`, each followed by an eighth rest.
fn staccato(pitch: u8, count: u32) -> Vec<(u32, u32, u8)> {
    (0..count).map(|i| (i * 480, i * 480 + 240, pitch)).collect()
}

#[test]
fn conversion_is_deterministic() {
    let tracks = || {
        vec![
            tempo_track(500_000),
            note_track(&[(0, 240, 60), (0, 240, 67), (240, 600, 62), (960, 1920, 74)]),
            note_track(&staccato(48, 12)),
        ]
    };

    let first = serde_json::to_string(&convert(tracks())).unwrap();
    let second = serde_json::to_string(&convert(tracks())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn dense_tracks_stay_within_the_limit() {
    let dense: Vec<(u32, u32, u8)> = (0..3000)
        .map(|i| (i * 60, i * 60 + 30, 36 + (i % 48) as u8))
        .collect();

    let conversion = convert(vec![note_track(&dense), note_track(&dense), note_track(&dense)]);
    assert!(conversion.melody.len() <= 1200);
    assert!(conversion.harmony1.len() <= 1200);
    assert!(conversion.harmony2.len() <= 1200);
    assert!(conversion.melody.len() > 1100);
}

#[test]
fn first_tempo_is_declared() {
    let conversion = convert(vec![tempo_track(500_000), note_track(&[(0, 240, 60)])]);
    assert!(conversion.melody.starts_with("T120"));

    let conversion = convert(vec![tempo_track(600_000), note_track(&[(0, 240, 60)])]);
    assert!(conversion.melody.starts_with("T100R."));
}

#[test]
fn length_quantization_boundaries() {
    let conversion = convert(vec![note_track(&[(0, 240, 60)])]);
    assert_eq!(body(&conversion.melody), "C");

    let conversion = convert(vec![note_track(&[(0, 360, 60)])]);
    assert_eq!(body(&conversion.melody), "L8.C");
}

#[test]
fn octave_round_trip() {
    let conversion = convert(vec![note_track(&[(0, 240, 60), (240, 480, 72), (480, 720, 60)])]);
    let melody = body(&conversion.melody);

    assert_eq!(melody, "C>C<C");
    assert_eq!(melody.matches('>').count(), 1);
    assert_eq!(melody.matches('<').count(), 1);
}

#[test]
fn densest_track_is_the_melody() {
    let conversion = convert(vec![
        tempo_track(500_000),
        note_track(&staccato(62, 5)),
        note_track(&staccato(60, 40)),
        note_track(&staccato(64, 15)),
    ]);

    assert_eq!(conversion.melody.matches('C').count(), 40);
    assert_eq!(conversion.harmony1.matches('E').count(), 15);
    assert_eq!(conversion.harmony2.matches('D').count(), 5);
    assert!(!conversion.melody.contains('E'));
}

#[test]
fn unused_slots_are_prefix_only() {
    let conversion = convert(vec![tempo_track(500_000), note_track(&[(0, 240, 60)]), vec![end_of_track()]]);

    assert_eq!(conversion.melody, "T120R.V13L8C");
    assert_eq!(conversion.harmony1, "T120R.");
    assert_eq!(conversion.harmony2, "T120R.");
}

#[test]
fn chord_tolerance_window() {
    // 10 ticks apart is inside 0.05 beats at 480 ppq: one chord using the low note's length
    let conversion = convert(vec![note_track(&[(0, 480, 60), (10, 130, 64)])]);
    assert_eq!(body(&conversion.melody), "L4CE");

    // 30 ticks apart is outside: two notes with their own lengths
    let conversion = convert(vec![note_track(&[(0, 480, 60), (30, 150, 64)])]);
    assert_eq!(body(&conversion.melody), "L4CL16E");
}

#[test]
fn serializes_to_the_response_shape() {
    let conversion = convert(vec![note_track(&[(0, 240, 60)])]);
    let json: serde_json::Value = serde_json::to_value(&conversion).unwrap();

    assert_eq!(json["melody"], "T120R.V13L8C");
    assert_eq!(json["harmony1"], "T120R.");
    assert_eq!(json["harmony2"], "T120R.");
}

#[test]
fn corrupt_data_is_an_internal_failure() {
    let err = midi_bytes_to_mml(b"MThd", &EncoderConfig::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Decode(_)));
    assert_eq!(err.status(), 500);
}

#[test]
fn unison_doubling_is_encoded_once() {
    let conversion = convert(vec![note_track(&[(0, 240, 60), (0, 240, 60), (240, 480, 62)])]);
    assert_eq!(body(&conversion.melody), "CD");
}

#[test]
fn tempo_change_during_a_rest_keeps_its_tick() {
    let conversion = convert(vec![
        tempo_changes(&[(0, 500_000), (960, 1_000_000)]),
        note_track(&[(0, 240, 60), (1920, 2160, 62)]),
    ]);
    assert_eq!(conversion.melody, "T120R.V13L8CL4.RT60L2RL8D");
}

#[test]
fn last_tempo_on_the_first_tick_is_declared() {
    let conversion = convert(vec![
        tempo_track(500_000),
        tempo_track(600_000),
        note_track(&[(0, 240, 60)]),
    ]);
    assert_eq!(conversion.melody, "T100R.V13L8C");
}

#[test]
fn chords_across_the_octave_line() {
    let conversion = convert(vec![note_track(&[(0, 240, 71), (0, 240, 72)])]);
    assert_eq!(body(&conversion.melody), "BC");

    let conversion = convert(vec![note_track(&[(0, 240, 60), (0, 240, 76), (240, 480, 62)])]);
    assert_eq!(body(&conversion.melody), "C>E<D");
}
