use crate::error::ConvertError;
use crate::model::midi::{DecodedMidi, MessageKind, TimedMessage};
use crate::model::timeline::*;
use log::{debug, warn};

const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;
const MAX_DATA_BYTE: u8 = 127;

/// Converts microseconds per quarter note into whole beats per minute.
pub fn tempo_to_bpm(mpqn: u32) -> Option<u32> {
    if mpqn == 0 {
        return None;
    }
    Some((MICROSECONDS_PER_MINUTE / mpqn as f64).round() as u32)
}

/// Turns one track's delta-timed messages into absolute-time note events, appending its tempo
/// changes to `tempos`.
pub fn build_track(
    index: usize,
    messages: &[TimedMessage],
    tempos: &mut Vec<TempoEvent>,
) -> Result<TrackTimeline, ConvertError> {
    let mut abs_tick: u64 = 0;
    let mut events: Vec<NoteEvent> = Vec::new();

    for message in messages {
        abs_tick = abs_tick.saturating_add(message.delta as u64);

        match message.kind {
            MessageKind::NoteOn { note, velocity } => {
                check_data_byte(index, abs_tick, "note", note)?;
                check_data_byte(index, abs_tick, "velocity", velocity)?;

                let kind = if velocity > 0 { NoteKind::NoteOn } else { NoteKind::NoteOff };
                events.push(NoteEvent {
                    time: abs_tick,
                    kind,
                    pitch: note,
                    velocity,
                });
            }
            MessageKind::NoteOff { note } => {
                check_data_byte(index, abs_tick, "note", note)?;
                events.push(NoteEvent {
                    time: abs_tick,
                    kind: NoteKind::NoteOff,
                    pitch: note,
                    velocity: 0,
                });
            }
            MessageKind::SetTempo { tempo } => match tempo_to_bpm(tempo) {
                Some(bpm) => {
                    debug!(
                        "Tempo change at tick {} -> {} us/qn ({} bpm, track {})",
                        abs_tick, tempo, bpm, index
                    );
                    tempos.push(TempoEvent { time: abs_tick, bpm });
                }
                None => warn!(
                    "Skipping zero tempo at tick {} on track {}..!",
                    abs_tick, index
                ),
            },
            MessageKind::Other => {}
        }
    }

    Ok(TrackTimeline { index, events })
}

/// Builds every track's timeline plus the shared, time-sorted tempo map. Tracks without note
/// events are left out.
pub fn build_timeline(midi: &DecodedMidi) -> Result<Timeline, ConvertError> {
    let mut tempos: Vec<TempoEvent> = Vec::new();
    let mut tracks: Vec<TrackTimeline> = Vec::new();

    for (index, messages) in midi.tracks.iter().enumerate() {
        let track = build_track(index, messages, &mut tempos)?;
        if track.has_content() {
            tracks.push(track);
        } else {
            debug!("Track {} has no note events, skipping..!", index);
        }
    }

    // stable, so equal ticks keep track order
    tempos.sort_by_key(|t| t.time);

    Ok(Timeline {
        ticks_per_beat: midi.ticks_per_beat,
        tracks,
        tempos,
    })
}

fn check_data_byte(track: usize, tick: u64, what: &str, value: u8) -> Result<(), ConvertError> {
    if value > MAX_DATA_BYTE {
        return Err(ConvertError::Encode(format!(
            "{} {} out of range on track {} at tick {}",
            what, value, track, tick
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accumulates_absolute_time() {
        env_logger::try_init().unwrap_or(());

        let messages = vec![
            TimedMessage::note_on(0, 60, 100),
            TimedMessage::new(100, MessageKind::Other),
            TimedMessage::note_off(380, 60),
            TimedMessage::note_on(0, 62, 90),
            TimedMessage::note_on(240, 62, 0),
        ];

        let mut tempos = Vec::new();
        let track = build_track(0, &messages, &mut tempos).unwrap();

        let times: Vec<u64> = track.events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0, 480, 480, 720]);
        assert_eq!(track.note_on_count(), 2);
        assert!(tempos.is_empty());
    }

    #[test]
    fn zero_velocity_is_note_off() {
        env_logger::try_init().unwrap_or(());

        let messages = vec![TimedMessage::note_on(0, 64, 80), TimedMessage::note_on(10, 64, 0)];
        let mut tempos = Vec::new();
        let track = build_track(3, &messages, &mut tempos).unwrap();

        assert_eq!(track.index, 3);
        assert_eq!(track.events[0].kind, NoteKind::NoteOn);
        assert_eq!(track.events[1].kind, NoteKind::NoteOff);
        assert_eq!(track.events[1].velocity, 0);
    }

    #[test]
    fn tempo_conversion() {
        assert_eq!(tempo_to_bpm(500_000), Some(120));
        assert_eq!(tempo_to_bpm(600_000), Some(100));
        assert_eq!(tempo_to_bpm(480_000), Some(125));
        assert_eq!(tempo_to_bpm(0), None);
    }

    #[test]
    fn tempo_map_is_global_and_sorted() {
        env_logger::try_init().unwrap_or(());

        let midi = DecodedMidi {
            ticks_per_beat: 480,
            tracks: vec![
                vec![
                    TimedMessage::set_tempo(0, 500_000),
                    TimedMessage::set_tempo(960, 600_000),
                ],
                vec![
                    TimedMessage::set_tempo(480, 400_000),
                    TimedMessage::note_on(0, 60, 100),
                    TimedMessage::note_off(480, 60),
                ],
                vec![TimedMessage::set_tempo(0, 0)],
            ],
        };

        let timeline = build_timeline(&midi).unwrap();
        assert_eq!(timeline.tracks.len(), 1);
        assert_eq!(timeline.tracks[0].index, 1);

        let bpms: Vec<(u64, u32)> = timeline.tempos.iter().map(|t| (t.time, t.bpm)).collect();
        assert_eq!(bpms, vec![(0, 120), (480, 150), (960, 100)]);
        assert_eq!(timeline.initial_bpm(), 120);
    }

    #[test]
    fn last_tick_zero_tempo_is_initial() {
        let midi = DecodedMidi {
            ticks_per_beat: 480,
            tracks: vec![
                vec![TimedMessage::set_tempo(0, 500_000)],
                vec![TimedMessage::set_tempo(0, 600_000)],
                vec![TimedMessage::note_on(0, 60, 100), TimedMessage::note_off(240, 60)],
            ],
        };

        let timeline = build_timeline(&midi).unwrap();
        assert_eq!(timeline.initial_bpm(), 100);
    }

    #[test]
    fn default_tempo_without_tick_zero_change() {
        let midi = DecodedMidi {
            ticks_per_beat: 96,
            tracks: vec![vec![
                TimedMessage::note_on(0, 60, 100),
                TimedMessage::set_tempo(96, 750_000),
                TimedMessage::note_off(0, 60),
            ]],
        };

        let timeline = build_timeline(&midi).unwrap();
        assert_eq!(timeline.initial_bpm(), DEFAULT_BPM);
        assert_eq!(timeline.tempos[0].bpm, 80);
    }

    #[test]
    fn rejects_out_of_range_pitch() {
        let messages = vec![TimedMessage::note_on(0, 200, 100)];
        let mut tempos = Vec::new();
        let err = build_track(0, &messages, &mut tempos).unwrap_err();
        assert!(matches!(err, ConvertError::Encode(_)));
    }
}
