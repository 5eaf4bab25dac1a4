use crate::model::config::EncoderConfig;
use crate::model::mml::*;
use crate::model::timeline::{NoteEvent, TempoEvent, TrackTimeline};
use log::{debug, warn};
use std::collections::BTreeSet;

pub mod chords;
pub mod scheduler;

use chords::{Grouping, group_chords};
use scheduler::{ScheduledEvent, resolve_durations, schedule};

/// Mutable state of one track's encoding. Never shared between tracks.
#[derive(Debug, Clone)]
pub struct EncoderState {
    pub octave: i32,
    pub length: NoteLength,
    pub volume: u8,
    pub tempo: u32,

    /// Pitches whose note-on has been seen but not their note-off.
    pub sounding: BTreeSet<u8>,

    /// End tick of the latest note or chord emitted so far.
    pub cursor: u64,

    tokens: Vec<Token>,
}

impl EncoderState {
    pub fn new(tempo: u32) -> Self {
        Self {
            octave: DEFAULT_OCTAVE,
            length: DEFAULT_LENGTH,
            volume: DEFAULT_VOLUME,
            tempo,
            sounding: BTreeSet::new(),
            cursor: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn last_token(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn emit(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Moves to `target`, at most `max_shift` octaves in one token.
    pub fn shift_octave(&mut self, target: i32, max_shift: u8) {
        let max_shift = max_shift as i32;
        let diff = (target - self.octave).clamp(-max_shift, max_shift);

        if diff > 0 {
            self.emit(Token::OctaveUp(diff as u8));
        } else if diff < 0 {
            self.emit(Token::OctaveDown(diff.unsigned_abs() as u8));
        }

        if diff != target - self.octave {
            warn!(
                "Octave jump from {} to {} clamped to {} octave(s)..!",
                self.octave, target, diff
            );
        }
        self.octave += diff;
    }

    pub fn set_length(&mut self, length: NoteLength) {
        if length != self.length {
            self.emit(Token::Length(length));
            self.length = length;
        }
    }

    pub fn set_volume(&mut self, volume: u8) {
        let after_volume = self.last_token().is_some_and(|t| t.is_volume());
        if volume != self.volume && !after_volume {
            self.emit(Token::Volume(volume));
            self.volume = volume;
        }
    }

    pub fn set_tempo(&mut self, bpm: u32) {
        if bpm != self.tempo {
            self.emit(Token::Tempo(bpm));
            self.tempo = bpm;
        }
    }

    /// Spells `midi` flat when flats are preferred, or when one of the last `lookback` tokens
    /// already spelled the same pitch class flat.
    pub fn spell(&self, midi: u8, preferred: Accidental, lookback: usize) -> Pitch {
        if preferred == Accidental::Flat {
            return Pitch::new(midi, Accidental::Flat);
        }

        let start = self.tokens.len().saturating_sub(lookback);
        let recently_flat = self.tokens[start..]
            .iter()
            .flat_map(|t| t.pitches())
            .any(|p| p.is_spelled_flat() && p.class() == midi % 12);

        if recently_flat {
            Pitch::new(midi, Accidental::Flat)
        } else {
            Pitch::new(midi, preferred)
        }
    }
}

struct TrackEncoder<'a> {
    config: &'a EncoderConfig,
    ticks_per_beat: u16,
    events: &'a [NoteEvent],
    grouping: Grouping,
    durations: Vec<Option<u64>>,
    state: EncoderState,
    overlaps: usize,
}

impl TrackEncoder<'_> {
    fn beats(&self, ticks: u64) -> f64 {
        ticks as f64 / self.ticks_per_beat as f64
    }

    fn duration(&self, index: usize) -> u64 {
        self.durations.get(index).copied().flatten().unwrap_or(0)
    }

    fn step(&mut self, event: ScheduledEvent) {
        match event {
            ScheduledEvent::Tempo(tempo) => {
                // the silence before a change still plays at the old tempo
                if tempo.bpm != self.state.tempo {
                    self.rest_before(tempo.time);
                }
                self.state.set_tempo(tempo.bpm);
            }
            ScheduledEvent::NoteOff(index) => {
                self.state.sounding.remove(&self.events[index].pitch);
            }
            ScheduledEvent::Note(index) => self.note(index),
            ScheduledEvent::Chord { chord, time } => self.chord(chord, time),
        }
    }

    /// Emits a rest when the silence since the cursor is long enough to hear.
    fn rest_before(&mut self, time: u64) {
        let gap = time.saturating_sub(self.state.cursor);
        if gap == 0 || self.beats(gap) < self.config.rest_threshold_beats {
            return;
        }

        self.state
            .set_length(NoteLength::from_ticks(gap, self.ticks_per_beat));
        self.state.emit(Token::Rest { dotted: false });
        self.state.cursor = time;
    }

    fn start_sounding(&mut self, pitch: u8) {
        if !self.state.sounding.is_empty() {
            self.overlaps += 1;
        }
        self.state.sounding.insert(pitch);
    }

    fn note(&mut self, index: usize) {
        let event = self.events[index];
        let gap = event.time.saturating_sub(self.state.cursor);
        let duration = self.duration(index);

        self.rest_before(event.time);
        self.start_sounding(event.pitch);

        self.state
            .shift_octave(octave_for(event.pitch), self.config.max_octave_shift);
        self.state.set_volume(velocity_to_volume(event.velocity));
        if duration > 0 {
            self.state
                .set_length(NoteLength::from_ticks(duration, self.ticks_per_beat));
        }

        let pitch = self.state.spell(
            event.pitch,
            self.config.accidental,
            self.config.spelling_lookback,
        );
        let repeats_last = matches!(
            self.state.last_token(),
            Some(Token::Note { pitch: last, .. }) if last.midi == event.pitch
        );
        let tied = repeats_last && self.beats(gap) < self.config.tie_threshold_beats;

        self.state.emit(Token::Note { pitch, tied });
        self.state.cursor = self.state.cursor.max(event.time + duration);
    }

    fn chord(&mut self, chord: usize, time: u64) {
        let (low_index, high_index) = {
            let group = &self.grouping.chords[chord];
            (group.low, group.high)
        };
        let low_event = self.events[low_index];
        let high_event = self.events[high_index];
        let duration = self.duration(low_index);

        self.rest_before(time);
        self.start_sounding(low_event.pitch);
        self.state.sounding.insert(high_event.pitch);

        let max_shift = self.config.max_octave_shift;
        let low_octave = octave_for(low_event.pitch);
        let high_octave = octave_for(high_event.pitch);

        self.state.shift_octave(low_octave, max_shift);
        self.state.set_volume(velocity_to_volume(
            low_event.velocity.max(high_event.velocity),
        ));
        if duration > 0 {
            self.state
                .set_length(NoteLength::from_ticks(duration, self.ticks_per_beat));
        }

        let (accidental, lookback) = (self.config.accidental, self.config.spelling_lookback);
        let low = self.state.spell(low_event.pitch, accidental, lookback);
        let high = self.state.spell(high_event.pitch, accidental, lookback);

        // B -> C style neighbours across the octave line are still written as one chord
        let wraps = high_octave == low_octave + 1 && low.class() >= 9 && high.class() <= 2;

        if high_octave == low_octave || wraps {
            self.state.emit(Token::Chord { low, high });
        } else {
            debug!(
                "Chord {} + {} at tick {} is too wide, writing it as two notes..!",
                low.midi, high.midi, time
            );
            self.state.emit(Token::Note { pitch: low, tied: false });
            self.state.shift_octave(high_octave, max_shift);
            self.state.emit(Token::Note { pitch: high, tied: false });
            self.state.shift_octave(low_octave, max_shift);
        }

        self.state.cursor = self.state.cursor.max(time + duration);
    }
}

/// Encodes one track into MML tokens, without the tempo prefix and setup block.
///
/// `initial_bpm` is the tempo already declared by the prefix, so only real changes are emitted.
pub fn encode_track(
    track: &TrackTimeline,
    tempos: &[TempoEvent],
    ticks_per_beat: u16,
    initial_bpm: u32,
    config: &EncoderConfig,
) -> Vec<Token> {
    let tolerance = EncoderConfig::beats_to_ticks(config.chord_tolerance_beats, ticks_per_beat);
    let grouping = group_chords(&track.events, tolerance);
    let durations = resolve_durations(track, ticks_per_beat);
    let scheduled = schedule(track, &grouping, tempos);

    let mut encoder = TrackEncoder {
        config,
        ticks_per_beat,
        events: &track.events,
        grouping,
        durations,
        state: EncoderState::new(initial_bpm),
        overlaps: 0,
    };

    for event in scheduled {
        encoder.step(event);
    }

    if encoder.overlaps > 0 {
        warn!(
            "Track {} has {} overlapping note(s) outside of chords, they will play in sequence..!",
            track.index, encoder.overlaps
        );
    }

    debug!(
        "Encoded track {}: {} chord(s), {} token(s)",
        track.index,
        encoder.grouping.chords.len(),
        encoder.state.tokens().len()
    );

    encoder.state.into_tokens()
}
