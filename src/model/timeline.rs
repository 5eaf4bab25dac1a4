use serde::{Deserialize, Serialize};

pub const DEFAULT_BPM: u32 = 120;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    NoteOn,
    NoteOff,
}

/// A note event at an absolute tick. `velocity` is 0 for `NoteOff`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub time: u64,
    pub kind: NoteKind,
    pub pitch: u8,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn is_note_on(&self) -> bool {
        self.kind == NoteKind::NoteOn
    }
}

/// A transport-wide tempo change.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoEvent {
    pub time: u64,
    pub bpm: u32,
}

/// Near-simultaneous note-ons of one track collapsed into a two-pitch chord.
///
/// `low` and `high` are indices into the owning [`TrackTimeline::events`], so the
/// encoder can look up the velocities and durations of the chosen members.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChordGroup {
    pub time: u64,
    pub low: usize,
    pub high: usize,

    /// Every note-on index absorbed by this group, chosen pair included.
    pub members: Vec<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrackTimeline {
    /// Position of the track in the source file.
    pub index: usize,
    pub events: Vec<NoteEvent>,
}

impl TrackTimeline {
    pub fn note_on_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_note_on()).count()
    }

    pub fn has_content(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn last_time(&self) -> u64 {
        self.events.last().map(|e| e.time).unwrap_or(0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Timeline {
    pub ticks_per_beat: u16,

    /// Only tracks with at least one note event.
    pub tracks: Vec<TrackTimeline>,

    /// Tempo changes from every track, sorted by tick.
    pub tempos: Vec<TempoEvent>,
}

impl Timeline {
    /// The tempo in effect when playback starts, the last of any changes on tick 0.
    pub fn initial_bpm(&self) -> u32 {
        self.tempos
            .iter()
            .take_while(|t| t.time == 0)
            .last()
            .map(|t| t.bpm)
            .unwrap_or(DEFAULT_BPM)
    }
}
