use serde::{Deserialize, Serialize};

/// The subset of a track message the converter cares about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },

    /// Tempo in microseconds per quarter note.
    SetTempo { tempo: u32 },

    /// Anything else. Kept so its delta still advances the clock.
    Other,
}

/// A decoded message with its delta time in ticks since the previous message of the same track.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    pub delta: u32,
    pub kind: MessageKind,
}

impl TimedMessage {
    pub fn new(delta: u32, kind: MessageKind) -> Self {
        Self { delta, kind }
    }

    pub fn note_on(delta: u32, note: u8, velocity: u8) -> Self {
        Self::new(delta, MessageKind::NoteOn { note, velocity })
    }

    pub fn note_off(delta: u32, note: u8) -> Self {
        Self::new(delta, MessageKind::NoteOff { note })
    }

    pub fn set_tempo(delta: u32, tempo: u32) -> Self {
        Self::new(delta, MessageKind::SetTempo { tempo })
    }
}

/// A whole file as handed over by the decoder: one message list per track.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DecodedMidi {
    pub ticks_per_beat: u16,
    pub tracks: Vec<Vec<TimedMessage>>,
}
