use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_OCTAVE: i32 = 4;
pub const DEFAULT_VOLUME: u8 = 13;
pub const DEFAULT_LENGTH: NoteLength = NoteLength::Eighth;
pub const MIN_VOLUME: u8 = 1;
pub const MAX_VOLUME: u8 = 15;

const SHARP_NAMES: [&str; 12] = [
    "C", "C+", "D", "D+", "E", "F", "F+", "G", "G+", "A", "A+", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "D-", "D", "E-", "E", "F", "G-", "G", "A-", "A", "B-", "B",
];

/// How black keys are spelled. Purely cosmetic, `C+` and `D-` are the same pitch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Accidental {
    #[default]
    Sharp,
    Flat,
}

/// A MIDI pitch together with the spelling it is rendered with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pitch {
    pub midi: u8,
    pub accidental: Accidental,
}

impl Pitch {
    pub fn new(midi: u8, accidental: Accidental) -> Self {
        Self { midi, accidental }
    }

    pub fn class(&self) -> u8 {
        self.midi % 12
    }

    pub fn octave(&self) -> i32 {
        octave_for(self.midi)
    }

    pub fn is_black_key(&self) -> bool {
        matches!(self.class(), 1 | 3 | 6 | 8 | 10)
    }

    /// Whether this pitch is actually written with a flat.
    pub fn is_spelled_flat(&self) -> bool {
        self.accidental == Accidental::Flat && self.is_black_key()
    }

    pub fn name(&self) -> &'static str {
        match self.accidental {
            Accidental::Sharp => SHARP_NAMES[self.class() as usize],
            Accidental::Flat => FLAT_NAMES[self.class() as usize],
        }
    }
}

/// MML octave of a MIDI pitch, middle C (60) being octave 4.
pub fn octave_for(midi: u8) -> i32 {
    (midi / 12) as i32 - 1
}

/// Maps a MIDI velocity onto the 1..=15 volume scale.
pub fn velocity_to_volume(velocity: u8) -> u8 {
    (velocity as u32).div_ceil(8).clamp(MIN_VOLUME as u32, MAX_VOLUME as u32) as u8
}

/// Supported note lengths, named by their MML divisor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLength {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    DottedHalf,
    DottedQuarter,
    DottedEighth,
    DottedSixteenth,
}

/// Every length with its size in beats, in tie-breaking order.
const LENGTHS: &[(NoteLength, f64)] = &[
    (NoteLength::Whole, 4.0),
    (NoteLength::Half, 2.0),
    (NoteLength::Quarter, 1.0),
    (NoteLength::Eighth, 0.5),
    (NoteLength::Sixteenth, 0.25),
    (NoteLength::ThirtySecond, 0.125),
    (NoteLength::DottedHalf, 3.0),
    (NoteLength::DottedQuarter, 1.5),
    (NoteLength::DottedEighth, 0.75),
    (NoteLength::DottedSixteenth, 0.375),
];

impl NoteLength {
    pub fn beats(&self) -> f64 {
        LENGTHS
            .iter()
            .find(|(length, _)| length == self)
            .map(|(_, beats)| *beats)
            .unwrap_or(0.0)
    }

    /// The supported length closest to `beats`. Equal distances keep the earlier table entry.
    pub fn quantize(beats: f64) -> Self {
        LENGTHS
            .iter()
            .min_by(|(_, a), (_, b)| (a - beats).abs().total_cmp(&(b - beats).abs()))
            .map(|(length, _)| *length)
            .unwrap_or(DEFAULT_LENGTH)
    }

    pub fn from_ticks(ticks: u64, ticks_per_beat: u16) -> Self {
        Self::quantize(ticks as f64 / ticks_per_beat as f64)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            NoteLength::Whole => "1",
            NoteLength::Half => "2",
            NoteLength::Quarter => "4",
            NoteLength::Eighth => "8",
            NoteLength::Sixteenth => "16",
            NoteLength::ThirtySecond => "32",
            NoteLength::DottedHalf => "2.",
            NoteLength::DottedQuarter => "4.",
            NoteLength::DottedEighth => "8.",
            NoteLength::DottedSixteenth => "16.",
        }
    }
}

impl fmt::Display for NoteLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One self-delimiting unit of MML output.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Tempo(u32),
    Rest { dotted: bool },
    Length(NoteLength),
    Volume(u8),
    OctaveUp(u8),
    OctaveDown(u8),

    /// A single note. `tied` renders a leading `&`, fusing it to the previous note.
    Note { pitch: Pitch, tied: bool },

    /// Two pitches sounding together, rendered as two adjacent names.
    Chord { low: Pitch, high: Pitch },
}

impl Token {
    pub fn is_volume(&self) -> bool {
        matches!(self, Token::Volume(_))
    }

    /// The pitches this token spells, if any.
    pub fn pitches(&self) -> impl Iterator<Item = Pitch> {
        let (first, second) = match *self {
            Token::Note { pitch, .. } => (Some(pitch), None),
            Token::Chord { low, high } => (Some(low), Some(high)),
            _ => (None, None),
        };
        first.into_iter().chain(second)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Tempo(bpm) => write!(f, "T{}", bpm),
            Token::Rest { dotted: false } => f.write_str("R"),
            Token::Rest { dotted: true } => f.write_str("R."),
            Token::Length(length) => write!(f, "L{}", length),
            Token::Volume(volume) => write!(f, "V{}", volume),
            Token::OctaveUp(n) => f.write_str(&">".repeat(*n as usize)),
            Token::OctaveDown(n) => f.write_str(&"<".repeat(*n as usize)),
            Token::Note { pitch, tied: false } => f.write_str(pitch.name()),
            Token::Note { pitch, tied: true } => write!(f, "&{}", pitch.name()),
            Token::Chord { low, high } => write!(f, "{}{}", low.name(), high.name()),
        }
    }
}

pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.to_string()).collect()
}
