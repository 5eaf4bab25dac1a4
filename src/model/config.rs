use crate::model::mml::Accidental;
use crate::util::parse_accidentals;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAX_LENGTH: usize = 1200;
pub const DEFAULT_MAX_OCTAVE_SHIFT: u8 = 8;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(
    name = "midi_mml",
    about = "Convert a MIDI file into melody/harmony MML for an in-game music player!"
)]
pub struct Args {
    /// Path to the source MIDI file (.mid or .midi).
    pub midi: PathBuf,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: json|text.
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Pretty-print JSON output.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Maximum number of characters per encoded track, at most 1200.
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// How to spell black keys: sharp|flat.
    #[arg(short, long, default_value = "sharp")]
    pub accidentals: String,

    /// Largest octave jump a single shift token may perform.
    #[arg(long, default_value_t = DEFAULT_MAX_OCTAVE_SHIFT)]
    pub max_octave_shift: u8,

    /// Dry run (log the track ranking and the first dry_run_max events of each selected track, then exit).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum events to print per track in dry run.
    #[arg(long, default_value_t = 80)]
    pub dry_run_max: usize,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            max_length: self.max_length.min(DEFAULT_MAX_LENGTH),
            max_octave_shift: self.max_octave_shift.max(1),
            accidental: parse_accidentals(&self.accidentals),
            ..EncoderConfig::default()
        }
    }
}

/// Tunables of the encoding pipeline. Thresholds are fractions of one beat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Note-ons closer than this to a cluster's first note-on form a chord.
    pub chord_tolerance_beats: f64,

    /// Silences shorter than this are absorbed instead of emitting a rest.
    pub rest_threshold_beats: f64,

    /// A repeated pitch following within this gap is tied to the previous note.
    pub tie_threshold_beats: f64,

    pub max_length: usize,
    pub max_octave_shift: u8,
    pub accidental: Accidental,

    /// How many trailing tokens are searched for an earlier flat spelling.
    pub spelling_lookback: usize,

    pub max_upload_bytes: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            chord_tolerance_beats: 0.05,
            rest_threshold_beats: 0.2,
            tie_threshold_beats: 0.1,
            max_length: DEFAULT_MAX_LENGTH,
            max_octave_shift: DEFAULT_MAX_OCTAVE_SHIFT,
            accidental: Accidental::Sharp,
            spelling_lookback: 10,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl EncoderConfig {
    pub fn beats_to_ticks(beats: f64, ticks_per_beat: u16) -> f64 {
        beats * ticks_per_beat as f64
    }
}
