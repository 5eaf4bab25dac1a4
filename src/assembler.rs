use crate::engine::encode_track;
use crate::error::ConvertError;
use crate::model::config::EncoderConfig;
use crate::model::midi::DecodedMidi;
use crate::model::mml::{DEFAULT_LENGTH, DEFAULT_VOLUME, Token};
use crate::model::score::{Conversion, TrackLabel, TrackResult};
use crate::model::timeline::Timeline;
use crate::selector::select_tracks;
use crate::timeline::build_timeline;
use log::{debug, info, warn};

/// Tempo declaration and lead-in rest every track starts with, even an empty one.
pub fn prefix(bpm: u32) -> [Token; 2] {
    [Token::Tempo(bpm), Token::Rest { dotted: true }]
}

/// Setup matching the encoder's initial state, written before the first encoded token.
pub fn setup_block() -> [Token; 2] {
    [Token::Volume(DEFAULT_VOLUME), Token::Length(DEFAULT_LENGTH)]
}

/// Renders `tokens` behind the prefix and setup block, keeping only whole tokens that fit in
/// `max_length` characters.
pub fn assemble_track(label: TrackLabel, tokens: &[Token], bpm: u32, max_length: usize) -> TrackResult {
    let setup_tokens = setup_block();
    let setup: &[Token] = if tokens.is_empty() { &[] } else { &setup_tokens };
    let lead = prefix(bpm);
    let all = lead.iter().chain(setup).chain(tokens);
    let total = lead.len() + setup.len() + tokens.len();

    let mut text = String::new();
    for (written, token) in all.enumerate() {
        let rendered = token.to_string();
        if text.len() + rendered.len() > max_length {
            warn!(
                "Truncating {} at {} characters, dropping {} of {} token(s)..!",
                label,
                text.len(),
                total - written,
                total
            );
            break;
        }
        text.push_str(&rendered);
    }

    TrackResult { label, text }
}

/// Selects, encodes and assembles the three output tracks of an already built timeline.
pub fn convert_timeline(timeline: &Timeline, config: &EncoderConfig) -> Result<Conversion, ConvertError> {
    if timeline.ticks_per_beat == 0 {
        return Err(ConvertError::Encode("ticks per beat must be greater than 0".into()));
    }

    let bpm = timeline.initial_bpm();
    debug!(
        "Converting {} track(s) at {} ticks per beat, starting at {} bpm",
        timeline.tracks.len(),
        timeline.ticks_per_beat,
        bpm
    );

    let results = select_tracks(&timeline.tracks).map(|(label, track)| {
        let tokens = match track {
            Some(track) => {
                info!("Encoding track {} as {}..!", track.index, label);
                encode_track(track, &timeline.tempos, timeline.ticks_per_beat, bpm, config)
            }
            None => {
                debug!("No track left for {}, leaving it empty", label);
                Vec::new()
            }
        };
        assemble_track(label, &tokens, bpm, config.max_length)
    });

    Ok(Conversion::from_tracks(results))
}

/// Full pipeline from decoded messages to the three MML strings.
pub fn convert(midi: &DecodedMidi, config: &EncoderConfig) -> Result<Conversion, ConvertError> {
    let timeline = build_timeline(midi)?;
    convert_timeline(&timeline, config)
}
