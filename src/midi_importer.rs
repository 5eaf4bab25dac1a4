use crate::assembler::convert;
use crate::error::ConvertError;
use crate::model::config::EncoderConfig;
use crate::model::midi::{DecodedMidi, MessageKind, TimedMessage};
use crate::model::score::Conversion;
use log::{debug, info};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::io;
use std::path::Path;

const MIDI_EXTENSIONS: [&str; 2] = ["mid", "midi"];

/// Reads a MIDI file after checking its name, extension and size. Nothing is read from disk when
/// the file is over `max_bytes`.
pub fn read_midi_file<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<Vec<u8>, ConvertError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ConvertError::InputMissing("no file name was given".into()));
    }

    let metadata = fs::metadata(path)
        .map_err(|e| ConvertError::InputMissing(format!("{}: {}", path.display(), e)))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();
    if !metadata.is_file() || !MIDI_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ConvertError::InputRejected(format!(
            "only MIDI files (.mid) can be converted, got {}",
            path.display()
        )));
    }

    if metadata.len() > max_bytes {
        return Err(ConvertError::InputRejected(format!(
            "{} is {} bytes, the limit is {} bytes",
            path.display(),
            metadata.len(),
            max_bytes
        )));
    }

    let bytes = fs::read(path).map_err(|e| unreadable(path, e))?;

    if bytes.is_empty() {
        return Err(ConvertError::InputRejected(format!("{} is empty", path.display())));
    }

    Ok(bytes)
}

fn unreadable(path: &Path, e: io::Error) -> ConvertError {
    ConvertError::InputMissing(format!("Failed to read MIDI file {}: {}", path.display(), e))
}

/// Decodes a Standard MIDI File into per-track delta-timed messages.
pub fn decode_midi(bytes: &[u8]) -> Result<DecodedMidi, ConvertError> {
    let smf = Smf::parse(bytes).map_err(|e| ConvertError::Decode(format!("Failed to parse MIDI: {}", e)))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(_fps, _subframe) => {
            return Err(ConvertError::Decode(
                "SMPTE timecode midi timing is not currently supported..!".into(),
            ));
        }
    };

    if ticks_per_beat == 0 {
        return Err(ConvertError::Decode("MIDI header has zero ticks per quarter note..!".into()));
    }

    debug!("Ticks per quarter note: {}", ticks_per_beat);
    debug!(
        "MIDI format: {:?}, tracks: {}",
        smf.header.format,
        smf.tracks.len()
    );

    let tracks = smf
        .tracks
        .iter()
        .map(|track| {
            track
                .iter()
                .map(|event| {
                    let kind = match &event.kind {
                        TrackEventKind::Midi { message, .. } => match message {
                            MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn {
                                note: key.as_int(),
                                velocity: vel.as_int(),
                            },
                            MidiMessage::NoteOff { key, .. } => MessageKind::NoteOff { note: key.as_int() },
                            _ => MessageKind::Other,
                        },
                        TrackEventKind::Meta(MetaMessage::Tempo(micro)) => MessageKind::SetTempo { tempo: micro.as_int() },
                        _ => MessageKind::Other,
                    };
                    TimedMessage::new(event.delta.as_int(), kind)
                })
                .collect()
        })
        .collect();

    Ok(DecodedMidi { ticks_per_beat, tracks })
}

/// Decodes and converts an in-memory MIDI file.
pub fn midi_bytes_to_mml(bytes: &[u8], config: &EncoderConfig) -> Result<Conversion, ConvertError> {
    if bytes.is_empty() {
        return Err(ConvertError::InputRejected("the MIDI data is empty".into()));
    }
    if bytes.len() as u64 > config.max_upload_bytes {
        return Err(ConvertError::InputRejected(format!(
            "MIDI data is {} bytes, the limit is {} bytes",
            bytes.len(),
            config.max_upload_bytes
        )));
    }

    let midi = decode_midi(bytes)?;
    convert(&midi, config)
}

pub fn import_midi_file<P: AsRef<Path>>(path: P, config: &EncoderConfig) -> Result<Conversion, ConvertError> {
    let bytes = read_midi_file(path.as_ref(), config.max_upload_bytes)?;
    info!(
        "Read {} bytes from '{}'..!",
        bytes.len(),
        path.as_ref().display()
    );
    midi_bytes_to_mml(&bytes, config)
}
