use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackLabel {
    Melody,
    Harmony1,
    Harmony2,
}

impl TrackLabel {
    pub const ALL: [TrackLabel; 3] = [TrackLabel::Melody, TrackLabel::Harmony1, TrackLabel::Harmony2];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackLabel::Melody => "melody",
            TrackLabel::Harmony1 => "harmony1",
            TrackLabel::Harmony2 => "harmony2",
        }
    }
}

impl fmt::Display for TrackLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrackResult {
    pub label: TrackLabel,
    pub text: String,
}

/// The three encoded tracks, serialised as `{"melody": .., "harmony1": .., "harmony2": ..}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub melody: String,
    pub harmony1: String,
    pub harmony2: String,
}

impl Conversion {
    pub fn from_tracks(tracks: [TrackResult; 3]) -> Self {
        let mut conversion = Conversion::default();
        for track in tracks {
            match track.label {
                TrackLabel::Melody => conversion.melody = track.text,
                TrackLabel::Harmony1 => conversion.harmony1 = track.text,
                TrackLabel::Harmony2 => conversion.harmony2 = track.text,
            }
        }
        conversion
    }

    pub fn get(&self, label: TrackLabel) -> &str {
        match label {
            TrackLabel::Melody => &self.melody,
            TrackLabel::Harmony1 => &self.harmony1,
            TrackLabel::Harmony2 => &self.harmony2,
        }
    }

    /// One `label: text` line per track.
    pub fn to_text(&self) -> String {
        TrackLabel::ALL
            .iter()
            .map(|label| format!("{}: {}\n", label, self.get(*label)))
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// How a [`Conversion`] is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}
