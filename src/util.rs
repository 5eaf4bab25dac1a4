use crate::{Accidental, OutputFormat};
use log::info;

pub fn parse_accidentals(input: &str) -> Accidental {
    match input.to_lowercase().as_str() {
        "s" | "sharp" | "sharps" | "+" => Accidental::Sharp,
        "f" | "flat" | "flats" | "-" => Accidental::Flat,
        other => {
            info!("Unknown accidental style '{}', defaulting to `sharp`..!", other);
            Accidental::Sharp
        }
    }
}

pub fn parse_format(s: &str) -> OutputFormat {
    match s.to_lowercase().as_str() {
        "j" | "json" => OutputFormat::Json,
        "t" | "txt" | "text" | "mml" => OutputFormat::Text,
        other => {
            info!("Unknown output format '{}', defaulting to `json`..!", other);
            OutputFormat::Json
        }
    }
}
