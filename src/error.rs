use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// No file was given, or the given path does not exist.
    #[error("No MIDI file given: {0}")]
    InputMissing(String),

    /// Wrong extension, empty file, or over the size ceiling.
    #[error("MIDI file rejected: {0}")]
    InputRejected(String),

    #[error("Conversion failed: {0}")]
    Decode(String),

    #[error("Conversion failed: {0}")]
    Encode(String),
}

impl ConvertError {
    /// HTTP-style status of this failure.
    pub fn status(&self) -> u16 {
        match self {
            ConvertError::InputMissing(_) | ConvertError::InputRejected(_) => 400,
            ConvertError::Decode(_) | ConvertError::Encode(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status() < 500
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_client_error() { 2 } else { 1 }
    }
}
