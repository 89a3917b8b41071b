use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("API unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(
        "Thumbnail bundle truncated at byte {offset}: need {needed} bytes, {available} available"
    )]
    TruncatedBundle {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Unknown song: {0}")]
    UnknownSong(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Audio output error: {0}")]
    AudioError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
