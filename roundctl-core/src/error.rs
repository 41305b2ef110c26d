use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoundCtlError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with an error status; carries its message.
    #[error("{0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RoundCtlError>;
