use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid synchronizer configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Failed to build the study server client: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

/// Errors raised when parsing enumerated names out of configuration or messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Unknown computing type: {0}")]
    UnknownComputingType(String),

    #[error("Unknown service availability: {0}")]
    UnknownServiceAvailability(String),
}

/// Failure of a single status fetch. Never propagated past the coordinator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport failure while fetching status: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Study server answered with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid status url: {0}")]
    InvalidUrl(String),

    #[error("Fetch aborted: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, Error>;
