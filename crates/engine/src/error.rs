//! Forecast engine errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(
        "Insufficient history for {indicator}: {observations} observations, need at least {required}"
    )]
    InsufficientHistory {
        indicator: String,
        observations: usize,
        required: usize,
    },

    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },
}

pub type Result<T> = std::result::Result<T, Error>;
