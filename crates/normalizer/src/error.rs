//! Error types for the normalizer crate

use inclusion_core::DomainError;
use thiserror::Error;

/// Why a single record was rejected
///
/// Record errors never abort a run: the normalizer turns each one into a
/// `MalformedRecord` diagnostic and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("references unknown event '{0}'")]
    UnknownEvent(String),

    #[error("inconsistent with category defaults: {0}")]
    CategoryMismatch(String),

    #[error("indicator rejected: {0}")]
    InvalidIndicator(#[from] DomainError),
}

/// Failures loading a record file
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse records: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
