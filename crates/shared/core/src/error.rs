use thiserror::Error;

use crate::values::{Date, IndicatorId};

/// Domain invariant violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Empty {0} identifier")]
    EmptyIdentifier(&'static str),

    #[error("Observations of {indicator} not strictly increasing: {previous} then {next}")]
    UnorderedObservations {
        indicator: IndicatorId,
        previous: Date,
        next: Date,
    },
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
