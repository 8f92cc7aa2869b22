//! Runner errors

use inclusion_core::{IndicatorId, ScenarioKind};
use inclusion_normalizer::NormalizeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Engine error: {0}")]
    Engine(#[from] inclusion_engine::Error),

    #[error("Record loading failed: {0}")]
    Records(#[from] NormalizeError),

    #[error("Normalization task failed: {0}")]
    Normalization(String),

    #[error("Forecast task {indicator}/{scenario} failed: {reason}")]
    TaskFailed {
        indicator: IndicatorId,
        scenario: ScenarioKind,
        reason: String,
    },

    #[error("Forecast task {indicator}/{scenario} cancelled")]
    Cancelled {
        indicator: IndicatorId,
        scenario: ScenarioKind,
    },

    #[error("Failed to write {path}: {error}")]
    Io { path: String, error: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
