//! Non-fatal outcomes attached to pipeline outputs
//!
//! Nothing the pipeline drops, overrides or corrects disappears silently:
//! each such decision is recorded as a [`Diagnostic`] and travels with the
//! artifact that was affected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::ScenarioKind;
use crate::values::{Date, EventId, IndicatorId};

/// Input table a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTable {
    Observation,
    Event,
    ImpactLink,
}

impl fmt::Display for RecordTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordTable::Observation => f.write_str("observation"),
            RecordTable::Event => f.write_str("event"),
            RecordTable::ImpactLink => f.write_str("impact_link"),
        }
    }
}

/// How a duplicate record was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// The record with the higher confidence tag replaced the other
    HigherConfidence,
    /// Equal rank; the first-seen record was kept
    FirstSeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Record dropped because a required field was missing or unparsable
    MalformedRecord {
        table: RecordTable,
        row: usize,
        reason: String,
    },
    /// Duplicate key; one record kept
    ConflictWarning {
        table: RecordTable,
        key: String,
        resolution: ConflictResolution,
        detail: String,
    },
    CalibrationApplied {
        event_id: EventId,
        indicator: IndicatorId,
        factor: Decimal,
        clamped: bool,
    },
    CalibrationSkipped {
        event_id: EventId,
        indicator: IndicatorId,
        reason: String,
    },
    /// Event effect cut at the indicator's ceiling
    SaturationApplied {
        indicator: IndicatorId,
        scenario: ScenarioKind,
        date: Date,
        event_id: EventId,
        discarded: Decimal,
    },
    /// Total moved back inside the unit's domain bounds
    BoundClamped {
        indicator: IndicatorId,
        scenario: ScenarioKind,
        date: Date,
        from: Decimal,
        to: Decimal,
    },
    /// Value left the decimal range and was held at its limit
    ValueOverflow {
        indicator: IndicatorId,
        scenario: ScenarioKind,
        date: Date,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::MalformedRecord { .. }
            | Diagnostic::ConflictWarning { .. }
            | Diagnostic::ValueOverflow { .. } => Severity::Warning,
            Diagnostic::CalibrationApplied { clamped, .. } => {
                if *clamped {
                    Severity::Warning
                } else {
                    Severity::Info
                }
            }
            Diagnostic::CalibrationSkipped { .. }
            | Diagnostic::SaturationApplied { .. }
            | Diagnostic::BoundClamped { .. } => Severity::Info,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedRecord { table, row, reason } => {
                write!(f, "malformed {} record at row {}: {}", table, row, reason)
            }
            Diagnostic::ConflictWarning {
                table,
                key,
                resolution,
                detail,
            } => write!(
                f,
                "conflicting {} records for {} ({:?}): {}",
                table, key, resolution, detail
            ),
            Diagnostic::CalibrationApplied {
                event_id,
                indicator,
                factor,
                clamped,
            } => write!(
                f,
                "calibration {} -> {}: factor {}{}",
                event_id,
                indicator,
                factor,
                if *clamped { " (clamped)" } else { "" }
            ),
            Diagnostic::CalibrationSkipped {
                event_id,
                indicator,
                reason,
            } => write!(
                f,
                "calibration {} -> {} skipped: {}",
                event_id, indicator, reason
            ),
            Diagnostic::SaturationApplied {
                indicator,
                scenario,
                date,
                event_id,
                discarded,
            } => write!(
                f,
                "{} [{}] {}: saturation discarded {} of {}",
                indicator, scenario, date, discarded, event_id
            ),
            Diagnostic::BoundClamped {
                indicator,
                scenario,
                date,
                from,
                to,
            } => write!(
                f,
                "{} [{}] {}: clamped {} to {}",
                indicator, scenario, date, from, to
            ),
            Diagnostic::ValueOverflow {
                indicator,
                scenario,
                date,
            } => write!(
                f,
                "{} [{}] {}: value out of decimal range, held at limit",
                indicator, scenario, date
            ),
        }
    }
}
