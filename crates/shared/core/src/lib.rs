//! Inclusion Core Domain
//!
//! Pure domain types for the financial-inclusion forecasting engine:
//! indicators and their observation history, dated events, impact links,
//! forecast points and scenarios, calibration adjustments and diagnostics.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod dataset;
pub mod diagnostics;
pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use dataset::Dataset;
pub use diagnostics::{ConflictResolution, Diagnostic, RecordTable, Severity};
pub use entities::{
    CalibrationAdjustment, CategoryProfile, Confidence, EffectShape, Event, EventCategory,
    EventContribution, ExpectedSign, ForecastPoint, HistoricalObservation, ImpactLink, ImpactUnit,
    Indicator, IndicatorUnit, Scenario, ScenarioKind,
};
pub use error::{DomainError, DomainResult};
pub use values::{DAYS_PER_MONTH, DAYS_PER_YEAR, Date, EventId, IndicatorId, Value, days_between};
