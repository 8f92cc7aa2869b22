use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::values::{Date, EventId, IndicatorId, Value};

/// Named forecast variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Pessimistic,
    Base,
    Optimistic,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Pessimistic,
        ScenarioKind::Base,
        ScenarioKind::Optimistic,
    ];
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKind::Pessimistic => f.write_str("pessimistic"),
            ScenarioKind::Base => f.write_str("base"),
            ScenarioKind::Optimistic => f.write_str("optimistic"),
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pessimistic" | "low" => Ok(ScenarioKind::Pessimistic),
            "base" | "baseline" => Ok(ScenarioKind::Base),
            "optimistic" | "high" => Ok(ScenarioKind::Optimistic),
            other => Err(format!("unknown scenario '{}'", other)),
        }
    }
}

/// How one event contributed to a forecast point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContribution {
    pub event_id: EventId,
    /// Effect produced by the event's curve before saturation
    pub modeled: Decimal,
    /// Effect kept after saturation
    pub applied: Decimal,
}

impl EventContribution {
    /// Part of the modeled effect discarded by saturation
    pub fn discarded(&self) -> Decimal {
        self.modeled.saturating_sub(self.applied)
    }
}

/// One dated forecast value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: Date,
    pub scenario: ScenarioKind,
    /// Trend-only value
    pub baseline_value: Value,
    /// `total_value - baseline_value`
    pub event_contribution: Value,
    pub total_value: Value,
    /// Half-width of the trend uncertainty band
    pub confidence_width: Decimal,
    /// Per-event breakdown, in modeling order
    pub contributions: Vec<EventContribution>,
}

impl ForecastPoint {
    pub fn lower_band(&self) -> Value {
        self.total_value.saturating_sub(self.confidence_width)
    }

    pub fn upper_band(&self) -> Value {
        self.total_value.saturating_add(self.confidence_width)
    }
}

/// A full forecast sequence for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub indicator: IndicatorId,
    pub points: Vec<ForecastPoint>,
}

impl Scenario {
    pub fn value_at(&self, date: Date) -> Option<Value> {
        self.points
            .iter()
            .find(|p| p.date == date)
            .map(|p| p.total_value)
    }

    pub fn last(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }
}

/// Back-tested correction for one (event, indicator) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationAdjustment {
    pub event_id: EventId,
    pub indicator: IndicatorId,
    /// Date of the observation the back-test was evaluated at
    pub evaluated_at: Date,
    pub predicted_delta: Decimal,
    pub actual_delta: Decimal,
    /// Clamped `actual_delta / predicted_delta`
    pub correction_factor: Decimal,
    /// True when the raw ratio fell outside the configured bounds
    pub clamped: bool,
}
