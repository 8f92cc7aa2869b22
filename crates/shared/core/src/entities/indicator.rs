use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Confidence;
use crate::error::DomainError;
use crate::values::{Date, IndicatorId, Value};

/// Unit of an indicator, which decides the domain-valid value range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorUnit {
    /// Share of a population, bounded to [0, 100]
    Percentage,
    /// Cumulative count or volume, never negative and never decreasing
    Count,
    /// Free-form level without bounds
    #[default]
    Level,
}

impl IndicatorUnit {
    /// Domain bounds (lower, upper) for a single value
    pub fn bounds(&self) -> (Option<Decimal>, Option<Decimal>) {
        match self {
            IndicatorUnit::Percentage => (Some(Decimal::ZERO), Some(Decimal::ONE_HUNDRED)),
            IndicatorUnit::Count => (Some(Decimal::ZERO), None),
            IndicatorUnit::Level => (None, None),
        }
    }

    /// Whether forecast values must be non-decreasing over time
    pub fn is_cumulative(&self) -> bool {
        matches!(self, IndicatorUnit::Count)
    }
}

impl fmt::Display for IndicatorUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorUnit::Percentage => f.write_str("percentage"),
            IndicatorUnit::Count => f.write_str("count"),
            IndicatorUnit::Level => f.write_str("level"),
        }
    }
}

impl FromStr for IndicatorUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" | "percent" | "pct" | "%" => Ok(IndicatorUnit::Percentage),
            "count" | "number" | "volume" => Ok(IndicatorUnit::Count),
            "level" | "value" | "" => Ok(IndicatorUnit::Level),
            other => Err(format!("unknown indicator unit '{}'", other)),
        }
    }
}

/// One ingested data point of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalObservation {
    pub date: Date,
    pub value: Value,
    pub confidence: Confidence,
}

impl HistoricalObservation {
    pub fn new(date: Date, value: Value, confidence: Confidence) -> Self {
        Self {
            date,
            value,
            confidence,
        }
    }
}

/// An indicator and its observation history
///
/// Observation dates are strictly increasing; the constructor rejects any
/// other ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub name: IndicatorId,
    pub unit: IndicatorUnit,
    observations: Vec<HistoricalObservation>,
}

impl Indicator {
    pub fn new(
        name: impl Into<IndicatorId>,
        unit: IndicatorUnit,
        observations: Vec<HistoricalObservation>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyIdentifier("indicator"));
        }

        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DomainError::UnorderedObservations {
                    indicator: name,
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        Ok(Self {
            name,
            unit,
            observations,
        })
    }

    pub fn observations(&self) -> &[HistoricalObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&HistoricalObservation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&HistoricalObservation> {
        self.observations.last()
    }

    /// Observations strictly before `date`
    pub fn observations_before(&self, date: Date) -> &[HistoricalObservation] {
        let end = self.observations.partition_point(|o| o.date < date);
        &self.observations[..end]
    }

    /// First observation on or after `date`
    pub fn first_on_or_after(&self, date: Date) -> Option<&HistoricalObservation> {
        let idx = self.observations.partition_point(|o| o.date < date);
        self.observations.get(idx)
    }
}
