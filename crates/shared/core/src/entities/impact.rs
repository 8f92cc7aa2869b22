use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Confidence, EventCategory, ExpectedSign};
use crate::values::{EventId, IndicatorId};

/// Temporal profile by which an event's magnitude is realized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectShape {
    /// Full magnitude from the first effective day
    Immediate,
    /// Linear ramp over the ramp duration
    Gradual,
    /// Logistic adoption curve over the ramp duration
    SCurve,
}

impl fmt::Display for EffectShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectShape::Immediate => f.write_str("immediate"),
            EffectShape::Gradual => f.write_str("gradual"),
            EffectShape::SCurve => f.write_str("s_curve"),
        }
    }
}

impl FromStr for EffectShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "immediate" | "step" => Ok(EffectShape::Immediate),
            "gradual" | "linear" => Ok(EffectShape::Gradual),
            "scurve" | "logistic" | "sigmoid" => Ok(EffectShape::SCurve),
            _ => Err(format!("unknown effect shape '{}'", s.trim())),
        }
    }
}

/// How an impact magnitude is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactUnit {
    /// Absolute change in the indicator's own unit (percentage points for shares)
    #[default]
    PercentagePoints,
    /// Relative change, percent of the baseline at effect start
    Percent,
}

impl FromStr for ImpactUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pp" | "percentage_points" | "points" | "abs" | "" => Ok(ImpactUnit::PercentagePoints),
            "pct" | "percent" | "%" | "rel" => Ok(ImpactUnit::Percent),
            other => Err(format!("unknown impact unit '{}'", other)),
        }
    }
}

/// Estimated impact of one event on one indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactLink {
    pub event_id: EventId,
    pub indicator: IndicatorId,
    /// Signed magnitude, interpreted according to `unit`
    pub magnitude: Decimal,
    pub unit: ImpactUnit,
    pub shape: EffectShape,
    pub lag_days: u32,
    pub confidence: Confidence,
    /// Ramp duration override in months
    pub ramp_months: Option<u32>,
    /// Accept a shape/sign that departs from the category defaults
    pub overrides_defaults: bool,
}

impl ImpactLink {
    pub fn new(
        event_id: impl Into<EventId>,
        indicator: impl Into<IndicatorId>,
        magnitude: Decimal,
        shape: EffectShape,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            indicator: indicator.into(),
            magnitude,
            unit: ImpactUnit::PercentagePoints,
            shape,
            lag_days: 0,
            confidence: Confidence::Medium,
            ramp_months: None,
            overrides_defaults: false,
        }
    }

    /// Builder: set lag in days
    pub fn with_lag_days(mut self, lag_days: u32) -> Self {
        self.lag_days = lag_days;
        self
    }

    /// Builder: set confidence
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Builder: set magnitude unit
    pub fn with_unit(mut self, unit: ImpactUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Builder: override the ramp duration
    pub fn with_ramp_months(mut self, months: u32) -> Self {
        self.ramp_months = Some(months);
        self
    }

    /// Builder: mark as explicitly overriding category defaults
    pub fn overriding_defaults(mut self) -> Self {
        self.overrides_defaults = true;
        self
    }

    /// Check shape and sign against the category defaults
    ///
    /// Returns a description of the first inconsistency found. Links that
    /// override defaults are always consistent.
    pub fn check_category(&self, category: EventCategory) -> Result<(), String> {
        if self.overrides_defaults {
            return Ok(());
        }

        let profile = category.profile();
        if !profile.allowed_shapes.contains(&self.shape) {
            return Err(format!(
                "shape {} is not allowed for {} events",
                self.shape, category
            ));
        }

        if profile.expected_sign == ExpectedSign::NonNegative && self.magnitude < Decimal::ZERO {
            return Err(format!(
                "negative magnitude {} for {} event",
                self.magnitude, category
            ));
        }

        Ok(())
    }
}
