//! Engine configuration
//!
//! Loaded from JSON with per-field defaults. An empty document `{}` is a
//! valid configuration.
//!
//! ## Example
//!
//! ```json
//! {
//!   "ramp_duration_months": 12,
//!   "saturation_ceiling": { "account_ownership": 95 },
//!   "scenario_perturbation_pct": {
//!     "optimistic": { "trend_pct": 20, "magnitude_pct": 30 },
//!     "pessimistic": { "trend_pct": -20, "magnitude_pct": -30 }
//!   },
//!   "calibration_correction_bounds": [0.25, 4.0],
//!   "validation_horizon_days": 365,
//!   "milestones": {
//!     "account_ownership": [{ "value": 60, "label": "NFIS-II target" }]
//!   }
//! }
//! ```

use inclusion_core::{Confidence, DAYS_PER_MONTH, IndicatorId, ScenarioKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ramp length of Gradual and S-curve effects
    #[serde(default = "default_ramp_duration_months")]
    pub ramp_duration_months: f64,

    /// Upper bound per indicator that combined effects cannot push past
    #[serde(default)]
    pub saturation_ceiling: BTreeMap<IndicatorId, Decimal>,

    #[serde(default)]
    pub scenario_perturbation_pct: PerturbationConfig,

    /// [min, max] applied to calibration correction factors
    #[serde(default = "default_correction_bounds")]
    pub calibration_correction_bounds: [Decimal; 2],

    /// Days after an event at which predicted and observed deltas are compared
    #[serde(default = "default_validation_horizon_days")]
    pub validation_horizon_days: i64,

    #[serde(default)]
    pub observation_weights: ObservationWeights,

    /// Multiplier of the residual spread for the confidence band
    #[serde(default = "default_band_z_score")]
    pub band_z_score: f64,

    /// Only add event realization beyond the last observation; off by default
    #[serde(default)]
    pub net_of_realized_effects: bool,

    #[serde(default)]
    pub milestones: BTreeMap<IndicatorId, Vec<Milestone>>,
}

/// Offsets applied to the optimistic and pessimistic scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationConfig {
    #[serde(default = "default_optimistic")]
    pub optimistic: ScenarioOffsets,
    #[serde(default = "default_pessimistic")]
    pub pessimistic: ScenarioOffsets,
}

impl PerturbationConfig {
    /// Offsets for a scenario; the base scenario is unperturbed
    pub fn offsets(&self, kind: ScenarioKind) -> ScenarioOffsets {
        match kind {
            ScenarioKind::Optimistic => self.optimistic,
            ScenarioKind::Pessimistic => self.pessimistic,
            ScenarioKind::Base => ScenarioOffsets::default(),
        }
    }
}

/// Percentage offsets on trend growth and event magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioOffsets {
    #[serde(default)]
    pub trend_pct: Decimal,
    #[serde(default)]
    pub magnitude_pct: Decimal,
}

impl ScenarioOffsets {
    pub fn new(trend_pct: Decimal, magnitude_pct: Decimal) -> Self {
        Self {
            trend_pct,
            magnitude_pct,
        }
    }
}

/// Trend fit weight per observation confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationWeights {
    #[serde(default = "default_high_weight")]
    pub high: f64,
    #[serde(default = "default_medium_weight")]
    pub medium: f64,
    #[serde(default = "default_low_weight")]
    pub low: f64,
}

impl ObservationWeights {
    /// Equal weight for every observation
    pub fn uniform() -> Self {
        Self {
            high: 1.0,
            medium: 1.0,
            low: 1.0,
        }
    }

    pub fn weight(&self, confidence: Confidence) -> f64 {
        match confidence {
            Confidence::High => self.high,
            Confidence::Medium => self.medium,
            Confidence::Low => self.low,
        }
    }
}

/// Target threshold tracked for an indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub value: Decimal,
    pub label: String,
}

impl Milestone {
    pub fn new(value: Decimal, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

fn default_ramp_duration_months() -> f64 {
    12.0
}

fn default_correction_bounds() -> [Decimal; 2] {
    [dec!(0.25), dec!(4.0)]
}

fn default_validation_horizon_days() -> i64 {
    365
}

fn default_band_z_score() -> f64 {
    1.96
}

fn default_optimistic() -> ScenarioOffsets {
    ScenarioOffsets::new(dec!(20), dec!(30))
}

fn default_pessimistic() -> ScenarioOffsets {
    ScenarioOffsets::new(dec!(-20), dec!(-30))
}

fn default_high_weight() -> f64 {
    1.0
}

fn default_medium_weight() -> f64 {
    0.75
}

fn default_low_weight() -> f64 {
    0.5
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            optimistic: default_optimistic(),
            pessimistic: default_pessimistic(),
        }
    }
}

impl Default for ObservationWeights {
    fn default() -> Self {
        Self {
            high: default_high_weight(),
            medium: default_medium_weight(),
            low: default_low_weight(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ramp_duration_months: default_ramp_duration_months(),
            saturation_ceiling: BTreeMap::new(),
            scenario_perturbation_pct: PerturbationConfig::default(),
            calibration_correction_bounds: default_correction_bounds(),
            validation_horizon_days: default_validation_horizon_days(),
            observation_weights: ObservationWeights::default(),
            band_z_score: default_band_z_score(),
            net_of_realized_effects: false,
            milestones: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfiguration(format!("parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder: set the ramp duration
    pub fn with_ramp_duration_months(mut self, months: f64) -> Self {
        self.ramp_duration_months = months;
        self
    }

    /// Builder: set a saturation ceiling for an indicator
    pub fn with_ceiling(mut self, indicator: impl Into<IndicatorId>, ceiling: Decimal) -> Self {
        self.saturation_ceiling.insert(indicator.into(), ceiling);
        self
    }

    /// Builder: set scenario offsets
    pub fn with_perturbation(
        mut self,
        optimistic: ScenarioOffsets,
        pessimistic: ScenarioOffsets,
    ) -> Self {
        self.scenario_perturbation_pct = PerturbationConfig {
            optimistic,
            pessimistic,
        };
        self
    }

    /// Builder: set calibration correction bounds
    pub fn with_correction_bounds(mut self, min: Decimal, max: Decimal) -> Self {
        self.calibration_correction_bounds = [min, max];
        self
    }

    /// Builder: set the validation horizon
    pub fn with_validation_horizon_days(mut self, days: i64) -> Self {
        self.validation_horizon_days = days;
        self
    }

    /// Builder: set observation weights
    pub fn with_observation_weights(mut self, weights: ObservationWeights) -> Self {
        self.observation_weights = weights;
        self
    }

    /// Builder: toggle netting of already realized effects
    pub fn with_net_of_realized_effects(mut self, enabled: bool) -> Self {
        self.net_of_realized_effects = enabled;
        self
    }

    /// Builder: add a milestone for an indicator
    pub fn with_milestone(mut self, indicator: impl Into<IndicatorId>, milestone: Milestone) -> Self {
        self.milestones
            .entry(indicator.into())
            .or_default()
            .push(milestone);
        self
    }

    pub fn ramp_days(&self) -> f64 {
        self.ramp_duration_months * DAYS_PER_MONTH
    }

    pub fn ceiling(&self, indicator: &str) -> Option<Decimal> {
        self.saturation_ceiling.get(indicator).copied()
    }

    pub fn correction_bounds(&self) -> (Decimal, Decimal) {
        let [min, max] = self.calibration_correction_bounds;
        (min, max)
    }

    pub fn milestones_for(&self, indicator: &str) -> &[Milestone] {
        self.milestones
            .get(indicator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ramp_duration_months.is_finite() || self.ramp_duration_months <= 0.0 {
            return Err(invalid(format!(
                "ramp_duration_months must be positive, got {}",
                self.ramp_duration_months
            )));
        }

        let optimistic = self.scenario_perturbation_pct.optimistic;
        if optimistic.trend_pct < Decimal::ZERO || optimistic.magnitude_pct < Decimal::ZERO {
            return Err(invalid(format!(
                "optimistic offsets must be >= 0, got trend {} magnitude {}",
                optimistic.trend_pct, optimistic.magnitude_pct
            )));
        }

        let pessimistic = self.scenario_perturbation_pct.pessimistic;
        let floor = -Decimal::ONE_HUNDRED;
        for (name, pct) in [
            ("trend_pct", pessimistic.trend_pct),
            ("magnitude_pct", pessimistic.magnitude_pct),
        ] {
            if pct > Decimal::ZERO || pct < floor {
                return Err(invalid(format!(
                    "pessimistic {} must be within [-100, 0], got {}",
                    name, pct
                )));
            }
        }

        let (min, max) = self.correction_bounds();
        if min <= Decimal::ZERO || min > Decimal::ONE || max < Decimal::ONE {
            return Err(invalid(format!(
                "calibration_correction_bounds must satisfy 0 < min <= 1 <= max, got [{}, {}]",
                min, max
            )));
        }

        if self.validation_horizon_days <= 0 {
            return Err(invalid(format!(
                "validation_horizon_days must be positive, got {}",
                self.validation_horizon_days
            )));
        }

        let weights = self.observation_weights;
        for (name, weight) in [
            ("high", weights.high),
            ("medium", weights.medium),
            ("low", weights.low),
        ] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(invalid(format!(
                    "observation weight '{}' must be positive, got {}",
                    name, weight
                )));
            }
        }

        if !self.band_z_score.is_finite() || self.band_z_score < 0.0 {
            return Err(invalid(format!(
                "band_z_score must be >= 0, got {}",
                self.band_z_score
            )));
        }

        for (indicator, milestones) in &self.milestones {
            if milestones.iter().any(|m| m.label.trim().is_empty()) {
                return Err(invalid(format!(
                    "milestones for '{}' must have non-empty labels",
                    indicator
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfiguration(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.ramp_duration_months, 12.0);
        assert_eq!(config.correction_bounds(), (dec!(0.25), dec!(4.0)));
        assert_eq!(config.validation_horizon_days, 365);
        assert!(!config.net_of_realized_effects);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "ramp_duration_months": 18,
            "saturation_ceiling": { "account_ownership": 95 },
            "scenario_perturbation_pct": {
                "optimistic": { "trend_pct": 10, "magnitude_pct": 25 },
                "pessimistic": { "trend_pct": -15, "magnitude_pct": -40 }
            },
            "calibration_correction_bounds": [0.5, 2],
            "validation_horizon_days": 180,
            "observation_weights": { "low": 0.25 },
            "band_z_score": 1.0,
            "net_of_realized_effects": true,
            "milestones": {
                "account_ownership": [{ "value": 60, "label": "target" }]
            }
        }"#;

        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.ramp_duration_months, 18.0);
        assert_eq!(config.ceiling("account_ownership"), Some(dec!(95)));
        assert_eq!(config.ceiling("mobile_money"), None);
        assert_eq!(
            config.scenario_perturbation_pct.offsets(ScenarioKind::Pessimistic),
            ScenarioOffsets::new(dec!(-15), dec!(-40))
        );
        assert_eq!(
            config.scenario_perturbation_pct.offsets(ScenarioKind::Base),
            ScenarioOffsets::default()
        );
        assert_eq!(config.correction_bounds(), (dec!(0.5), dec!(2)));
        assert_eq!(config.observation_weights.low, 0.25);
        assert_eq!(config.observation_weights.high, 1.0);
        assert!(config.net_of_realized_effects);
        assert_eq!(config.milestones_for("account_ownership").len(), 1);
        assert!(config.milestones_for("mobile_money").is_empty());
    }

    #[test]
    fn test_ramp_days_uses_average_month() {
        let config = EngineConfig::default();
        assert_eq!(config.ramp_days(), 365.25);
    }

    #[test]
    fn test_rejects_non_positive_ramp() {
        let err = EngineConfig::from_json(r#"{ "ramp_duration_months": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = EngineConfig::default().with_correction_bounds(dec!(4), dec!(0.25));
        assert!(config.validate().is_err());

        let config = EngineConfig::default().with_correction_bounds(dec!(0), dec!(2));
        assert!(config.validate().is_err());

        let config = EngineConfig::default().with_correction_bounds(dec!(1), dec!(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_misdirected_offsets() {
        let config = EngineConfig::default().with_perturbation(
            ScenarioOffsets::new(dec!(-5), dec!(10)),
            ScenarioOffsets::new(dec!(-5), dec!(-10)),
        );
        assert!(config.validate().is_err());

        let config = EngineConfig::default().with_perturbation(
            ScenarioOffsets::new(dec!(5), dec!(10)),
            ScenarioOffsets::new(dec!(-5), dec!(-150)),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_weights_and_horizon() {
        let config = EngineConfig::default().with_observation_weights(ObservationWeights {
            high: 1.0,
            medium: 0.0,
            low: 0.5,
        });
        assert!(config.validate().is_err());

        let config = EngineConfig::default().with_validation_horizon_days(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_invalid_configuration() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::from_file("/nonexistent/engine.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
