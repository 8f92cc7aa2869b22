//! Trend Estimator
//!
//! Fits a monotonic growth model to an indicator's observation history.
//!
//! # Models
//!
//! Both models are anchored at the first observation `(x = 0, v0)` with `x`
//! measured in days since that observation:
//!
//! - **Linear**: `v(x) = v0 + b·x`
//! - **Compound**: `v(x) = v0·exp(r·x)`, only when every value is positive
//!
//! Slopes are weighted least squares through the anchor, each observation
//! weighted by its source confidence. The model with the smaller weighted
//! residual wins; ties go to linear.

use inclusion_core::{
    DAYS_PER_YEAR, Date, HistoricalObservation, Indicator, IndicatorId, days_between,
};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{EngineConfig, ObservationWeights};
use crate::error::{Error, Result};
use crate::numeric::{to_decimal, to_f64};

/// Minimum observations for a trend fit
pub const MIN_OBSERVATIONS: usize = 2;

/// Relative margin by which compound must beat linear
const SELECTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendKind {
    Linear,
    Compound,
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendKind::Linear => f.write_str("linear"),
            TrendKind::Compound => f.write_str("compound"),
        }
    }
}

/// Fitted baseline for one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub indicator: IndicatorId,
    pub kind: TrendKind,
    /// Date of the first observation (x = 0)
    pub origin: Date,
    pub origin_value: f64,
    /// Slope per day (linear) or continuous growth rate per day (compound)
    pub rate: f64,
    pub last_observation: Date,
    /// Weighted sum of squared residuals
    pub sse: f64,
    pub residual_std: f64,
    pub observations: usize,
    pub band_z_score: f64,
    /// Extra rate applied beyond the last observation (scenario perturbation)
    #[serde(default)]
    pub excess_rate: f64,
}

impl TrendFit {
    /// Baseline as a float
    pub fn value_at(&self, date: Date) -> f64 {
        let x = days_between(self.origin, date) as f64;
        let beyond = days_between(self.last_observation, date).max(0) as f64;
        match self.kind {
            TrendKind::Linear => self.origin_value + self.rate * x + self.excess_rate * beyond,
            TrendKind::Compound => {
                self.origin_value * (self.rate * x + self.excess_rate * beyond).exp()
            }
        }
    }

    pub fn baseline(&self, date: Date) -> Decimal {
        to_decimal(self.value_at(date))
    }

    /// Units per year (linear) or fractional growth per year (compound)
    pub fn annualized_growth_rate(&self) -> f64 {
        match self.kind {
            TrendKind::Linear => self.rate * DAYS_PER_YEAR,
            TrendKind::Compound => (self.rate * DAYS_PER_YEAR).exp() - 1.0,
        }
    }

    /// Half-width of the confidence band at `date`
    ///
    /// Grows linearly with the years elapsed since the last observation.
    pub fn confidence_width(&self, date: Date) -> f64 {
        let gap_years = days_between(self.last_observation, date).max(0) as f64 / DAYS_PER_YEAR;
        self.band_z_score * self.residual_std * (1.0 + gap_years)
    }

    /// Copy with growth beyond the last observation shifted by `pct` percent
    /// of its magnitude, in the direction of the sign of `pct`.
    pub fn with_growth_adjustment(&self, pct: Decimal) -> TrendFit {
        let mut adjusted = self.clone();
        adjusted.excess_rate = self.rate.abs() * to_f64(pct) / 100.0;
        adjusted
    }
}

/// Weighted least-squares trend estimator
#[derive(Debug, Clone)]
pub struct TrendEstimator {
    weights: ObservationWeights,
    band_z_score: f64,
}

impl TrendEstimator {
    pub fn new(weights: ObservationWeights, band_z_score: f64) -> Self {
        Self {
            weights,
            band_z_score,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.observation_weights, config.band_z_score)
    }

    pub fn fit(&self, indicator: &Indicator) -> Result<TrendFit> {
        self.fit_observations(&indicator.name, indicator.observations())
    }

    /// Fit a trend on a slice of chronologically ordered observations
    pub fn fit_observations(
        &self,
        indicator: &str,
        observations: &[HistoricalObservation],
    ) -> Result<TrendFit> {
        if observations.len() < MIN_OBSERVATIONS {
            return Err(Error::InsufficientHistory {
                indicator: indicator.to_string(),
                observations: observations.len(),
                required: MIN_OBSERVATIONS,
            });
        }

        let origin = observations[0].date;
        let v0 = to_f64(observations[0].value);
        let points: Vec<(f64, f64, f64)> = observations
            .iter()
            .map(|o| {
                (
                    days_between(origin, o.date) as f64,
                    to_f64(o.value),
                    self.weights.weight(o.confidence),
                )
            })
            .collect();

        let sum_wx2: f64 = points.iter().map(|(x, _, w)| w * x * x).sum();

        let slope = points.iter().map(|(x, y, w)| w * x * (y - v0)).sum::<f64>() / sum_wx2;
        let linear_sse: f64 = points
            .iter()
            .map(|(x, y, w)| w * (y - (v0 + slope * x)).powi(2))
            .sum();

        let mut kind = TrendKind::Linear;
        let mut rate = slope;
        let mut sse = linear_sse;

        if points.iter().all(|(_, y, _)| *y > 0.0) {
            let growth = points
                .iter()
                .map(|(x, y, w)| w * x * (y / v0).ln())
                .sum::<f64>()
                / sum_wx2;
            let compound_sse: f64 = points
                .iter()
                .map(|(x, y, w)| w * (y - v0 * (growth * x).exp()).powi(2))
                .sum();

            if compound_sse + SELECTION_TOLERANCE * (1.0 + linear_sse) < linear_sse {
                kind = TrendKind::Compound;
                rate = growth;
                sse = compound_sse;
            }
        }

        let n = points.len();
        let residual_std = (sse / (n - 1) as f64).sqrt();
        let last_observation = observations[n - 1].date;

        let fit = TrendFit {
            indicator: indicator.to_string(),
            kind,
            origin,
            origin_value: v0,
            rate,
            last_observation,
            sse,
            residual_std,
            observations: n,
            band_z_score: self.band_z_score,
            excess_rate: 0.0,
        };

        debug!(
            "Fitted {} trend for {}: {} obs, annualized growth {:.4}, residual std {:.4}",
            fit.kind,
            indicator,
            n,
            fit.annualized_growth_rate(),
            residual_std
        );

        Ok(fit)
    }
}
