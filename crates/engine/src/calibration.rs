//! Calibrator
//!
//! Back-tests each (event, indicator) link against the first observation at
//! least `validation_horizon_days` after the event and derives a correction
//! factor for its magnitude.
//!
//! # Method
//!
//! ```text
//! counterfactual = trend fitted on observations before the event
//! predicted      = modeled effect at the post-event observation
//! actual         = observed − counterfactual − other events' incremental effects
//! factor         = clamp(actual / predicted, [min, max])
//! ```
//!
//! Links without a post-event observation, without enough pre-event history
//! or with a zero predicted delta keep a factor of exactly 1.0.

use chrono::Days;
use inclusion_core::{
    CalibrationAdjustment, Dataset, Diagnostic, EventId, Indicator, IndicatorId,
};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::effects::EventEffectModeler;
use crate::numeric::to_decimal;
use crate::trend::TrendEstimator;

/// Correction factors keyed by (event, indicator)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationTable {
    adjustments: BTreeMap<(EventId, IndicatorId), CalibrationAdjustment>,
}

impl CalibrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, adjustment: CalibrationAdjustment) {
        let key = (adjustment.event_id.clone(), adjustment.indicator.clone());
        self.adjustments.insert(key, adjustment);
    }

    pub fn get(&self, event_id: &str, indicator: &str) -> Option<&CalibrationAdjustment> {
        self.adjustments
            .get(&(event_id.to_string(), indicator.to_string()))
    }

    /// Correction factor, 1.0 when the link was never calibrated
    pub fn factor(&self, event_id: &str, indicator: &str) -> Decimal {
        self.get(event_id, indicator)
            .map(|a| a.correction_factor)
            .unwrap_or(Decimal::ONE)
    }

    pub fn adjustments(&self) -> impl Iterator<Item = &CalibrationAdjustment> {
        self.adjustments.values()
    }

    pub fn len(&self) -> usize {
        self.adjustments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }
}

/// Calibration outcome for one indicator
#[derive(Debug, Clone, Default)]
pub struct CalibrationReport {
    pub table: CalibrationTable,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct Calibrator {
    estimator: TrendEstimator,
    modeler: EventEffectModeler,
    bounds: (Decimal, Decimal),
    horizon_days: u64,
}

impl Calibrator {
    pub fn new(
        estimator: TrendEstimator,
        modeler: EventEffectModeler,
        bounds: (Decimal, Decimal),
        horizon_days: u64,
    ) -> Self {
        Self {
            estimator,
            modeler,
            bounds,
            horizon_days,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            TrendEstimator::from_config(config),
            EventEffectModeler::from_config(config),
            config.correction_bounds(),
            config.validation_horizon_days.max(0) as u64,
        )
    }

    pub fn calibrate(&self, dataset: &Dataset, indicator: &Indicator) -> CalibrationReport {
        let mut report = CalibrationReport::default();

        for (event, link) in dataset.links_for(&indicator.name) {
            let skip = |reason: String| {
                debug!(
                    "Calibration skipped for {} on {}: {}",
                    event.id, indicator.name, reason
                );
                Diagnostic::CalibrationSkipped {
                    event_id: event.id.clone(),
                    indicator: indicator.name.clone(),
                    reason,
                }
            };

            let Some(target) = event
                .effective_date
                .checked_add_days(Days::new(self.horizon_days))
            else {
                report
                    .diagnostics
                    .push(skip("validation date out of range".to_string()));
                continue;
            };

            let Some(post) = indicator.first_on_or_after(target) else {
                report
                    .diagnostics
                    .push(skip(format!("no observation on or after {}", target)));
                continue;
            };

            let before = indicator.observations_before(event.effective_date);
            let counterfactual = match self.estimator.fit_observations(&indicator.name, before) {
                Ok(fit) => fit,
                Err(e) => {
                    report.diagnostics.push(skip(format!("no counterfactual trend: {}", e)));
                    continue;
                }
            };

            let start = EventEffectModeler::effect_start(event, link);
            let magnitude = self.modeler.reference_magnitude(link, &counterfactual, start);
            let fraction = self.modeler.fraction_at(event, link, post.date);
            let predicted = magnitude.saturating_mul(to_decimal(fraction));

            let others: Decimal = dataset
                .links_for(&indicator.name)
                .filter(|(other, _)| other.id != event.id)
                .map(|(other, other_link)| {
                    let other_start = EventEffectModeler::effect_start(other, other_link);
                    let other_magnitude =
                        self.modeler
                            .reference_magnitude(other_link, &counterfactual, other_start);
                    let fraction = self.modeler.incremental_fraction(
                        other,
                        other_link,
                        post.date,
                        Some(event.effective_date),
                    );
                    other_magnitude.saturating_mul(to_decimal(fraction))
                })
                .fold(Decimal::ZERO, Decimal::saturating_add);

            let actual = post
                .value
                .saturating_sub(counterfactual.baseline(post.date))
                .saturating_sub(others);

            if predicted.is_zero() {
                report
                    .diagnostics
                    .push(skip(format!("predicted delta is zero at {}", post.date)));
                continue;
            }
            let Some(raw) = actual.checked_div(predicted) else {
                report
                    .diagnostics
                    .push(skip("correction factor out of range".to_string()));
                continue;
            };

            let (min, max) = self.bounds;
            let factor = raw.clamp(min, max);
            let clamped = factor != raw;

            if clamped {
                warn!(
                    "Correction for {} on {} clamped: raw {} -> {}",
                    event.id,
                    indicator.name,
                    raw.round_dp(4),
                    factor
                );
            } else {
                info!(
                    "Calibrated {} on {}: predicted {} actual {} factor {}",
                    event.id,
                    indicator.name,
                    predicted.round_dp(4),
                    actual.round_dp(4),
                    factor.round_dp(4)
                );
            }

            report.diagnostics.push(Diagnostic::CalibrationApplied {
                event_id: event.id.clone(),
                indicator: indicator.name.clone(),
                factor,
                clamped,
            });
            report.table.insert(CalibrationAdjustment {
                event_id: event.id.clone(),
                indicator: indicator.name.clone(),
                evaluated_at: post.date,
                predicted_delta: predicted,
                actual_delta: actual,
                correction_factor: factor,
                clamped,
            });
        }

        report
    }
}
