//! Event Effect Modeler
//!
//! Turns each impact link into its own dated effect series:
//!
//! ```text
//! effect(d) = magnitude × correction × fraction(d − effective_date − lag)
//! ```
//!
//! Series targeting the same indicator are kept separate; the aggregator sums
//! them. When effects are netted against realized history only the part of
//! the curve beyond the last observation is added, since the fitted trend
//! already carries what was realized before it.

use chrono::Days;
use inclusion_core::{
    DAYS_PER_MONTH, Dataset, Date, EffectShape, Event, EventId, ImpactLink, ImpactUnit,
    IndicatorId, days_between,
};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationTable;
use crate::config::EngineConfig;
use crate::curves::EffectCurve;
use crate::numeric::to_decimal;
use crate::trend::TrendFit;

/// Effect of one link on one horizon date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectPoint {
    pub date: Date,
    /// Realized fraction counted at this date
    pub fraction: f64,
    pub effect: Decimal,
}

/// Dated effect of a single (event, indicator) link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSeries {
    pub event_id: EventId,
    pub indicator: IndicatorId,
    pub shape: EffectShape,
    /// Lag-adjusted start of the effect
    pub start: Date,
    /// Magnitude in indicator units before calibration and perturbation
    pub magnitude: Decimal,
    pub correction_factor: Decimal,
    /// Magnitude actually applied to the curve
    pub effective_magnitude: Decimal,
    pub points: Vec<EffectPoint>,
}

impl EffectSeries {
    pub fn effect_at(&self, date: Date) -> Option<Decimal> {
        self.points
            .iter()
            .find(|p| p.date == date)
            .map(|p| p.effect)
    }
}

/// Inputs shared by every series of one scenario run
#[derive(Debug, Clone, Copy)]
pub struct ModelingContext<'a> {
    /// Unperturbed baseline used to convert percent magnitudes
    pub reference: &'a TrendFit,
    pub calibration: &'a CalibrationTable,
    pub magnitude_adjustment_pct: Decimal,
    /// Count only realization after this date
    pub realized_through: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct EventEffectModeler {
    ramp_days: f64,
}

impl EventEffectModeler {
    pub fn new(ramp_days: f64) -> Self {
        Self { ramp_days }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.ramp_days())
    }

    pub fn ramp_days(&self) -> f64 {
        self.ramp_days
    }

    /// Curve for a link, honoring its ramp override
    pub fn curve_for(&self, link: &ImpactLink) -> EffectCurve {
        let ramp_days = link
            .ramp_months
            .map(|months| months as f64 * DAYS_PER_MONTH)
            .unwrap_or(self.ramp_days);
        EffectCurve::new(link.shape, ramp_days)
    }

    pub fn effect_start(event: &Event, link: &ImpactLink) -> Date {
        event
            .effective_date
            .checked_add_days(Days::new(link.lag_days as u64))
            .unwrap_or(Date::MAX)
    }

    /// Realized fraction at `date`, frozen at the event's end date
    pub fn fraction_at(&self, event: &Event, link: &ImpactLink, date: Date) -> f64 {
        let start = Self::effect_start(event, link);
        let date = match event.end_date {
            Some(end) => date.min(end),
            None => date,
        };
        self.curve_for(link)
            .fraction_at(days_between(start, date) as f64)
    }

    /// Fraction realized at `date` beyond what was realized at `since`
    pub fn incremental_fraction(
        &self,
        event: &Event,
        link: &ImpactLink,
        date: Date,
        since: Option<Date>,
    ) -> f64 {
        let realized = self.fraction_at(event, link, date);
        match since {
            Some(since) => (realized - self.fraction_at(event, link, since)).max(0.0),
            None => realized,
        }
    }

    /// Link magnitude in indicator units
    ///
    /// Percent links are converted against `reference` at the effect start.
    pub fn reference_magnitude(&self, link: &ImpactLink, reference: &TrendFit, start: Date) -> Decimal {
        match link.unit {
            ImpactUnit::PercentagePoints => link.magnitude,
            ImpactUnit::Percent => reference
                .baseline(start)
                .saturating_mul(link.magnitude / Decimal::ONE_HUNDRED),
        }
    }

    /// One series per link on `indicator`, ordered by (start, event id)
    pub fn model(
        &self,
        dataset: &Dataset,
        indicator: &str,
        horizon: &[Date],
        ctx: &ModelingContext<'_>,
    ) -> Vec<EffectSeries> {
        let mut series: Vec<EffectSeries> = dataset
            .links_for(indicator)
            .map(|(event, link)| self.model_link(event, link, horizon, ctx))
            .collect();
        series.sort_by(|a, b| (a.start, &a.event_id).cmp(&(b.start, &b.event_id)));
        series
    }

    pub fn model_link(
        &self,
        event: &Event,
        link: &ImpactLink,
        horizon: &[Date],
        ctx: &ModelingContext<'_>,
    ) -> EffectSeries {
        let start = Self::effect_start(event, link);
        let magnitude = self.reference_magnitude(link, ctx.reference, start);
        let correction_factor = ctx.calibration.factor(&event.id, &link.indicator);
        let corrected = magnitude.saturating_mul(correction_factor);
        let effective_magnitude = corrected.saturating_add(
            corrected
                .abs()
                .saturating_mul(ctx.magnitude_adjustment_pct / Decimal::ONE_HUNDRED),
        );

        let points = horizon
            .iter()
            .map(|&date| {
                let fraction = self.incremental_fraction(event, link, date, ctx.realized_through);
                EffectPoint {
                    date,
                    fraction,
                    effect: effective_magnitude.saturating_mul(to_decimal(fraction)),
                }
            })
            .collect();

        debug!(
            "Modeled {} effect of {} on {}: magnitude {} x factor {} -> {}",
            link.shape, event.id, link.indicator, magnitude, correction_factor, effective_magnitude
        );

        EffectSeries {
            event_id: event.id.clone(),
            indicator: link.indicator.clone(),
            shape: link.shape,
            start,
            magnitude,
            correction_factor,
            effective_magnitude,
            points,
        }
    }
}
