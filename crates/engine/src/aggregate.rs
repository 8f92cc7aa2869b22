//! Aggregator
//!
//! Sums the baseline and every event effect series into forecast points.
//!
//! ## Per date
//!
//! 1. Start from the baseline.
//! 2. Add each event in series order. Positive effects only fill the headroom
//!    left under the saturation ceiling; the excess is discarded, never carried
//!    to later events. Negative effects always apply.
//! 3. Clamp to the unit's domain (percentages in [0, 100], counts >= 0).
//! 4. Clamp to the ceiling.
//! 5. Cumulative counts never fall below the previous point.
//!
//! Arithmetic saturates at the decimal range. A point that hit the limit
//! carries a `ValueOverflow` diagnostic.

use inclusion_core::{
    Date, Diagnostic, EventContribution, ForecastPoint, IndicatorUnit, Scenario, ScenarioKind,
};
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::effects::EffectSeries;
use crate::numeric::to_decimal;
use crate::trend::TrendFit;

/// Aggregated scenario with the diagnostics produced on the way
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub scenario: Scenario,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    unit: IndicatorUnit,
    ceiling: Option<Decimal>,
}

impl Aggregator {
    pub fn new(unit: IndicatorUnit, ceiling: Option<Decimal>) -> Self {
        Self { unit, ceiling }
    }

    pub fn ceiling(&self) -> Option<Decimal> {
        self.ceiling
    }

    /// Aggregate effects over `horizon`; every series must be modeled on the
    /// same horizon.
    pub fn aggregate(
        &self,
        indicator: &str,
        kind: ScenarioKind,
        trend: &TrendFit,
        horizon: &[Date],
        effects: &[EffectSeries],
    ) -> Aggregation {
        let (lower, upper) = self.unit.bounds();
        let mut diagnostics = Vec::new();
        let mut points: Vec<ForecastPoint> = Vec::with_capacity(horizon.len());
        let mut previous_total: Option<Decimal> = None;

        for (i, &date) in horizon.iter().enumerate() {
            let baseline = trend.baseline(date);
            let mut overflowed = at_limit(baseline);
            let mut running = baseline;
            let mut contributions = Vec::with_capacity(effects.len());

            for series in effects {
                let modeled = series
                    .points
                    .get(i)
                    .map(|p| p.effect)
                    .unwrap_or(Decimal::ZERO);

                let applied = match self.ceiling {
                    Some(ceiling) if modeled > Decimal::ZERO => {
                        let headroom = ceiling.saturating_sub(running).max(Decimal::ZERO);
                        modeled.min(headroom)
                    }
                    _ => modeled,
                };

                if applied != modeled {
                    diagnostics.push(Diagnostic::SaturationApplied {
                        indicator: indicator.to_string(),
                        scenario: kind,
                        date,
                        event_id: series.event_id.clone(),
                        discarded: modeled.saturating_sub(applied),
                    });
                }

                running = match running.checked_add(applied) {
                    Some(sum) => sum,
                    None => {
                        overflowed = true;
                        running.saturating_add(applied)
                    }
                };
                overflowed |= at_limit(applied);
                contributions.push(EventContribution {
                    event_id: series.event_id.clone(),
                    modeled,
                    applied,
                });
            }

            let unclamped = running;
            let mut total = running;
            if let Some(lower) = lower {
                total = total.max(lower);
            }
            if let Some(upper) = upper {
                total = total.min(upper);
            }
            if let Some(ceiling) = self.ceiling {
                total = total.min(ceiling);
            }
            if self.unit.is_cumulative() {
                if let Some(previous) = previous_total {
                    total = total.max(previous);
                }
            }

            if total != unclamped {
                debug!(
                    "{} {} at {}: clamped {} -> {}",
                    indicator, kind, date, unclamped, total
                );
                diagnostics.push(Diagnostic::BoundClamped {
                    indicator: indicator.to_string(),
                    scenario: kind,
                    date,
                    from: unclamped,
                    to: total,
                });
            }

            if overflowed {
                warn!(
                    "{} {} at {}: value out of decimal range, held at {}",
                    indicator, kind, date, total
                );
                diagnostics.push(Diagnostic::ValueOverflow {
                    indicator: indicator.to_string(),
                    scenario: kind,
                    date,
                });
            }

            previous_total = Some(total);
            points.push(ForecastPoint {
                date,
                scenario: kind,
                baseline_value: baseline,
                event_contribution: total.saturating_sub(baseline),
                total_value: total,
                confidence_width: to_decimal(trend.confidence_width(date)),
                contributions,
            });
        }

        Aggregation {
            scenario: Scenario {
                kind,
                indicator: indicator.to_string(),
                points,
            },
            diagnostics,
        }
    }
}

fn at_limit(value: Decimal) -> bool {
    value == Decimal::MAX || value == Decimal::MIN
}
