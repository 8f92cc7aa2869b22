//! Forecast analysis helpers
//!
//! - Growth periods: change and annualized change between consecutive
//!   observations, then between consecutive forecast points.
//! - Milestones: first forecast date reaching each target and the remaining
//!   gap at the end of the horizon.
//! - Impact matrix: event × indicator table of link magnitudes and shapes.

use inclusion_core::{
    DAYS_PER_YEAR, Dataset, Date, EffectShape, EventId, ImpactUnit, Indicator, IndicatorId,
    Scenario, Value, days_between,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Milestone;
use crate::numeric::to_decimal;

/// Change between two dated values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPeriod {
    pub start: Date,
    pub end: Date,
    pub start_value: Value,
    pub end_value: Value,
    pub change: Decimal,
    /// Change scaled to one year
    pub annualized_change: Decimal,
    /// Whether the end value is a forecast
    pub projected: bool,
}

impl GrowthPeriod {
    fn between(start: (Date, Value), end: (Date, Value), projected: bool) -> Option<Self> {
        let days = days_between(start.0, end.0);
        if days <= 0 {
            return None;
        }
        let change = end.1.saturating_sub(start.1);
        Some(Self {
            start: start.0,
            end: end.0,
            start_value: start.1,
            end_value: end.1,
            change,
            annualized_change: change.saturating_mul(to_decimal(DAYS_PER_YEAR / days as f64)),
            projected,
        })
    }
}

/// Periods between consecutive observations
pub fn historical_growth(indicator: &Indicator) -> Vec<GrowthPeriod> {
    indicator
        .observations()
        .windows(2)
        .filter_map(|pair| {
            GrowthPeriod::between(
                (pair[0].date, pair[0].value),
                (pair[1].date, pair[1].value),
                false,
            )
        })
        .collect()
}

/// Periods between consecutive forecast points, the first one measured from
/// the last observation. Points on or before the last observation are skipped.
pub fn forecast_growth(indicator: &Indicator, scenario: &Scenario) -> Vec<GrowthPeriod> {
    let mut periods = Vec::new();
    let mut previous = indicator.last().map(|o| (o.date, o.value));

    for point in &scenario.points {
        let current = (point.date, point.total_value);
        match previous {
            Some(prev) if prev.0 >= point.date => continue,
            Some(prev) => periods.extend(GrowthPeriod::between(prev, current, true)),
            None => {}
        }
        previous = Some(current);
    }
    periods
}

/// Observed then projected growth periods
pub fn growth_periods(indicator: &Indicator, scenario: Option<&Scenario>) -> Vec<GrowthPeriod> {
    let mut periods = historical_growth(indicator);
    if let Some(scenario) = scenario {
        periods.extend(forecast_growth(indicator, scenario));
    }
    periods
}

/// Progress of a scenario towards one milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneProgress {
    pub label: String,
    pub target: Value,
    /// First forecast date whose total reaches the target
    pub reached_on: Option<Date>,
    /// Target minus the final forecast total; negative when exceeded
    pub gap_at_horizon: Option<Decimal>,
}

pub fn milestone_progress(scenario: &Scenario, milestones: &[Milestone]) -> Vec<MilestoneProgress> {
    let final_total = scenario.last().map(|p| p.total_value);

    milestones
        .iter()
        .map(|milestone| MilestoneProgress {
            label: milestone.label.clone(),
            target: milestone.value,
            reached_on: scenario
                .points
                .iter()
                .find(|p| p.total_value >= milestone.value)
                .map(|p| p.date),
            gap_at_horizon: final_total.map(|total| milestone.value.saturating_sub(total)),
        })
        .collect()
}

/// One link as shown in the impact matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactCell {
    pub magnitude: Decimal,
    pub unit: ImpactUnit,
    pub shape: EffectShape,
    pub lag_days: u32,
}

/// Event × indicator table of modeled impacts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactMatrix {
    rows: BTreeMap<EventId, BTreeMap<IndicatorId, ImpactCell>>,
}

impl ImpactMatrix {
    /// Links whose event is unknown are left out
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut rows: BTreeMap<EventId, BTreeMap<IndicatorId, ImpactCell>> = BTreeMap::new();
        for link in dataset.links() {
            if dataset.event(&link.event_id).is_none() {
                continue;
            }
            rows.entry(link.event_id.clone()).or_default().insert(
                link.indicator.clone(),
                ImpactCell {
                    magnitude: link.magnitude,
                    unit: link.unit,
                    shape: link.shape,
                    lag_days: link.lag_days,
                },
            );
        }
        Self { rows }
    }

    pub fn get(&self, event_id: &str, indicator: &str) -> Option<&ImpactCell> {
        self.rows.get(event_id).and_then(|row| row.get(indicator))
    }

    pub fn events(&self) -> impl Iterator<Item = &EventId> {
        self.rows.keys()
    }

    pub fn indicators(&self) -> BTreeSet<&IndicatorId> {
        self.rows.values().flat_map(|row| row.keys()).collect()
    }

    pub fn row(&self, event_id: &str) -> Option<&BTreeMap<IndicatorId, ImpactCell>> {
        self.rows.get(event_id)
    }

    /// Events affecting `indicator`, by event id
    pub fn column<'a>(&'a self, indicator: &'a str) -> Vec<(&'a EventId, &'a ImpactCell)> {
        self.rows
            .iter()
            .filter_map(|(event_id, row)| row.get(indicator).map(|cell| (event_id, cell)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
