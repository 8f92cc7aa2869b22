//! Scenario Generator
//!
//! Each scenario is an independent deterministic run of the effect modeler
//! and the aggregator with the trend growth and event magnitudes shifted by
//! configured percentage offsets. Offsets scale the absolute size of the
//! quantity, so a positive offset always moves values up, whether the
//! indicator is growing or declining.

use inclusion_core::{Dataset, Date, Diagnostic, Indicator, Scenario, ScenarioKind};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregator;
use crate::calibration::CalibrationTable;
use crate::config::{EngineConfig, PerturbationConfig};
use crate::effects::{EffectSeries, EventEffectModeler, ModelingContext};
use crate::trend::TrendFit;

/// Offsets used for one scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub kind: ScenarioKind,
    pub trend_adjustment_pct: Decimal,
    pub magnitude_adjustment_pct: Decimal,
}

impl ScenarioParameters {
    pub fn base() -> Self {
        Self {
            kind: ScenarioKind::Base,
            trend_adjustment_pct: Decimal::ZERO,
            magnitude_adjustment_pct: Decimal::ZERO,
        }
    }
}

/// Everything a scenario run reads; shared across scenarios
#[derive(Debug, Clone, Copy)]
pub struct ScenarioInputs<'a> {
    pub dataset: &'a Dataset,
    pub indicator: &'a Indicator,
    pub trend: &'a TrendFit,
    pub horizon: &'a [Date],
    pub calibration: &'a CalibrationTable,
    pub modeler: &'a EventEffectModeler,
    pub aggregator: &'a Aggregator,
    pub realized_through: Option<Date>,
}

/// Output of one scenario run
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub parameters: ScenarioParameters,
    pub scenario: Scenario,
    pub effects: Vec<EffectSeries>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    perturbation: PerturbationConfig,
}

impl ScenarioGenerator {
    pub fn new(perturbation: PerturbationConfig) -> Self {
        Self { perturbation }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.scenario_perturbation_pct.clone())
    }

    pub fn parameters(&self, kind: ScenarioKind) -> ScenarioParameters {
        let offsets = self.perturbation.offsets(kind);
        ScenarioParameters {
            kind,
            trend_adjustment_pct: offsets.trend_pct,
            magnitude_adjustment_pct: offsets.magnitude_pct,
        }
    }

    pub fn run(&self, inputs: &ScenarioInputs<'_>, kind: ScenarioKind) -> ScenarioRun {
        let parameters = self.parameters(kind);
        let trend = inputs
            .trend
            .with_growth_adjustment(parameters.trend_adjustment_pct);

        let ctx = ModelingContext {
            reference: inputs.trend,
            calibration: inputs.calibration,
            magnitude_adjustment_pct: parameters.magnitude_adjustment_pct,
            realized_through: inputs.realized_through,
        };
        let effects = inputs.modeler.model(
            inputs.dataset,
            &inputs.indicator.name,
            inputs.horizon,
            &ctx,
        );
        let aggregation = inputs.aggregator.aggregate(
            &inputs.indicator.name,
            kind,
            &trend,
            inputs.horizon,
            &effects,
        );

        debug!(
            "Scenario {} for {}: trend {}%, magnitude {}%, {} series, {} points",
            kind,
            inputs.indicator.name,
            parameters.trend_adjustment_pct,
            parameters.magnitude_adjustment_pct,
            effects.len(),
            aggregation.scenario.points.len()
        );

        ScenarioRun {
            parameters,
            scenario: aggregation.scenario,
            effects,
            diagnostics: aggregation.diagnostics,
        }
    }

    /// Run every scenario kind, pessimistic first
    pub fn generate(&self, inputs: &ScenarioInputs<'_>) -> Vec<ScenarioRun> {
        ScenarioKind::ALL
            .iter()
            .map(|&kind| self.run(inputs, kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioOffsets;
    use crate::trend::TrendEstimator;
    use inclusion_core::{
        Confidence, EffectShape, Event, EventCategory, HistoricalObservation, ImpactLink,
        IndicatorUnit,
    };
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn dataset(first: Decimal, last: Decimal, magnitude: Decimal) -> Dataset {
        Dataset::new()
            .with_indicator(
                Indicator::new(
                    "x",
                    IndicatorUnit::Level,
                    vec![
                        HistoricalObservation::new(date(2020, 1, 1), first, Confidence::High),
                        HistoricalObservation::new(date(2023, 1, 1), last, Confidence::High),
                    ],
                )
                .unwrap(),
            )
            .with_event(Event::new("EVT_0001", EventCategory::PolicyChange, date(2024, 1, 1)))
            .with_link(ImpactLink::new("EVT_0001", "x", magnitude, EffectShape::Gradual))
    }

    fn runs(dataset: &Dataset) -> Vec<ScenarioRun> {
        let config = EngineConfig::default();
        let indicator = dataset.indicator("x").unwrap();
        let trend = TrendEstimator::from_config(&config).fit(indicator).unwrap();
        let horizon = [date(2024, 1, 1), date(2025, 1, 1), date(2027, 1, 1)];
        let table = CalibrationTable::new();
        let modeler = EventEffectModeler::from_config(&config);
        let aggregator = Aggregator::new(indicator.unit, None);
        let inputs = ScenarioInputs {
            dataset,
            indicator,
            trend: &trend,
            horizon: &horizon,
            calibration: &table,
            modeler: &modeler,
            aggregator: &aggregator,
            realized_through: indicator.last().map(|o| o.date),
        };
        ScenarioGenerator::from_config(&config).generate(&inputs)
    }

    fn assert_ordered(runs: &[ScenarioRun]) {
        let [pessimistic, base, optimistic] = runs else {
            panic!("expected three scenarios");
        };
        for i in 0..base.scenario.points.len() {
            let low = pessimistic.scenario.points[i].total_value;
            let mid = base.scenario.points[i].total_value;
            let high = optimistic.scenario.points[i].total_value;
            assert!(low <= mid && mid <= high, "{} <= {} <= {}", low, mid, high);
        }
    }

    #[test]
    fn test_base_parameters_are_neutral() {
        let generator = ScenarioGenerator::from_config(&EngineConfig::default());
        assert_eq!(generator.parameters(ScenarioKind::Base), ScenarioParameters::base());
        assert_eq!(
            generator.parameters(ScenarioKind::Optimistic).magnitude_adjustment_pct,
            dec!(30)
        );
    }

    #[test]
    fn test_parameters_follow_configured_offsets() {
        let config = EngineConfig::default().with_perturbation(
            ScenarioOffsets::new(dec!(10), dec!(25)),
            ScenarioOffsets::new(dec!(-15), dec!(-40)),
        );
        let generator = ScenarioGenerator::from_config(&config);

        for kind in ScenarioKind::ALL {
            let offsets = config.scenario_perturbation_pct.offsets(kind);
            let parameters = generator.parameters(kind);
            assert_eq!(parameters.kind, kind);
            assert_eq!(parameters.trend_adjustment_pct, offsets.trend_pct);
            assert_eq!(parameters.magnitude_adjustment_pct, offsets.magnitude_pct);
        }
    }

    #[test]
    fn test_growing_indicator_ordering() {
        let runs = runs(&dataset(dec!(10), dec!(16), dec!(2)));
        assert_eq!(runs[0].parameters.kind, ScenarioKind::Pessimistic);
        assert_ordered(&runs);
        assert!(runs[2].scenario.points[2].total_value > runs[0].scenario.points[2].total_value);
    }

    #[test]
    fn test_declining_indicator_with_negative_event_ordering() {
        let runs = runs(&dataset(dec!(40), dec!(31), dec!(-3)));
        assert_ordered(&runs);
    }

    #[test]
    fn test_zero_offsets_collapse_scenarios() {
        let generator = ScenarioGenerator::new(PerturbationConfig {
            optimistic: ScenarioOffsets::default(),
            pessimistic: ScenarioOffsets::default(),
        });
        assert_eq!(
            generator.parameters(ScenarioKind::Optimistic).trend_adjustment_pct,
            Decimal::ZERO
        );
    }
}
