//! Forecast Orchestrator
//!
//! Runs the pipeline for one indicator:
//!
//! ```text
//! Normalizer ─► TrendEstimator ─► Calibrator ─► ScenarioGenerator
//!                                                 │ per scenario
//!                                                 ├─► EventEffectModeler
//!                                                 └─► Aggregator
//! ```
//!
//! The calibration table is computed once from the unperturbed pipeline and
//! shared by every scenario. Failures are per indicator: `forecast_all`
//! reports them next to the successful forecasts.

use chrono::Months;
use inclusion_core::{
    CalibrationAdjustment, Dataset, Date, Diagnostic, Indicator, IndicatorId, IndicatorUnit,
    Scenario, ScenarioKind,
};
use inclusion_normalizer::{Normalized, Normalizer, RawRecords};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::Aggregator;
use crate::analysis::{MilestoneProgress, milestone_progress};
use crate::calibration::{CalibrationReport, Calibrator};
use crate::config::EngineConfig;
use crate::effects::{EffectSeries, EventEffectModeler};
use crate::error::{Error, Result};
use crate::scenario::{ScenarioGenerator, ScenarioInputs, ScenarioRun};
use crate::trend::{TrendEstimator, TrendFit};

/// Every scenario of one indicator plus how it was derived
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorForecast {
    pub indicator: IndicatorId,
    pub unit: IndicatorUnit,
    pub horizon: Vec<Date>,
    pub trend: TrendFit,
    pub calibration: Vec<CalibrationAdjustment>,
    pub scenarios: BTreeMap<ScenarioKind, Scenario>,
    /// Effect series of the base scenario
    pub effects: Vec<EffectSeries>,
    pub milestones: BTreeMap<ScenarioKind, Vec<MilestoneProgress>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl IndicatorForecast {
    pub fn scenario(&self, kind: ScenarioKind) -> Option<&Scenario> {
        self.scenarios.get(&kind)
    }

    pub fn base(&self) -> Option<&Scenario> {
        self.scenario(ScenarioKind::Base)
    }
}

/// Result of forecasting every indicator in a dataset
#[derive(Debug, Clone, Default)]
pub struct BatchForecast {
    pub forecasts: BTreeMap<IndicatorId, IndicatorForecast>,
    pub failures: BTreeMap<IndicatorId, Error>,
    /// Normalization diagnostics, when the batch started from raw records
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchForecast {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Yearly dates starting one year after `start`
pub fn yearly_horizon(start: Date, years: u32) -> Vec<Date> {
    (1..=years)
        .filter_map(|year| start.checked_add_months(Months::new(12 * year)))
        .collect()
}

/// Sorted, de-duplicated copy of a horizon
pub fn normalize_horizon(horizon: &[Date]) -> Vec<Date> {
    let mut dates = horizon.to_vec();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Per-indicator state shared by all scenario runs
struct Prepared<'a> {
    indicator: &'a Indicator,
    horizon: Vec<Date>,
    trend: TrendFit,
    calibration: CalibrationReport,
    aggregator: Aggregator,
}

pub struct ForecastEngine {
    config: EngineConfig,
    normalizer: Normalizer,
    estimator: TrendEstimator,
    modeler: EventEffectModeler,
    calibrator: Calibrator,
    scenarios: ScenarioGenerator,
}

impl ForecastEngine {
    /// Validates the configuration before anything runs
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            normalizer: Normalizer::default(),
            estimator: TrendEstimator::from_config(&config),
            modeler: EventEffectModeler::from_config(&config),
            calibrator: Calibrator::from_config(&config),
            scenarios: ScenarioGenerator::from_config(&config),
            config,
        })
    }

    /// Builder: replace the normalizer used by `run` and `run_all`
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &RawRecords) -> Normalized {
        self.normalizer.normalize(raw)
    }

    /// Forecast every scenario of one indicator
    pub fn forecast(
        &self,
        dataset: &Dataset,
        indicator: &str,
        horizon: &[Date],
    ) -> Result<IndicatorForecast> {
        let prepared = self.prepare(dataset, indicator, horizon)?;
        let inputs = self.inputs(dataset, &prepared);

        let mut diagnostics = prepared.calibration.diagnostics.clone();
        let mut scenarios = BTreeMap::new();
        let mut milestones = BTreeMap::new();
        let mut effects = Vec::new();
        let targets = self.config.milestones_for(indicator);

        for run in self.scenarios.generate(&inputs) {
            let kind = run.parameters.kind;
            diagnostics.extend(run.diagnostics);
            if !targets.is_empty() {
                milestones.insert(kind, milestone_progress(&run.scenario, targets));
            }
            if kind == ScenarioKind::Base {
                effects = run.effects;
            }
            scenarios.insert(kind, run.scenario);
        }

        info!(
            "Forecast {} complete: {} dates x {} scenarios, {} event series, {} calibrated",
            indicator,
            prepared.horizon.len(),
            scenarios.len(),
            effects.len(),
            prepared.calibration.table.len()
        );

        Ok(IndicatorForecast {
            indicator: prepared.indicator.name.clone(),
            unit: prepared.indicator.unit,
            calibration: prepared.calibration.table.adjustments().cloned().collect(),
            horizon: prepared.horizon,
            trend: prepared.trend,
            scenarios,
            effects,
            milestones,
            diagnostics,
        })
    }

    /// Forecast a single scenario; the unit of work of the parallel runner
    pub fn forecast_scenario(
        &self,
        dataset: &Dataset,
        indicator: &str,
        horizon: &[Date],
        kind: ScenarioKind,
    ) -> Result<ScenarioRun> {
        let prepared = self.prepare(dataset, indicator, horizon)?;
        let inputs = self.inputs(dataset, &prepared);
        let mut run = self.scenarios.run(&inputs, kind);

        let mut diagnostics = prepared.calibration.diagnostics.clone();
        diagnostics.append(&mut run.diagnostics);
        run.diagnostics = diagnostics;
        Ok(run)
    }

    /// Forecast every indicator; failures do not stop the batch
    pub fn forecast_all(&self, dataset: &Dataset, horizon: &[Date]) -> BatchForecast {
        let mut batch = BatchForecast::default();

        for name in dataset.indicator_names() {
            match self.forecast(dataset, &name, horizon) {
                Ok(forecast) => {
                    batch.forecasts.insert(name, forecast);
                }
                Err(e) => {
                    warn!("Forecast failed for {}: {}", name, e);
                    batch.failures.insert(name, e);
                }
            }
        }

        info!(
            "Batch forecast: {} succeeded, {} failed",
            batch.forecasts.len(),
            batch.failures.len()
        );
        batch
    }

    /// Normalize raw records, then forecast one indicator
    ///
    /// Normalization diagnostics come first in the output.
    pub fn run(
        &self,
        raw: &RawRecords,
        indicator: &str,
        horizon: &[Date],
    ) -> Result<IndicatorForecast> {
        let normalized = self.normalize(raw);
        let mut forecast = self.forecast(&normalized.dataset, indicator, horizon)?;

        let mut diagnostics = normalized.diagnostics;
        diagnostics.append(&mut forecast.diagnostics);
        forecast.diagnostics = diagnostics;
        Ok(forecast)
    }

    /// Normalize raw records, then forecast every indicator
    pub fn run_all(&self, raw: &RawRecords, horizon: &[Date]) -> BatchForecast {
        let normalized = self.normalize(raw);
        let mut batch = self.forecast_all(&normalized.dataset, horizon);
        batch.diagnostics = normalized.diagnostics;
        batch
    }

    fn prepare<'a>(
        &self,
        dataset: &'a Dataset,
        indicator: &str,
        horizon: &[Date],
    ) -> Result<Prepared<'a>> {
        let indicator = dataset
            .indicator(indicator)
            .ok_or_else(|| Error::UnknownIndicator(indicator.to_string()))?;
        let trend = self.estimator.fit(indicator)?;
        let calibration = self.calibrator.calibrate(dataset, indicator);
        let aggregator = Aggregator::new(indicator.unit, self.config.ceiling(&indicator.name));

        Ok(Prepared {
            indicator,
            horizon: normalize_horizon(horizon),
            trend,
            calibration,
            aggregator,
        })
    }

    fn inputs<'a>(&'a self, dataset: &'a Dataset, prepared: &'a Prepared<'a>) -> ScenarioInputs<'a> {
        let realized_through = if self.config.net_of_realized_effects {
            prepared.indicator.last().map(|o| o.date)
        } else {
            None
        };

        ScenarioInputs {
            dataset,
            indicator: prepared.indicator,
            trend: &prepared.trend,
            horizon: &prepared.horizon,
            calibration: &prepared.calibration.table,
            modeler: &self.modeler,
            aggregator: &prepared.aggregator,
            realized_through,
        }
    }
}
