//! Inclusion Engine - Event-Augmented Indicator Forecasting
//!
//! Projects financial-inclusion indicators forward from their observation
//! history and a catalog of dated events:
//!
//! - **Trend**: weighted linear or compound baseline anchored at the first observation
//! - **Curves**: immediate, gradual and S-curve realization profiles
//! - **Effects**: one dated effect series per (event, indicator) link
//! - **Calibration**: correction factors from post-event observations
//! - **Aggregation**: baseline + effects with saturation and domain bounds
//! - **Scenarios**: pessimistic / base / optimistic perturbations
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────────┐     ┌──────────────┐
//!  │  RawRecords  │────►│  Normalizer  │
//!  └──────────────┘     └──────┬───────┘
//!                              │ Dataset
//!                              ▼
//!                    ┌───────────────────┐
//!                    │  TrendEstimator   │──────────────┐
//!                    └─────────┬─────────┘              │
//!                              │ TrendFit               │ counterfactual
//!                              ▼                        ▼
//!                    ┌───────────────────┐    ┌───────────────────┐
//!                    │ ScenarioGenerator │◄───│    Calibrator     │
//!                    └─────────┬─────────┘    └───────────────────┘
//!             per scenario     │           CalibrationTable
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//!   ┌────────────────────┐          ┌────────────────────┐
//!   │ EventEffectModeler │─────────►│     Aggregator     │
//!   │  (EffectCurve)     │  series  │ saturation, bounds │
//!   └────────────────────┘          └─────────┬──────────┘
//!                                             ▼
//!                               Scenario { ForecastPoint* }
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inclusion_engine::{EngineConfig, ForecastEngine, yearly_horizon};
//! use inclusion_normalizer::RawRecords;
//!
//! let engine = ForecastEngine::new(EngineConfig::from_file("config/engine.json")?)?;
//! let raw = RawRecords::from_file("data/raw/records.json")?;
//! let horizon = yearly_horizon(last_observation, 3);
//! let forecast = engine.run(&raw, "account_ownership", &horizon)?;
//! ```

pub mod aggregate;
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod curves;
pub mod effects;
pub mod error;
pub mod numeric;
pub mod orchestrator;
pub mod scenario;
pub mod trend;

// Re-export main types
pub use aggregate::{Aggregation, Aggregator};
pub use analysis::{
    GrowthPeriod, ImpactCell, ImpactMatrix, MilestoneProgress, forecast_growth, growth_periods,
    historical_growth, milestone_progress,
};
pub use calibration::{CalibrationReport, CalibrationTable, Calibrator};
pub use config::{
    EngineConfig, Milestone, ObservationWeights, PerturbationConfig, ScenarioOffsets,
};
pub use curves::{EffectCurve, realized_fraction};
pub use effects::{EffectPoint, EffectSeries, EventEffectModeler, ModelingContext};
pub use error::{Error, Result};
pub use orchestrator::{
    BatchForecast, ForecastEngine, IndicatorForecast, normalize_horizon, yearly_horizon,
};
pub use scenario::{ScenarioGenerator, ScenarioInputs, ScenarioParameters, ScenarioRun};
pub use trend::{TrendEstimator, TrendFit, TrendKind};
