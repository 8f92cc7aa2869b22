//! Parallel forecast runner
//!
//! One task per (indicator, scenario). Each task waits for a semaphore
//! permit, then runs the synchronous engine on the blocking pool. Tasks share
//! nothing mutable; results are collected into ordered maps so the report
//! does not depend on completion order.
//!
//! Cancellation goes through a watch channel. A task checks it before it
//! starts and races it against the computation; cancelling one task leaves
//! the others running.

use inclusion_core::{Dataset, Date, Diagnostic, IndicatorId, Scenario, ScenarioKind};
use inclusion_engine::{ForecastEngine, ScenarioRun, normalize_horizon, yearly_horizon};
use inclusion_normalizer::{Normalized, RawRecords};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};
use tokio::task::{self, JoinError, JoinSet};

use crate::error::{Result, RunnerError};

/// Identifies one unit of work
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    pub indicator: IndicatorId,
    pub scenario: ScenarioKind,
}

impl TaskKey {
    pub fn new(indicator: impl Into<IndicatorId>, scenario: ScenarioKind) -> Self {
        Self {
            indicator: indicator.into(),
            scenario,
        }
    }

    fn cancelled(&self) -> RunnerError {
        RunnerError::Cancelled {
            indicator: self.indicator.clone(),
            scenario: self.scenario,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.indicator, self.scenario)
    }
}

/// Current cancellation requests
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    all: bool,
    tasks: BTreeSet<TaskKey>,
}

impl Cancellation {
    pub fn covers(&self, key: &TaskKey) -> bool {
        self.all || self.tasks.contains(key)
    }
}

/// Cancels pending or running tasks of a runner
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<Cancellation>>,
}

impl CancelHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(Cancellation::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel_all(&self) {
        self.tx.send_modify(|c| c.all = true);
    }

    pub fn cancel(&self, indicator: impl Into<IndicatorId>, scenario: ScenarioKind) {
        let key = TaskKey::new(indicator, scenario);
        self.tx.send_modify(|c| {
            c.tasks.insert(key);
        });
    }

    /// Clear every request so the next run starts fresh
    pub fn reset(&self) {
        self.tx.send_replace(Cancellation::default());
    }

    pub fn is_cancelled(&self, key: &TaskKey) -> bool {
        self.tx.borrow().covers(key)
    }

    fn subscribe(&self) -> watch::Receiver<Cancellation> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum number of scenario computations running at once
    pub max_parallel: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_parallel: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct RunReport {
    pub scenarios: BTreeMap<IndicatorId, BTreeMap<ScenarioKind, Scenario>>,
    pub failures: BTreeMap<TaskKey, RunnerError>,
    /// Normalization diagnostics first, then per-task diagnostics without repeats
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct ReportView<'a> {
    scenarios: &'a BTreeMap<IndicatorId, BTreeMap<ScenarioKind, Scenario>>,
    failures: BTreeMap<String, String>,
    diagnostics: &'a [Diagnostic],
}

impl RunReport {
    fn assemble(
        outcomes: BTreeMap<TaskKey, Result<ScenarioRun>>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut scenarios: BTreeMap<IndicatorId, BTreeMap<ScenarioKind, Scenario>> =
            BTreeMap::new();
        let mut failures = BTreeMap::new();

        for (key, outcome) in outcomes {
            match outcome {
                Ok(run) => {
                    for diagnostic in run.diagnostics {
                        if !diagnostics.contains(&diagnostic) {
                            diagnostics.push(diagnostic);
                        }
                    }
                    scenarios
                        .entry(key.indicator)
                        .or_default()
                        .insert(key.scenario, run.scenario);
                }
                Err(e) => {
                    failures.insert(key, e);
                }
            }
        }

        Self {
            scenarios,
            failures,
            diagnostics,
        }
    }

    pub fn scenario(&self, indicator: &str, kind: ScenarioKind) -> Option<&Scenario> {
        self.scenarios.get(indicator).and_then(|s| s.get(&kind))
    }

    pub fn completed(&self) -> usize {
        self.scenarios.values().map(BTreeMap::len).sum()
    }

    pub fn cancelled(&self) -> impl Iterator<Item = &TaskKey> {
        self.failures
            .iter()
            .filter(|(_, e)| matches!(e, RunnerError::Cancelled { .. }))
            .map(|(key, _)| key)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        let view = ReportView {
            scenarios: &self.scenarios,
            failures: self
                .failures
                .iter()
                .map(|(key, e)| (key.to_string(), e.to_string()))
                .collect(),
            diagnostics: &self.diagnostics,
        };
        serde_json::to_string_pretty(&view).map_err(|e| RunnerError::Serialization(e.to_string()))
    }
}

/// Yearly horizon after the latest observation in the dataset
pub fn default_horizon(dataset: &Dataset, years: u32) -> Vec<Date> {
    dataset
        .indicators()
        .filter_map(|i| i.last().map(|o| o.date))
        .max()
        .map(|last| yearly_horizon(last, years))
        .unwrap_or_default()
}

pub struct ForecastRunner {
    engine: Arc<ForecastEngine>,
    config: RunnerConfig,
    cancel: CancelHandle,
}

impl ForecastRunner {
    pub fn new(engine: ForecastEngine, config: RunnerConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
            cancel: CancelHandle::new(),
        }
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Forecast every indicator of the dataset
    pub async fn run(&self, dataset: Arc<Dataset>, horizon: &[Date]) -> RunReport {
        let indicators = dataset.indicator_names();
        self.run_indicators(dataset, &indicators, horizon).await
    }

    /// Normalize raw records on the blocking pool, then forecast everything
    pub async fn run_records(&self, raw: RawRecords, horizon: &[Date]) -> Result<RunReport> {
        let engine = Arc::clone(&self.engine);
        let normalized = tokio::task::spawn_blocking(move || engine.normalize(&raw))
            .await
            .map_err(|e| RunnerError::Normalization(e.to_string()))?;

        Ok(self.run_normalized(normalized, None, horizon).await)
    }

    /// Forecast an already normalized dataset, every indicator unless a
    /// selection is given; normalization diagnostics lead the report
    pub async fn run_normalized(
        &self,
        normalized: Normalized,
        indicators: Option<&[IndicatorId]>,
        horizon: &[Date],
    ) -> RunReport {
        let dataset = Arc::new(normalized.dataset);
        let indicators = match indicators {
            Some(selected) => selected.to_vec(),
            None => dataset.indicator_names(),
        };
        self.execute(dataset, &indicators, horizon, normalized.diagnostics)
            .await
    }

    /// Forecast the named indicators; unknown names are reported as failures
    pub async fn run_indicators(
        &self,
        dataset: Arc<Dataset>,
        indicators: &[IndicatorId],
        horizon: &[Date],
    ) -> RunReport {
        self.execute(dataset, indicators, horizon, Vec::new()).await
    }

    async fn execute(
        &self,
        dataset: Arc<Dataset>,
        indicators: &[IndicatorId],
        horizon: &[Date],
        diagnostics: Vec<Diagnostic>,
    ) -> RunReport {
        let horizon: Arc<[Date]> = normalize_horizon(horizon).into();
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let mut tasks = JoinSet::new();
        let mut keys = HashMap::new();

        for indicator in indicators {
            for kind in ScenarioKind::ALL {
                let key = TaskKey::new(indicator.clone(), kind);
                let handle = tasks.spawn(run_task(
                    key.clone(),
                    Arc::clone(&self.engine),
                    Arc::clone(&dataset),
                    Arc::clone(&horizon),
                    Arc::clone(&semaphore),
                    self.cancel.subscribe(),
                ));
                keys.insert(handle.id(), key);
            }
        }

        info!(
            "Running {} forecast tasks ({} indicators x {} scenarios, {} at a time)",
            tasks.len(),
            indicators.len(),
            ScenarioKind::ALL.len(),
            self.config.max_parallel.max(1)
        );

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let Some((key, outcome)) = joined_outcome(joined, &keys) else {
                continue;
            };
            if let Err(e) = &outcome {
                warn!("{}", e);
            }
            outcomes.insert(key, outcome);
        }

        let report = RunReport::assemble(outcomes, diagnostics);
        info!(
            "Run finished: {} scenarios completed, {} failed",
            report.completed(),
            report.failures.len()
        );
        report
    }
}

async fn run_task(
    key: TaskKey,
    engine: Arc<ForecastEngine>,
    dataset: Arc<Dataset>,
    horizon: Arc<[Date]>,
    semaphore: Arc<Semaphore>,
    mut cancel: watch::Receiver<Cancellation>,
) -> (TaskKey, Result<ScenarioRun>) {
    if cancel.borrow_and_update().covers(&key) {
        let cancelled = key.cancelled();
        return (key, Err(cancelled));
    }

    let permit = tokio::select! {
        permit = semaphore.acquire_owned() => permit,
        _ = wait_for_cancel(&mut cancel, &key) => {
            let cancelled = key.cancelled();
            return (key, Err(cancelled));
        }
    };
    let Ok(_permit) = permit else {
        let cancelled = key.cancelled();
        return (key, Err(cancelled));
    };

    debug!("Starting {}", key);
    let indicator = key.indicator.clone();
    let scenario = key.scenario;
    let compute = tokio::task::spawn_blocking(move || {
        engine.forecast_scenario(&dataset, &indicator, &horizon, scenario)
    });

    let outcome = tokio::select! {
        joined = compute => match joined {
            Ok(result) => result.map_err(RunnerError::from),
            Err(e) => Err(RunnerError::TaskFailed {
                indicator: key.indicator.clone(),
                scenario: key.scenario,
                reason: e.to_string(),
            }),
        },
        _ = wait_for_cancel(&mut cancel, &key) => Err(key.cancelled()),
    };

    (key, outcome)
}

/// Outcome of a joined task; a task that panicked or was aborted becomes a
/// `TaskFailed` for its key
fn joined_outcome(
    joined: std::result::Result<(task::Id, (TaskKey, Result<ScenarioRun>)), JoinError>,
    keys: &HashMap<task::Id, TaskKey>,
) -> Option<(TaskKey, Result<ScenarioRun>)> {
    let e = match joined {
        Ok((_, done)) => return Some(done),
        Err(e) => e,
    };
    let Some(key) = keys.get(&e.id()) else {
        warn!("Unknown forecast task {} failed: {}", e.id(), e);
        return None;
    };
    let reason = if e.is_panic() {
        "task panicked".to_string()
    } else {
        e.to_string()
    };
    Some((
        key.clone(),
        Err(RunnerError::TaskFailed {
            indicator: key.indicator.clone(),
            scenario: key.scenario,
            reason,
        }),
    ))
}

/// Resolves once `key` is cancelled; never resolves if the handle is gone
async fn wait_for_cancel(cancel: &mut watch::Receiver<Cancellation>, key: &TaskKey) {
    loop {
        if cancel.borrow_and_update().covers(key) {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
