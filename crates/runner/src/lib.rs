//! Inclusion Runner - Batch Forecast Execution
//!
//! Runs the forecast engine over every indicator × scenario in parallel:
//!
//! - **Inputs**: JSON record export and engine configuration
//! - **Runner**: semaphore-bounded tokio tasks on the blocking pool
//! - **Report**: ordered scenarios, per-task failures and diagnostics
//!
//! ## Architecture
//!
//! ```text
//!   records.json      engine.json
//!        │                 │
//!        ▼                 ▼
//!   RawRecords       EngineConfig
//!        │                 │
//!        └────────┬────────┘
//!                 ▼
//!        ┌─────────────────┐
//!        │ ForecastRunner  │── CancelHandle (watch)
//!        └────────┬────────┘
//!                 │ JoinSet: one task per (indicator, scenario)
//!     ┌───────────┼───────────┐
//!     ▼           ▼           ▼
//! pessimistic    base     optimistic   (spawn_blocking, Semaphore)
//!     └───────────┼───────────┘
//!                 ▼
//!             RunReport
//! ```

pub mod error;
pub mod inputs;
pub mod logging;
pub mod runner;

// Re-export main types
pub use error::{Result, RunnerError};
pub use inputs::{load_config, load_records, write_report};
pub use runner::{
    CancelHandle, Cancellation, ForecastRunner, RunReport, RunnerConfig, TaskKey, default_horizon,
};
