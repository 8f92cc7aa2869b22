//! Loading run inputs and writing reports

use inclusion_engine::EngineConfig;
use inclusion_normalizer::RawRecords;
use log::info;
use std::path::Path;

use crate::error::{Result, RunnerError};
use crate::runner::RunReport;

/// Engine configuration from `path`, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Ok(EngineConfig::from_file(path)?)
        }
        None => {
            info!("Using default configuration");
            Ok(EngineConfig::default())
        }
    }
}

pub fn load_records(path: &Path) -> Result<RawRecords> {
    let records = RawRecords::from_file(path)?;
    info!(
        "Loaded {} raw records from {} ({} observations, {} events, {} links)",
        records.len(),
        path.display(),
        records.observations.len(),
        records.events.len(),
        records.impact_links.len()
    );
    Ok(records)
}

/// Write the report as pretty JSON to `path`, or return it when no path is given
pub fn write_report(report: &RunReport, path: Option<&Path>) -> Result<Option<String>> {
    let json = report.to_json()?;

    match path {
        Some(path) => {
            std::fs::write(path, json).map_err(|e| RunnerError::Io {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            info!("Report written to {}", path.display());
            Ok(None)
        }
        None => Ok(Some(json)),
    }
}
