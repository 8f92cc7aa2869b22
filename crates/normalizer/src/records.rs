//! Raw input tables
//!
//! Rows arrive as already-parsed tabular records whose cells may be text,
//! numbers or absent. Every cell is kept as optional text here; typing and
//! validation belong to the normalizer.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{NormalizeError, Result};

/// Row of the indicator observation table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(default, deserialize_with = "cell")]
    pub indicator_name: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub unit: Option<String>,
}

impl ObservationRecord {
    pub fn new(indicator_name: &str, date: &str, value: &str, confidence: &str) -> Self {
        Self {
            indicator_name: Some(indicator_name.to_string()),
            date: Some(date.to_string()),
            value: Some(value.to_string()),
            confidence: Some(confidence.to_string()),
            unit: None,
        }
    }

    /// Builder: set unit
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }
}

/// Row of the event table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, deserialize_with = "cell")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub effective_date: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub end_date: Option<String>,
}

impl EventRecord {
    pub fn new(event_id: &str, category: &str, effective_date: &str) -> Self {
        Self {
            event_id: Some(event_id.to_string()),
            category: Some(category.to_string()),
            effective_date: Some(effective_date.to_string()),
            end_date: None,
        }
    }

    /// Builder: set end date
    pub fn with_end_date(mut self, end_date: &str) -> Self {
        self.end_date = Some(end_date.to_string());
        self
    }
}

/// Row of the impact link table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactLinkRecord {
    #[serde(default, deserialize_with = "cell")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub indicator_name: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub magnitude: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub shape: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub lag_days: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub confidence: Option<String>,
    /// "pp" (default) or "pct"
    #[serde(default, deserialize_with = "cell")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub ramp_months: Option<String>,
    #[serde(default, deserialize_with = "cell", rename = "override")]
    pub override_defaults: Option<String>,
}

impl ImpactLinkRecord {
    pub fn new(event_id: &str, indicator_name: &str, magnitude: &str, shape: &str) -> Self {
        Self {
            event_id: Some(event_id.to_string()),
            indicator_name: Some(indicator_name.to_string()),
            magnitude: Some(magnitude.to_string()),
            shape: Some(shape.to_string()),
            ..Default::default()
        }
    }

    /// Builder: set lag
    pub fn with_lag_days(mut self, lag_days: &str) -> Self {
        self.lag_days = Some(lag_days.to_string());
        self
    }

    /// Builder: set confidence
    pub fn with_confidence(mut self, confidence: &str) -> Self {
        self.confidence = Some(confidence.to_string());
        self
    }

    /// Builder: set magnitude unit
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }
}

/// The three input tables of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecords {
    #[serde(default)]
    pub observations: Vec<ObservationRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub impact_links: Vec<ImpactLinkRecord>,
}

impl RawRecords {
    /// Load tables from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| NormalizeError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse tables from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| NormalizeError::Parse(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.observations.len() + self.events.len() + self.impact_links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Any scalar JSON cell
#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn cell<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Cell> = Option::deserialize(deserializer)?;
    Ok(value.map(|c| match c {
        Cell::Text(s) => s,
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) => f.to_string(),
        Cell::Bool(b) => b.to_string(),
    }))
}
