use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::EffectShape;
use crate::values::{Date, EventId};

/// Kind of real-world event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventCategory {
    ProductLaunch,
    MarketEntry,
    PolicyChange,
    Infrastructure,
}

/// Expected sign of an event's magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedSign {
    NonNegative,
    Any,
}

/// Defaults a category imposes on its impact links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProfile {
    pub default_shape: EffectShape,
    pub allowed_shapes: &'static [EffectShape],
    pub expected_sign: ExpectedSign,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::ProductLaunch,
        EventCategory::MarketEntry,
        EventCategory::PolicyChange,
        EventCategory::Infrastructure,
    ];

    pub fn profile(&self) -> CategoryProfile {
        const ALL_SHAPES: &[EffectShape] =
            &[EffectShape::Immediate, EffectShape::Gradual, EffectShape::SCurve];
        const RAMPED: &[EffectShape] = &[EffectShape::Gradual, EffectShape::SCurve];

        match self {
            EventCategory::ProductLaunch => CategoryProfile {
                default_shape: EffectShape::Gradual,
                allowed_shapes: ALL_SHAPES,
                expected_sign: ExpectedSign::NonNegative,
            },
            EventCategory::MarketEntry => CategoryProfile {
                default_shape: EffectShape::SCurve,
                allowed_shapes: RAMPED,
                expected_sign: ExpectedSign::NonNegative,
            },
            EventCategory::PolicyChange => CategoryProfile {
                default_shape: EffectShape::Gradual,
                allowed_shapes: ALL_SHAPES,
                expected_sign: ExpectedSign::Any,
            },
            EventCategory::Infrastructure => CategoryProfile {
                default_shape: EffectShape::SCurve,
                allowed_shapes: RAMPED,
                expected_sign: ExpectedSign::NonNegative,
            },
        }
    }

    /// Short prefix used when deriving record identifiers
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EventCategory::ProductLaunch => "PRD",
            EventCategory::MarketEntry => "MKT",
            EventCategory::PolicyChange => "POL",
            EventCategory::Infrastructure => "INF",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventCategory::ProductLaunch => "product_launch",
            EventCategory::MarketEntry => "market_entry",
            EventCategory::PolicyChange => "policy_change",
            EventCategory::Infrastructure => "infrastructure",
        };
        f.write_str(name)
    }
}

impl FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "productlaunch" | "product" => Ok(EventCategory::ProductLaunch),
            "marketentry" | "market" => Ok(EventCategory::MarketEntry),
            "policychange" | "policy" | "regulation" => Ok(EventCategory::PolicyChange),
            "infrastructure" => Ok(EventCategory::Infrastructure),
            _ => Err(format!("unknown event category '{}'", s.trim())),
        }
    }
}

/// A dated real-world event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub category: EventCategory,
    pub effective_date: Date,
    /// Date after which the event's realization stops progressing
    pub end_date: Option<Date>,
}

impl Event {
    pub fn new(id: impl Into<EventId>, category: EventCategory, effective_date: Date) -> Self {
        Self {
            id: id.into(),
            category,
            effective_date,
            end_date: None,
        }
    }

    /// Builder: set end/saturation date
    pub fn with_end_date(mut self, end_date: Date) -> Self {
        self.end_date = Some(end_date);
        self
    }
}
