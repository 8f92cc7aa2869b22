mod confidence;
mod event;
mod forecast;
mod impact;
mod indicator;

pub use confidence::Confidence;
pub use event::{CategoryProfile, Event, EventCategory, ExpectedSign};
pub use forecast::{CalibrationAdjustment, EventContribution, ForecastPoint, Scenario, ScenarioKind};
pub use impact::{EffectShape, ImpactLink, ImpactUnit};
pub use indicator::{HistoricalObservation, Indicator, IndicatorUnit};
