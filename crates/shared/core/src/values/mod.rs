use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Indicator or forecast value - uses Decimal for precision
pub type Value = Decimal;

/// Calendar date of an observation, event or forecast point
pub type Date = NaiveDate;

/// Indicator identifier (e.g. "account_ownership")
pub type IndicatorId = String;

/// Event identifier (e.g. "EVT_0001")
pub type EventId = String;

/// Average Gregorian year length in days
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Average Gregorian month length in days
pub const DAYS_PER_MONTH: f64 = DAYS_PER_YEAR / 12.0;

/// Signed number of days from `from` to `to`
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).num_days()
}
