//! Cell-level parsers shared by the three tables

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::error::RecordError;

/// Trimmed, non-empty content of a required cell
pub fn required<'a>(field: &'static str, cell: &'a Option<String>) -> Result<&'a str, RecordError> {
    match cell.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(RecordError::MissingField(field)),
    }
}

/// Trimmed content of an optional cell; blank counts as absent
pub fn optional(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// ISO-8601 calendar date, also accepting date-times
pub fn date(field: &'static str, value: &str) -> Result<NaiveDate, RecordError> {
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.date());
        }
    }

    Err(invalid(field, value, "expected an ISO-8601 date"))
}

/// Decimal number, plain or in scientific notation
pub fn decimal(field: &'static str, value: &str) -> Result<Decimal, RecordError> {
    let cleaned: String = value.chars().filter(|c| *c != ',' && *c != '_').collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|e| invalid(field, value, &e.to_string()))
}

/// Non-negative whole number
pub fn whole(field: &'static str, value: &str) -> Result<u32, RecordError> {
    let number = decimal(field, value)?;
    if number.fract() != Decimal::ZERO {
        return Err(invalid(field, value, "expected a whole number"));
    }
    if number < Decimal::ZERO {
        return Err(invalid(field, value, "must not be negative"));
    }
    number
        .to_u32()
        .ok_or_else(|| invalid(field, value, "out of range"))
}

pub fn flag(field: &'static str, value: &str) -> Result<bool, RecordError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(invalid(field, value, "expected a boolean")),
    }
}

/// Parse an enum-like cell through its `FromStr`
pub fn enumerated<T>(field: &'static str, value: &str) -> Result<T, RecordError>
where
    T: FromStr<Err = String>,
{
    value.parse::<T>().map_err(|reason| invalid(field, value, &reason))
}

fn invalid(field: &'static str, value: &str, reason: &str) -> RecordError {
    RecordError::InvalidField {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
