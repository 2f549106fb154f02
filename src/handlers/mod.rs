// handlers/mod.rs - HTTP handlers grouped by security level
//
// public/    - no authentication (health, signup, login, password reset)
// protected/ - bearer JWT required; owner/worker checks happen per handler

pub mod protected;
pub mod public;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ApiError;
use crate::types::parse_date;

/// Trimmed, non-empty text or a 400 naming the field.
pub(crate) fn required_text(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::invalid_field(field, format!("{field} is required"))),
    }
}

/// Blank optional text is stored as NULL.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn required_date(field: &str, value: Option<&str>) -> Result<NaiveDate, ApiError> {
    let raw = value.ok_or_else(|| ApiError::invalid_field(field, format!("{field} is required")))?;
    parse_date(raw).ok_or_else(|| ApiError::invalid_field(field, "Expected a date (YYYY-MM-DD)"))
}

pub(crate) fn optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| ApiError::invalid_field(field, "Expected a date (YYYY-MM-DD)")),
    }
}

pub(crate) fn non_negative(field: &str, value: Decimal) -> Result<Decimal, ApiError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ApiError::invalid_field(field, format!("{field} must be zero or more")))
    } else {
        Ok(value)
    }
}

/// Largest value a NUMERIC(12,2) money column holds.
pub(crate) const MAX_MONEY: Decimal = Decimal::from_parts(999_999_999_999_u64 as u32, (999_999_999_999_u64 >> 32) as u32, 0, false, 2);
/// NUMERIC(8,2) bound on `worker_payments.hours_worked`.
pub(crate) const MAX_HOURS: Decimal = Decimal::from_parts(99_999_999_u64 as u32, (99_999_999_u64 >> 32) as u32, 0, false, 2);
/// NUMERIC(6,2) bound on timesheet hours.
pub(crate) const MAX_SHIFT_HOURS: Decimal = Decimal::from_parts(999_999_u64 as u32, (999_999_u64 >> 32) as u32, 0, false, 2);
/// NUMERIC(10,2) bound on hourly rates.
pub(crate) const MAX_RATE: Decimal = Decimal::from_parts(9_999_999_999_u64 as u32, (9_999_999_999_u64 >> 32) as u32, 0, false, 2);

/// Reject values the target column cannot store.
pub(crate) fn bounded(field: &str, value: Decimal, max: Decimal) -> Result<Decimal, ApiError> {
    if value.abs() > max {
        Err(ApiError::invalid_field(field, format!("{field} must not exceed {max}")))
    } else {
        Ok(value)
    }
}

/// Shorthand for amounts stored in NUMERIC(12,2).
pub(crate) fn money(field: &str, value: Decimal) -> Result<Decimal, ApiError> {
    bounded(field, value, MAX_MONEY)
}

/// Parse a text enum from a request, reporting allowed values on failure.
pub(crate) fn parse_choice<T>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|e| ApiError::invalid_field(field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("name", Some("  Deck  ".into())).unwrap(), "Deck");
        assert_eq!(required_text("name", Some("   ".into())).unwrap_err().status_code(), 400);
        assert!(required_text("name", None).is_err());
    }

    #[test]
    fn dates_and_amounts() {
        assert!(required_date("startDate", Some("2024-06-01")).is_ok());
        assert!(required_date("startDate", Some("June 1")).is_err());
        assert_eq!(optional_date("endDate", Some("")).unwrap(), None);
        assert!(non_negative("amount", Decimal::new(-1, 2)).is_err());
        assert!(non_negative("amount", Decimal::ZERO).is_ok());
    }

    #[test]
    fn column_bounds() {
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
        assert_eq!(MAX_HOURS.to_string(), "999999.99");
        assert_eq!(MAX_RATE.to_string(), "99999999.99");
        assert!(money("amount", MAX_MONEY).is_ok());
        let err = money("amount", MAX_MONEY + Decimal::new(1, 2)).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(bounded("hoursWorked", Decimal::new(1_000_000, 0), MAX_HOURS).is_err());
    }

    #[test]
    fn choices_report_allowed_values() {
        assert_eq!(parse_choice::<JobStatus>("status", "on_hold").unwrap(), JobStatus::OnHold);
        let err = parse_choice::<JobStatus>("status", "paused").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
