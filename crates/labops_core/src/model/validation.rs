//! Field validation shared by model types.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static CALENDAR_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<year>\d{4})-(?<month>0[1-9]|1[0-2])-(?<day>0[1-9]|[12]\d|3[01])$")
        .expect("valid date regex")
});

/// Model validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A required text field is blank after trim.
    BlankField(&'static str),
    /// A date field is not an existing `YYYY-MM-DD` calendar day.
    InvalidDate { field: &'static str, value: String },
    /// Inventory quantity below zero.
    NegativeQuantity(i64),
    /// A required reference was not supplied.
    MissingReference(&'static str),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidDate { field, value } => {
                write!(f, "`{field}` must be YYYY-MM-DD, got `{value}`")
            }
            Self::NegativeQuantity(value) => {
                write!(f, "quantity must be non-negative, got {value}")
            }
            Self::MissingReference(field) => write!(f, "`{field}` is required"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField(field));
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` naming a day that exists in the Gregorian calendar.
pub fn validate_calendar_date(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if is_calendar_day(value) {
        return Ok(());
    }
    Err(ModelValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn is_calendar_day(value: &str) -> bool {
    let Some(caps) = CALENDAR_DATE_RE.captures(value) else {
        return false;
    };
    let parse = |name: &str| caps[name].parse::<u32>().ok();
    match (parse("year"), parse("month"), parse("day")) {
        (Some(year), Some(month), Some(day)) => day <= days_in_month(year, month),
        _ => false,
    }
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::{require_text, validate_calendar_date, ModelValidationError};

    #[test]
    fn accepts_well_formed_dates() {
        validate_calendar_date("report_date", "2024-02-29").expect("leap day");
        validate_calendar_date("report_date", "2000-02-29").expect("400-year leap day");
        validate_calendar_date("report_date", "1999-12-31").expect("year end");
        validate_calendar_date("report_date", "2023-04-30").expect("end of short month");
    }

    #[test]
    fn rejects_days_missing_from_the_calendar() {
        for value in ["2023-02-31", "2023-02-29", "1900-02-29", "2023-04-31", "2023-11-31"] {
            let err = validate_calendar_date("report_date", value).expect_err("no such day");
            assert!(matches!(err, ModelValidationError::InvalidDate { field: "report_date", .. }));
        }
    }

    #[test]
    fn rejects_malformed_dates() {
        for value in ["2024-13-01", "2024-1-01", "24-01-01", "2024-01-32", "", "today"] {
            let err = validate_calendar_date("due_date", value).expect_err("must be rejected");
            assert!(matches!(err, ModelValidationError::InvalidDate { field: "due_date", .. }));
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            require_text("title", "   "),
            Err(ModelValidationError::BlankField("title"))
        );
    }
}
