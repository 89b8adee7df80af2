//! Formatting of values as they are written into the spreadsheet: dates as
//! `dd.MM.yyyy` and decimals with two digits and a comma separator.

use chrono::NaiveDate;
use thiserror::Error;

use crate::duration::{self, MalformedDuration};

const SHEET_DATE_FORMAT: &str = "%d.%m.%Y";
/// Dates in chart entries, e.g. "3/14/2024".
const CHART_DATE_FORMAT: &str = "%m/%d/%Y";
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("malformed date \"{0}\"")]
    MalformedDate(String),
    #[error(transparent)]
    MalformedDuration(#[from] MalformedDuration),
}

/// Formats a number with exactly two decimals and a comma as the decimal
/// separator.
pub fn decimal(value: f64) -> String {
    format!("{value:.2}").replace('.', ",")
}

/// Reformats a chart label date ("M/d/yyyy") for the sheet.
pub fn chart_date(text: &str) -> Result<String, FormatError> {
    let date = NaiveDate::parse_from_str(text.trim(), CHART_DATE_FORMAT)
        .map_err(|_| FormatError::MalformedDate(text.to_owned()))?;
    Ok(date.format(SHEET_DATE_FORMAT).to_string())
}

/// Reformats the date portion of an ISO-like date-time ("2024-01-31T00:00:00")
/// for the sheet. The time portion is ignored.
pub fn report_date(text: &str) -> Result<String, FormatError> {
    let date_part = text.split('T').next().unwrap_or(text);
    let date = NaiveDate::parse_from_str(date_part, ISO_DATE_FORMAT)
        .map_err(|_| FormatError::MalformedDate(text.to_owned()))?;
    Ok(date.format(SHEET_DATE_FORMAT).to_string())
}

pub fn minutes(duration_text: &str) -> Result<u64, FormatError> {
    Ok(duration::to_minutes(duration_text)?)
}
