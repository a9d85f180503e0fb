use crate::error::{ReportError, Result};
use crate::models::ReportingPeriod;
use chrono::{Datelike, Local, NaiveDate};

/// Requests on or before this day of the month still report the previous window
pub const GRACE_DAYS: u32 = 10;

/// Maps a date to its bimonthly reporting window.
///
/// The window is the odd-month-aligned pair of months containing `date`, shifted one
/// window back when `date` falls within the first `GRACE_DAYS` days of its month.
/// `None` resolves to today's local date.
pub fn report_period(date: Option<NaiveDate>) -> ReportingPeriod {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let mut year = date.year();
    let mut start_month = ((date.month() as i32 - 1) / 2) * 2 + 1;

    if date.day() <= GRACE_DAYS {
        start_month -= 2;
    }
    if start_month < 1 {
        start_month += 12;
        year -= 1;
    }
    let start_month = start_month as u32;
    let end_month = start_month + 1;

    ReportingPeriod {
        start_date: first_of_month(year, start_month),
        end_date: last_of_month(year, end_month),
    }
}

/// String front end of [`report_period`]: `None` or an empty string means today
pub fn report_period_str(date: Option<&str>) -> Result<ReportingPeriod> {
    Ok(report_period(parse_date(date)?))
}

/// Parses an optional `YYYY-MM-DD` date; blank input counts as absent
pub fn parse_date(date: Option<&str>) -> Result<Option<NaiveDate>> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(None),
        Some(input) => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .map(Some)
            .map_err(|source| ReportError::Parse {
                input: input.to_string(),
                source,
            }),
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("month is always within 1..=12")
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    first_of_month(next_year, next_month)
        .pred_opt()
        .expect("first of a month always has a predecessor")
}
