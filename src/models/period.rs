use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bimonthly accounting window, always two consecutive months starting on an odd month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportingPeriod {
    /// Canonical `YYYY-MM-DD` form of the start date
    pub fn start(&self) -> String {
        self.start_date.format("%Y-%m-%d").to_string()
    }

    /// Canonical `YYYY-MM-DD` form of the end date
    pub fn end(&self) -> String {
        self.end_date.format("%Y-%m-%d").to_string()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start(), self.end())
    }
}
