use chrono::{Datelike, Local, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::LedgerError;

static MONTH_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])$").ok());

/// Years that have a four-digit `YYYY-MM` key.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Calendar month key in `YYYY-MM` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(String);

impl MonthKey {
    /// Strictly validate a `YYYY-MM` string: four-digit year, two-digit month 01-12.
    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        let matches = MONTH_PATTERN
            .as_ref()
            .is_some_and(|re| re.is_match(s));
        if !matches {
            return Err(LedgerError::Validation(format!(
                "Month must be in YYYY-MM format, got '{s}'"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The month containing `date`. Callers check [`validate_date`] first for
    /// dates that came from input.
    pub fn of(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> i32 {
        self.0
            .rsplit_once('-')
            .and_then(|(y, _)| y.parse().ok())
            .unwrap_or_default()
    }

    pub fn month(&self) -> u32 {
        self.0
            .rsplit_once('-')
            .and_then(|(_, m)| m.parse().ok())
            .unwrap_or(1)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or_else(|| self.first_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Stays put at the last supported month.
    pub fn next(&self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .filter(|d| validate_date(*d).is_ok())
            .map(Self::of)
            .unwrap_or_else(|| self.clone())
    }

    /// Stays put at the first supported month.
    pub fn prev(&self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .filter(|d| validate_date(*d).is_ok())
            .map(Self::of)
            .unwrap_or_else(|| self.clone())
    }
}

/// Reject dates whose month has no `YYYY-MM` key.
pub fn validate_date(date: NaiveDate) -> Result<(), LedgerError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "Date {date} is outside years {MIN_YEAR:04}-{MAX_YEAR}"
        )))
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
