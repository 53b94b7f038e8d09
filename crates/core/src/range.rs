//! Half-open instant ranges used for repository queries and report windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Instant range `[from, to)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Self> {
        if from > to {
            return Err(DomainError::validation(format!(
                "range start {from} is after range end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Everything up to and including `as_of`, starting `days` days earlier.
    pub fn trailing_days(as_of: DateTime<Utc>, days: i64) -> Self {
        Self {
            from: as_of - Duration::days(days.max(0)),
            to: as_of + Duration::nanoseconds(1),
        }
    }

    /// From the start of the calendar month `months_back` months before the
    /// month of `as_of`, up to and including `as_of`.
    pub fn since_month_start(as_of: DateTime<Utc>, months_back: u32) -> Self {
        let (year, month) = shift_month(as_of.year(), as_of.month(), -(months_back as i32));
        Self {
            from: start_of_day(month_start(year, month)),
            to: as_of + Duration::nanoseconds(1),
        }
    }

    /// January 1st of the year of `as_of`, up to and including `as_of`.
    pub fn year_to_date(as_of: DateTime<Utc>) -> Self {
        Self {
            from: start_of_day(month_start(as_of.year(), 1)),
            to: as_of + Duration::nanoseconds(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant < self.to
    }

    /// Union of two ranges (the smallest range covering both).
    pub fn cover(&self, other: &DateRange) -> Self {
        Self {
            from: self.from.min(other.from),
            to: self.to.max(other.to),
        }
    }
}

/// First day of a calendar month. Months outside 1..=12 are clamped.
pub fn month_start(year: i32, month: u32) -> NaiveDate {
    let month = month.clamp(1, 12);
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Shift a (year, month) pair by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + (month as i32 - 1) + delta;
    (zero_based.div_euclid(12), (zero_based.rem_euclid(12) + 1) as u32)
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
