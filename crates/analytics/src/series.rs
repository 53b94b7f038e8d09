//! Series aggregation: raw records → ordered, time-bucketed numeric series.
//!
//! Series are sparse by default (empty buckets are omitted). Callers that need
//! a fixed calendar range use [`aggregate_in_range`], which fills missing
//! buckets with `0.0`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Serialize, Serializer};

use bistro_core::range::shift_month;
use bistro_core::DomainError;
use bistro_inventory::InventoryItem;
use bistro_sales::TransactionRecord;
use bistro_staff::ShiftRecord;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Bucketing key applied to record timestamps.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Bucketing {
    /// Calendar month (`2024-03`).
    Month,
    /// ISO-8601 week (`2024-W11`).
    IsoWeek,
    /// Calendar day (`2024-03-15`).
    Day,
    /// Day of week, Monday first (`Mon`).
    Weekday,
}

/// A bucket of a [`TimeSeries`].
///
/// Ordering is chronological within one bucketing; keys of different
/// bucketings are never mixed in a series.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Month { year: i32, month: u32 },
    IsoWeek { year: i32, week: u32 },
    Day(NaiveDate),
    /// Days from Monday (0 = Monday .. 6 = Sunday).
    Weekday(u32),
}

impl PeriodKey {
    pub fn of(bucketing: Bucketing, instant: DateTime<Utc>) -> Self {
        let date = instant.date_naive();
        match bucketing {
            Bucketing::Month => PeriodKey::Month {
                year: date.year(),
                month: date.month(),
            },
            Bucketing::IsoWeek => {
                let week = date.iso_week();
                PeriodKey::IsoWeek {
                    year: week.year(),
                    week: week.week(),
                }
            }
            Bucketing::Day => PeriodKey::Day(date),
            Bucketing::Weekday => PeriodKey::Weekday(date.weekday().num_days_from_monday()),
        }
    }

    pub fn bucketing(&self) -> Bucketing {
        match self {
            PeriodKey::Month { .. } => Bucketing::Month,
            PeriodKey::IsoWeek { .. } => Bucketing::IsoWeek,
            PeriodKey::Day(_) => Bucketing::Day,
            PeriodKey::Weekday(_) => Bucketing::Weekday,
        }
    }

    /// The following bucket. `None` past the end of the calendar or after Sunday.
    pub fn next(&self) -> Option<Self> {
        match *self {
            PeriodKey::Month { year, month } => {
                let (year, month) = shift_month(year, month, 1);
                Some(PeriodKey::Month { year, month })
            }
            PeriodKey::IsoWeek { year, week } => {
                let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
                let next = monday.checked_add_signed(Duration::days(7))?.iso_week();
                Some(PeriodKey::IsoWeek {
                    year: next.year(),
                    week: next.week(),
                })
            }
            PeriodKey::Day(date) => date.succ_opt().map(PeriodKey::Day),
            PeriodKey::Weekday(d) if d < 6 => Some(PeriodKey::Weekday(d + 1)),
            PeriodKey::Weekday(_) => None,
        }
    }

    pub fn month_of_year(&self) -> Option<u32> {
        match *self {
            PeriodKey::Month { month, .. } => Some(month),
            _ => None,
        }
    }
}

impl core::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PeriodKey::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            PeriodKey::IsoWeek { year, week } => write!(f, "{year:04}-W{week:02}"),
            PeriodKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PeriodKey::Weekday(d) => f.write_str(WEEKDAY_LABELS.get(*d as usize).copied().unwrap_or("?")),
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One `(period, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period: PeriodKey,
    pub value: f64,
}

/// Chronologically ordered series without duplicate periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    #[serde(skip)]
    bucketing: Bucketing,
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn empty(bucketing: Bucketing) -> Self {
        Self {
            bucketing,
            points: Vec::new(),
        }
    }

    /// Build a series from explicit points, rejecting out-of-order or
    /// duplicate periods and periods of a different bucketing.
    pub fn from_points(bucketing: Bucketing, points: Vec<SeriesPoint>) -> Result<Self, DomainError> {
        if let Some(p) = points.iter().find(|p| p.period.bucketing() != bucketing) {
            return Err(DomainError::invariant(format!(
                "period {} does not match series bucketing {bucketing:?}",
                p.period
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[0].period >= w[1].period) {
            return Err(DomainError::invariant(format!(
                "series periods must be strictly increasing ({} then {})",
                w[0].period, w[1].period
            )));
        }
        Ok(Self { bucketing, points })
    }

    fn from_map(bucketing: Bucketing, buckets: BTreeMap<PeriodKey, f64>) -> Self {
        let points = buckets
            .into_iter()
            .map(|(period, value)| SeriesPoint { period, value })
            .collect();
        Self { bucketing, points }
    }

    pub fn bucketing(&self) -> Bucketing {
        self.bucketing
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, period: &PeriodKey) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.period.cmp(period))
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Drop leading zero-valued buckets (periods before activity began).
    pub fn trim_leading_zeros(mut self) -> Self {
        let first = self
            .points
            .iter()
            .position(|p| p.value != 0.0)
            .unwrap_or(self.points.len());
        self.points.drain(..first);
        self
    }
}

/// Sparse aggregation: sum `value_of(record)` per bucket, omitting empty buckets.
///
/// `value_of` returns the record's instant and value, or `None` to skip it.
pub fn aggregate<T, I, F>(records: I, bucketing: Bucketing, value_of: F) -> TimeSeries
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Option<(DateTime<Utc>, f64)>,
{
    let mut buckets: BTreeMap<PeriodKey, f64> = BTreeMap::new();
    for record in records {
        if let Some((at, value)) = value_of(&record) {
            *buckets.entry(PeriodKey::of(bucketing, at)).or_insert(0.0) += value;
        }
    }
    TimeSeries::from_map(bucketing, buckets)
}

/// Fixed-range aggregation: every bucket from the bucket of `from` to the
/// bucket of `to` (inclusive) is present, zero-filled when empty. Records
/// outside `[from, to]` are ignored. Day-of-week series always carry all
/// seven days.
pub fn aggregate_in_range<T, I, F>(
    records: I,
    bucketing: Bucketing,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    value_of: F,
) -> TimeSeries
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Option<(DateTime<Utc>, f64)>,
{
    let mut buckets: BTreeMap<PeriodKey, f64> = BTreeMap::new();
    if from > to {
        return TimeSeries::from_map(bucketing, buckets);
    }

    let (first, last) = match bucketing {
        Bucketing::Weekday => (PeriodKey::Weekday(0), PeriodKey::Weekday(6)),
        _ => (PeriodKey::of(bucketing, from), PeriodKey::of(bucketing, to)),
    };
    let mut key = Some(first);
    while let Some(k) = key {
        if k > last {
            break;
        }
        buckets.insert(k, 0.0);
        key = k.next();
    }

    for record in records {
        if let Some((at, value)) = value_of(&record) {
            if at < from || at > to {
                continue;
            }
            *buckets.entry(PeriodKey::of(bucketing, at)).or_insert(0.0) += value;
        }
    }

    TimeSeries::from_map(bucketing, buckets)
}

/// Revenue (currency units) of settled transactions per bucket.
pub fn revenue_series(transactions: &[TransactionRecord], bucketing: Bucketing) -> TimeSeries {
    aggregate(transactions, bucketing, settled_revenue)
}

/// Revenue of settled transactions over a fixed range, zero-filled.
pub fn revenue_series_in_range(
    transactions: &[TransactionRecord],
    bucketing: Bucketing,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> TimeSeries {
    aggregate_in_range(transactions, bucketing, from, to, settled_revenue)
}

fn settled_revenue(t: &&TransactionRecord) -> Option<(DateTime<Utc>, f64)> {
    t.status.is_settled().then(|| (t.timestamp, t.total.as_units()))
}

/// Count of sale-bearing orders (not cancelled, not refunded) per bucket.
pub fn order_count_series(
    transactions: &[TransactionRecord],
    bucketing: Bucketing,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> TimeSeries {
    aggregate_in_range(transactions, bucketing, from, to, |t| {
        t.status.is_sale().then(|| (t.timestamp, 1.0))
    })
}

/// Σ quantity × unit price (currency units) of sale-bearing orders per bucket.
pub fn line_item_series(
    transactions: &[TransactionRecord],
    bucketing: Bucketing,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> TimeSeries {
    aggregate_in_range(transactions, bucketing, from, to, |t| {
        t.status
            .is_sale()
            .then(|| (t.timestamp, t.line_items_total().as_units()))
    })
}

/// Usage amount of one inventory item per bucket (sparse).
pub fn usage_series(item: &InventoryItem, bucketing: Bucketing) -> TimeSeries {
    aggregate(&item.usage_history, bucketing, |e| Some((e.date, e.amount)))
}

/// Usage amount of one inventory item over a fixed range, zero-filled.
pub fn usage_series_in_range(
    item: &InventoryItem,
    bucketing: Bucketing,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> TimeSeries {
    aggregate_in_range(&item.usage_history, bucketing, from, to, |e| Some((e.date, e.amount)))
}

/// Labor cost (hours × rate, currency units) bucketed by shift start.
pub fn labor_cost_series(shifts: &[ShiftRecord], bucketing: Bucketing, as_of: DateTime<Utc>) -> TimeSeries {
    aggregate(shifts, bucketing, |s| {
        (s.start_time <= as_of).then(|| (s.start_time, s.labor_cost(as_of).as_units()))
    })
}
