use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{Cents, StaffId};

/// Shift lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Active,
    Completed,
    Late,
}

/// A worked (or in-progress) shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    pub staff_id: StaffId,
    /// Hourly rate in smallest currency unit (e.g., cents).
    pub hourly_rate: Cents,
    pub start_time: DateTime<Utc>,
    /// `None` while the shift is still active.
    pub end_time: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
}

impl ShiftRecord {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Hours worked; an open shift is counted up to `as_of`.
    ///
    /// Never negative: a shift that ends before it starts (or starts after
    /// `as_of`) counts as zero hours.
    pub fn hours_worked(&self, as_of: DateTime<Utc>) -> f64 {
        let end = self.end_time.unwrap_or(as_of);
        let seconds = (end - self.start_time).num_seconds().max(0);
        seconds as f64 / 3600.0
    }

    /// Hours × hourly rate, rounded to the nearest smallest currency unit.
    pub fn labor_cost(&self, as_of: DateTime<Utc>) -> Cents {
        let cost = self.hours_worked(as_of) * self.hourly_rate.get() as f64;
        Cents(cost.round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
    }

    fn test_shift(end_time: Option<DateTime<Utc>>, status: ShiftStatus) -> ShiftRecord {
        ShiftRecord {
            staff_id: StaffId::from_u128(5),
            hourly_rate: Cents(1_800),
            start_time: test_time(),
            end_time,
            status,
        }
    }

    #[test]
    fn closed_shift_costs_hours_times_rate() {
        let shift = test_shift(Some(test_time() + Duration::minutes(450)), ShiftStatus::Completed);
        assert_eq!(shift.hours_worked(test_time()), 7.5);
        assert_eq!(shift.labor_cost(test_time()), Cents(13_500));
    }

    #[test]
    fn open_shift_is_counted_until_as_of() {
        let shift = test_shift(None, ShiftStatus::Active);
        assert!(shift.is_open());
        let as_of = test_time() + Duration::hours(2);
        assert_eq!(shift.hours_worked(as_of), 2.0);
        assert_eq!(shift.labor_cost(as_of), Cents(3_600));
    }

    #[test]
    fn inverted_shift_counts_zero_hours() {
        let shift = test_shift(Some(test_time() - Duration::hours(1)), ShiftStatus::Late);
        assert_eq!(shift.hours_worked(test_time()), 0.0);
        assert_eq!(shift.labor_cost(test_time()), Cents::ZERO);
    }

    #[test]
    fn null_end_time_round_trips() {
        let shift = test_shift(None, ShiftStatus::Active);
        let json = serde_json::to_value(&shift).unwrap();
        assert!(json["endTime"].is_null());
        assert_eq!(json["status"], "active");
        let back: ShiftRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, shift);
    }
}
