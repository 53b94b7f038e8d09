use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bistro_core::range::{month_start, shift_month, start_of_day};
use bistro_core::{DateRange, StaffId};
use bistro_sales::{TransactionRecord, TransactionStatus};

use crate::series::{line_item_series, order_count_series, Bucketing, PeriodKey};

/// Anomaly priority, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyKind {
    RefundConcentration,
    OrderVolumeDrop,
    ExpenseSpike,
}

/// A flagged deviation from baseline (ephemeral, recomputed per request).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub priority: Priority,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub details: String,
    /// Size of the deviation in percent (excess over average, or relative change).
    pub magnitude: f64,
}

/// Thresholds and caller-assigned priorities for the anomaly checks.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyPolicy {
    /// Flag a staff member whose refund count exceeds `average × multiplier`.
    pub refund_multiplier: f64,
    /// Flag when month-over-month order count changes by less than this (percent).
    pub order_drop_percent: f64,
    /// Flag when month-over-month line-item spend changes by more than this (percent).
    pub expense_spike_percent: f64,
    pub order_drop_priority: Priority,
    pub expense_spike_priority: Priority,
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self {
            refund_multiplier: 2.0,
            order_drop_percent: -20.0,
            expense_spike_percent: 20.0,
            order_drop_priority: Priority::Medium,
            expense_spike_priority: Priority::Low,
        }
    }
}

/// Stateless detector over a transaction snapshot.
///
/// Checks:
/// - Refund concentration: refunds per staff member against the per-staff average.
/// - Order-volume drop: current vs previous calendar month order count.
/// - Expense spike: current vs previous calendar month line-item spend.
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    policy: AnomalyPolicy,
}

impl AnomalyDetector {
    pub fn new(policy: AnomalyPolicy) -> Self {
        Self { policy }
    }

    /// Run every check. Output is ordered by priority, then magnitude descending.
    ///
    /// `as_of` fixes the "current" calendar month.
    pub fn detect(&self, transactions: &[TransactionRecord], as_of: DateTime<Utc>) -> Vec<AnomalyRecord> {
        let mut anomalies = self.refund_concentration(transactions);
        anomalies.extend(self.order_volume_drop(transactions, as_of));
        anomalies.extend(self.expense_spike(transactions, as_of));

        anomalies.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| b.magnitude.total_cmp(&a.magnitude))
        });

        debug!(
            transactions = transactions.len(),
            anomalies = anomalies.len(),
            "anomaly detection finished"
        );
        anomalies
    }

    /// Flag staff whose refund count exceeds the per-staff average by the
    /// policy multiplier. The average is taken over staff with at least one
    /// refund; no refunds means no flags.
    pub fn refund_concentration(&self, transactions: &[TransactionRecord]) -> Vec<AnomalyRecord> {
        let mut per_staff: BTreeMap<StaffId, usize> = BTreeMap::new();
        for t in transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Refunded)
        {
            *per_staff.entry(t.staff_id).or_insert(0) += 1;
        }

        let distinct_staff = per_staff.len();
        if distinct_staff == 0 {
            return Vec::new();
        }
        let total_refunds: usize = per_staff.values().sum();
        let average = total_refunds as f64 / distinct_staff as f64;
        let threshold = average * self.policy.refund_multiplier;

        per_staff
            .into_iter()
            .filter(|(_, count)| *count as f64 > threshold)
            .map(|(staff_id, count)| {
                let excess_percent = (count as f64 / average - 1.0) * 100.0;
                AnomalyRecord {
                    priority: Priority::High,
                    kind: AnomalyKind::RefundConcentration,
                    details: format!(
                        "staff {staff_id} processed {count} refunds; average is {average:.2} per staff member ({excess_percent:.0}% above average)"
                    ),
                    magnitude: excess_percent,
                }
            })
            .collect()
    }

    /// Flag a month-over-month drop in sale-bearing order count.
    pub fn order_volume_drop(&self, transactions: &[TransactionRecord], as_of: DateTime<Utc>) -> Option<AnomalyRecord> {
        let (previous_key, current_key, from) = month_window(as_of);
        let series = order_count_series(transactions, Bucketing::Month, from, as_of);
        let previous = series.get(&previous_key).unwrap_or(0.0);
        let current = series.get(&current_key).unwrap_or(0.0);

        let change = relative_change_percent(previous, current)?;
        if change >= self.policy.order_drop_percent {
            return None;
        }

        Some(AnomalyRecord {
            priority: self.policy.order_drop_priority,
            kind: AnomalyKind::OrderVolumeDrop,
            details: format!(
                "order volume fell from {previous:.0} in {previous_key} to {current:.0} in {current_key} ({change:.1}%)"
            ),
            magnitude: change.abs(),
        })
    }

    /// Flag a month-over-month rise in summed line-item price.
    pub fn expense_spike(&self, transactions: &[TransactionRecord], as_of: DateTime<Utc>) -> Option<AnomalyRecord> {
        let (previous_key, current_key, from) = month_window(as_of);
        let series = line_item_series(transactions, Bucketing::Month, from, as_of);
        let previous = series.get(&previous_key).unwrap_or(0.0);
        let current = series.get(&current_key).unwrap_or(0.0);

        let change = relative_change_percent(previous, current)?;
        if change <= self.policy.expense_spike_percent {
            return None;
        }

        Some(AnomalyRecord {
            priority: self.policy.expense_spike_priority,
            kind: AnomalyKind::ExpenseSpike,
            details: format!(
                "line-item spend rose from {previous:.2} in {previous_key} to {current:.2} in {current_key} (+{change:.1}%)"
            ),
            magnitude: change,
        })
    }
}

/// `(current - previous) / previous × 100`; `None` when `previous` is not positive.
pub fn relative_change_percent(previous: f64, current: f64) -> Option<f64> {
    if previous > 0.0 {
        Some((current - previous) / previous * 100.0)
    } else {
        None
    }
}

/// Transactions the detector needs: the previous calendar month up to and
/// including `as_of`.
pub fn anomaly_window(as_of: DateTime<Utc>) -> DateRange {
    DateRange::since_month_start(as_of, 1)
}

/// Previous-month key, current-month key and the start of the previous month.
fn month_window(as_of: DateTime<Utc>) -> (PeriodKey, PeriodKey, DateTime<Utc>) {
    let current = PeriodKey::of(Bucketing::Month, as_of);
    let (year, month) = shift_month(as_of.year(), as_of.month(), -1);
    let previous = PeriodKey::Month { year, month };
    (previous, current, start_of_day(month_start(year, month)))
}
