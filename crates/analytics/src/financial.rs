//! Revenue, expense and profit summary relative to a reference instant.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bistro_core::range::start_of_day;
use bistro_core::{Cents, DateRange};
use bistro_menu::{MenuItem, MenuItemId};
use bistro_sales::TransactionRecord;
use bistro_staff::ShiftRecord;

use crate::anomaly::{anomaly_window, AnomalyDetector};

/// Overhead charged as a share of monthly revenue.
pub const DEFAULT_OVERHEAD_RATE: f64 = 0.10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
    pub year_to_date: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub food_cost: f64,
    pub labor_cost: f64,
    pub overhead: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    pub gross: f64,
    pub net: f64,
    pub margin_percent: f64,
}

/// Financial metrics report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub revenue: RevenueSummary,
    pub expenses: ExpenseSummary,
    pub profit: ProfitSummary,
    pub anomaly_count: usize,
}

fn settled_revenue(transactions: &[TransactionRecord], range: &DateRange) -> Cents {
    transactions
        .iter()
        .filter(|t| t.status.is_settled() && range.contains(t.timestamp))
        .map(|t| t.total)
        .sum()
}

/// Σ menu unit cost × quantity over settled transactions in `range`.
/// Lines for unknown menu items cost nothing.
pub fn food_cost(menu: &[MenuItem], transactions: &[TransactionRecord], range: &DateRange) -> Cents {
    let unit_costs: HashMap<MenuItemId, Cents> = menu.iter().map(|m| (m.id, m.unit_cost)).collect();
    transactions
        .iter()
        .filter(|t| t.status.is_settled() && range.contains(t.timestamp))
        .flat_map(|t| t.line_items.iter())
        .filter_map(|l| unit_costs.get(&l.menu_item_id).map(|c| c.times(l.quantity)))
        .sum()
}

/// Labor cost of shifts starting in `range`, open shifts counted up to `as_of`.
pub fn labor_cost(shifts: &[ShiftRecord], range: &DateRange, as_of: DateTime<Utc>) -> Cents {
    shifts
        .iter()
        .filter(|s| range.contains(s.start_time))
        .map(|s| s.labor_cost(as_of))
        .sum()
}

#[derive(Debug, Clone)]
pub struct FinancialCalculator {
    overhead_rate: f64,
    detector: AnomalyDetector,
}

impl Default for FinancialCalculator {
    fn default() -> Self {
        Self {
            overhead_rate: DEFAULT_OVERHEAD_RATE,
            detector: AnomalyDetector::default(),
        }
    }
}

impl FinancialCalculator {
    pub fn new(overhead_rate: f64, detector: AnomalyDetector) -> Self {
        Self { overhead_rate, detector }
    }

    pub fn overhead_rate(&self) -> f64 {
        self.overhead_rate
    }

    pub fn compute(
        &self,
        transactions: &[TransactionRecord],
        shifts: &[ShiftRecord],
        menu: &[MenuItem],
        as_of: DateTime<Utc>,
    ) -> FinancialMetrics {
        let today = DateRange {
            from: start_of_day(as_of.date_naive()),
            to: as_of + Duration::nanoseconds(1),
        };
        let month = DateRange::since_month_start(as_of, 0);

        let revenue = RevenueSummary {
            daily: settled_revenue(transactions, &today).as_units(),
            weekly: settled_revenue(transactions, &DateRange::trailing_days(as_of, 7)).as_units(),
            monthly: settled_revenue(transactions, &month).as_units(),
            year_to_date: settled_revenue(transactions, &DateRange::year_to_date(as_of)).as_units(),
        };

        let food = food_cost(menu, transactions, &month).as_units();
        let labor = labor_cost(shifts, &month, as_of).as_units();
        let overhead = revenue.monthly * self.overhead_rate;
        let expenses = ExpenseSummary {
            food_cost: food,
            labor_cost: labor,
            overhead,
            total: food + labor + overhead,
        };

        let net = revenue.monthly - expenses.total;
        let profit = ProfitSummary {
            gross: revenue.monthly - food,
            net,
            margin_percent: if revenue.monthly > 0.0 {
                net / revenue.monthly * 100.0
            } else {
                0.0
            },
        };

        let window = anomaly_window(as_of);
        let recent: Vec<TransactionRecord> = transactions
            .iter()
            .filter(|t| window.contains(t.timestamp))
            .cloned()
            .collect();
        let anomaly_count = self.detector.detect(&recent, as_of).len();
        debug!(
            monthly_revenue = revenue.monthly,
            anomaly_count,
            "financial metrics computed"
        );

        FinancialMetrics {
            revenue,
            expenses,
            profit,
            anomaly_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::{RecordId, StaffId};
    use bistro_sales::{LineItem, TransactionId, TransactionStatus};
    use bistro_staff::ShiftStatus;
    use chrono::TimeZone;

    fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
    }

    fn as_of() -> DateTime<Utc> {
        at(3, 20, 18)
    }

    fn burger() -> MenuItem {
        MenuItem::new(MenuItemId::new(RecordId::from_u128(1)), "Burger", "Mains", Cents(400))
    }

    fn txn(n: u128, when: DateTime<Utc>, qty: u32, status: TransactionStatus) -> TransactionRecord {
        let line = LineItem::new(burger().id, qty, Cents(1_000));
        TransactionRecord {
            id: TransactionId::new(RecordId::from_u128(100 + n)),
            timestamp: when,
            total: line.line_total(),
            status,
            line_items: vec![line],
            staff_id: StaffId::from_u128(1),
        }
    }

    fn shift(start: DateTime<Utc>, hours: i64) -> ShiftRecord {
        ShiftRecord {
            staff_id: StaffId::from_u128(7),
            hourly_rate: Cents(1_500),
            start_time: start,
            end_time: Some(start + Duration::hours(hours)),
            status: ShiftStatus::Completed,
        }
    }

    #[test]
    fn revenue_windows_use_settled_transactions() {
        let txns = vec![
            txn(1, at(3, 20, 12), 1, TransactionStatus::Paid),      // today
            txn(2, at(3, 15, 12), 2, TransactionStatus::Completed), // this week
            txn(3, at(3, 2, 12), 3, TransactionStatus::Paid),       // this month
            txn(4, at(1, 10, 12), 4, TransactionStatus::Paid),      // this year
            txn(5, at(3, 20, 13), 5, TransactionStatus::Pending),   // not settled
            txn(6, at(3, 20, 19), 6, TransactionStatus::Paid),      // after as_of
        ];
        let metrics = FinancialCalculator::default().compute(&txns, &[], &[burger()], as_of());
        assert_eq!(metrics.revenue.daily, 10.0);
        assert_eq!(metrics.revenue.weekly, 30.0);
        assert_eq!(metrics.revenue.monthly, 60.0);
        assert_eq!(metrics.revenue.year_to_date, 100.0);
    }

    #[test]
    fn expenses_and_profit() {
        let txns = vec![
            txn(1, at(3, 5, 12), 5, TransactionStatus::Paid),
            txn(2, at(3, 6, 12), 5, TransactionStatus::Paid),
        ];
        let shifts = vec![shift(at(3, 5, 9), 4), shift(at(2, 28, 9), 8)];
        let metrics = FinancialCalculator::default().compute(&txns, &shifts, &[burger()], as_of());

        assert_eq!(metrics.revenue.monthly, 100.0);
        assert_eq!(metrics.expenses.food_cost, 40.0);
        assert_eq!(metrics.expenses.labor_cost, 60.0);
        assert!((metrics.expenses.overhead - 10.0).abs() < 1e-9);
        assert!((metrics.expenses.total - 110.0).abs() < 1e-9);
        assert_eq!(metrics.profit.gross, 60.0);
        assert!((metrics.profit.net + 10.0).abs() < 1e-9);
        assert!((metrics.profit.margin_percent + 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_month_has_zero_margin() {
        let metrics = FinancialCalculator::default().compute(&[], &[], &[], as_of());
        assert_eq!(metrics, FinancialMetrics::default());
    }

    #[test]
    fn anomaly_count_matches_detector() {
        let txns: Vec<TransactionRecord> = (0..10)
            .map(|n| txn(n, at(2, 10, 12), 1, TransactionStatus::Paid))
            .chain((10..12).map(|n| txn(n, at(3, 10, 12), 1, TransactionStatus::Paid)))
            .collect();
        let metrics = FinancialCalculator::default().compute(&txns, &[], &[burger()], as_of());
        assert_eq!(
            metrics.anomaly_count,
            AnomalyDetector::default().detect(&txns, as_of()).len()
        );
        assert!(metrics.anomaly_count >= 1);
    }
}
