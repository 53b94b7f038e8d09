//! Report service: bounded fetch, pure analytics, fallback on failure.
//!
//! Every `try_*` method surfaces the fetch error; [`AnalyticsService::report`]
//! never fails and degrades to [`Report::fallback`] instead.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{info, warn};

use bistro_analytics::anomaly::{anomaly_window, AnomalyDetector};
use bistro_analytics::financial::FinancialCalculator;
use bistro_analytics::forecast::forecast_revenue;
use bistro_analytics::inventory_analysis::InventoryAnalyzer;
use bistro_analytics::profitability::rank_profitability;
use bistro_analytics::restock::{RestockRecommendation, RestockScorer};
use bistro_analytics::series::{revenue_series_in_range, Bucketing};
use bistro_analytics::{Report, ReportKind};
use bistro_core::range::{month_start, shift_month, start_of_day};
use bistro_core::DateRange;
use bistro_sales::StatusFilter;

use crate::config::AnalyticsConfig;
use crate::fetch::{bounded_fetch, CancellationFlag, FetchError};
use crate::repository::{AnalyticsRepository, RepositoryError};

fn check_cancelled(cancel: &CancellationFlag) -> Result<(), RepositoryError> {
    if cancel.is_cancelled() {
        Err(RepositoryError::Cancelled)
    } else {
        Ok(())
    }
}

/// Complete calendar months of history before the month of `as_of`.
fn forecast_window(as_of: DateTime<Utc>, months: u32) -> DateRange {
    let (year, month) = shift_month(as_of.year(), as_of.month(), -(months as i32));
    DateRange {
        from: start_of_day(month_start(year, month)),
        to: start_of_day(month_start(as_of.year(), as_of.month())),
    }
}

pub struct AnalyticsService<R> {
    repo: Arc<R>,
    config: AnalyticsConfig,
    scorer: RestockScorer,
    detector: AnomalyDetector,
    inventory: InventoryAnalyzer,
}

impl<R> AnalyticsService<R>
where
    R: AnalyticsRepository + 'static,
{
    pub fn new(repo: Arc<R>, config: AnalyticsConfig) -> Self {
        Self {
            repo,
            config,
            scorer: RestockScorer::default(),
            detector: AnomalyDetector::default(),
            inventory: InventoryAnalyzer::default(),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// The requested report; the fallback report if the input cannot be fetched.
    pub fn report(&self, kind: ReportKind, as_of: DateTime<Utc>) -> Report {
        match self.try_report(kind, as_of) {
            Ok(report) => report,
            Err(e) => {
                warn!(report = %kind, error = %e, "input fetch failed; serving fallback report");
                Report::fallback(kind)
            }
        }
    }

    pub fn try_report(&self, kind: ReportKind, as_of: DateTime<Utc>) -> Result<Report, FetchError> {
        let report = match kind {
            ReportKind::RevenueForecast => self.try_revenue_forecast(as_of)?,
            ReportKind::FinancialMetrics => self.try_financial_metrics(as_of)?,
            ReportKind::InventoryReport => self.try_inventory_report(as_of)?,
            ReportKind::RestockRecommendations => {
                Report::RestockRecommendations(self.try_restock_recommendations(as_of)?)
            }
            ReportKind::MenuProfitability => self.try_menu_profitability(as_of)?,
            ReportKind::Anomalies => self.try_anomalies(as_of)?,
        };
        info!(report = %kind, "report computed");
        Ok(report)
    }

    pub fn try_revenue_forecast(&self, as_of: DateTime<Utc>) -> Result<Report, FetchError> {
        let window = forecast_window(as_of, self.config.forecast_history_months);
        let repo = Arc::clone(&self.repo);
        let transactions = bounded_fetch("revenue-history", self.config.fetch_timeout, move |_| {
            repo.query_transactions(window, &StatusFilter::settled())
        })?;

        let series = revenue_series_in_range(
            &transactions,
            Bucketing::Month,
            window.from,
            window.to - Duration::nanoseconds(1),
        )
        .trim_leading_zeros();
        Ok(Report::RevenueForecast(forecast_revenue(&series)))
    }

    pub fn try_financial_metrics(&self, as_of: DateTime<Utc>) -> Result<Report, FetchError> {
        let transactions_window = DateRange::year_to_date(as_of).cover(&anomaly_window(as_of));
        let shifts_window = DateRange::since_month_start(as_of, 0);
        let repo = Arc::clone(&self.repo);
        let (transactions, shifts, menu) =
            bounded_fetch("financial-inputs", self.config.fetch_timeout, move |cancel| {
                let transactions = repo.query_transactions(transactions_window, &StatusFilter::Any)?;
                check_cancelled(cancel)?;
                let shifts = repo.query_shifts(shifts_window)?;
                check_cancelled(cancel)?;
                let menu = repo.query_menu_items()?;
                Ok((transactions, shifts, menu))
            })?;

        let calculator = FinancialCalculator::new(self.config.overhead_rate, self.detector.clone());
        Ok(Report::FinancialMetrics(calculator.compute(
            &transactions,
            &shifts,
            &menu,
            as_of,
        )))
    }

    pub fn try_inventory_report(&self, as_of: DateTime<Utc>) -> Result<Report, FetchError> {
        let repo = Arc::clone(&self.repo);
        let items = bounded_fetch("inventory", self.config.fetch_timeout, move |_| repo.query_inventory())?;
        Ok(Report::InventoryReport(self.inventory.analyze(&items, as_of)))
    }

    pub fn try_restock_recommendations(&self, as_of: DateTime<Utc>) -> Result<Vec<RestockRecommendation>, FetchError> {
        let repo = Arc::clone(&self.repo);
        let items = bounded_fetch("inventory", self.config.fetch_timeout, move |_| repo.query_inventory())?;
        Ok(self.scorer.recommend(&items, as_of, self.config.restock_top_n))
    }

    pub fn try_menu_profitability(&self, as_of: DateTime<Utc>) -> Result<Report, FetchError> {
        let window = DateRange::trailing_days(as_of, self.config.profitability_window_days);
        let repo = Arc::clone(&self.repo);
        let (menu, transactions) = bounded_fetch("menu-sales", self.config.fetch_timeout, move |cancel| {
            let menu = repo.query_menu_items()?;
            check_cancelled(cancel)?;
            let transactions = repo.query_transactions(window, &StatusFilter::Any)?;
            Ok((menu, transactions))
        })?;

        Ok(Report::MenuProfitability(rank_profitability(
            &menu,
            &transactions,
            self.config.profitability_top_k,
        )))
    }

    pub fn try_anomalies(&self, as_of: DateTime<Utc>) -> Result<Report, FetchError> {
        let window = anomaly_window(as_of);
        let repo = Arc::clone(&self.repo);
        let transactions = bounded_fetch("recent-transactions", self.config.fetch_timeout, move |_| {
            repo.query_transactions(window, &StatusFilter::Any)
        })?;
        Ok(Report::Anomalies(self.detector.detect(&transactions, as_of)))
    }
}
