//! `bistro-analytics`
//!
//! **Responsibility:** the business analytics engine.
//!
//! Pure, synchronous functions over already-fetched snapshots:
//! - no IO and no wall-clock reads (every computation takes an `as_of` instant)
//! - no shared mutable state, so concurrent callers need no locking
//! - degenerate input yields documented neutral values, never an error
//!
//! Fetching snapshots, bounded waits and fallback reports live in `bistro-infra`.

pub mod anomaly;
pub mod financial;
pub mod forecast;
pub mod inventory_analysis;
pub mod profitability;
pub mod report;
pub mod restock;
pub mod series;
pub mod trend;

pub use anomaly::{AnomalyDetector, AnomalyKind, AnomalyPolicy, AnomalyRecord, Priority};
pub use financial::{FinancialCalculator, FinancialMetrics};
pub use forecast::{forecast_revenue, RevenueForecast};
pub use inventory_analysis::{InventoryAnalyzer, InventoryReport};
pub use profitability::{rank_profitability, MenuProfitability, PricingAdvice};
pub use report::{Report, ReportKind};
pub use restock::{RestockOrderLine, RestockRecommendation, RestockScorer, UrgencyLevel};
pub use series::{Bucketing, PeriodKey, TimeSeries};
pub use trend::{analyze_trend, classify_trend, Trend, TrendAnalysis};
