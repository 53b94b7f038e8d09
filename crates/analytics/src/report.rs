//! Tagged report records handed to the presentation layer.
//!
//! Every report kind has a fallback: a neutral, shape-identical record used
//! when the input snapshot cannot be fetched.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use bistro_core::DomainError;

use crate::anomaly::AnomalyRecord;
use crate::financial::FinancialMetrics;
use crate::forecast::RevenueForecast;
use crate::inventory_analysis::InventoryReport;
use crate::profitability::MenuProfitability;
use crate::restock::RestockRecommendation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    RevenueForecast,
    FinancialMetrics,
    InventoryReport,
    RestockRecommendations,
    MenuProfitability,
    Anomalies,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::RevenueForecast,
        ReportKind::FinancialMetrics,
        ReportKind::InventoryReport,
        ReportKind::RestockRecommendations,
        ReportKind::MenuProfitability,
        ReportKind::Anomalies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::RevenueForecast => "revenue-forecast",
            ReportKind::FinancialMetrics => "financial-metrics",
            ReportKind::InventoryReport => "inventory-report",
            ReportKind::RestockRecommendations => "restock-recommendations",
            ReportKind::MenuProfitability => "menu-profitability",
            ReportKind::Anomalies => "anomalies",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown report kind '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum Report {
    RevenueForecast(RevenueForecast),
    FinancialMetrics(FinancialMetrics),
    InventoryReport(InventoryReport),
    RestockRecommendations(Vec<RestockRecommendation>),
    MenuProfitability(MenuProfitability),
    Anomalies(Vec<AnomalyRecord>),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::RevenueForecast(_) => ReportKind::RevenueForecast,
            Report::FinancialMetrics(_) => ReportKind::FinancialMetrics,
            Report::InventoryReport(_) => ReportKind::InventoryReport,
            Report::RestockRecommendations(_) => ReportKind::RestockRecommendations,
            Report::MenuProfitability(_) => ReportKind::MenuProfitability,
            Report::Anomalies(_) => ReportKind::Anomalies,
        }
    }

    /// The fixed degraded report for `kind`: zeros and empty lists.
    pub fn fallback(kind: ReportKind) -> Self {
        match kind {
            ReportKind::RevenueForecast => Report::RevenueForecast(RevenueForecast {
                next_month: 0.0,
                next_quarter: 0.0,
                next_six_months: 0.0,
                next_year: 0.0,
                average_growth_rate: 0.0,
                growth_factors: Vec::new(),
                seasonal_trends: Vec::new(),
            }),
            ReportKind::FinancialMetrics => Report::FinancialMetrics(FinancialMetrics::default()),
            ReportKind::InventoryReport => Report::InventoryReport(InventoryReport::default()),
            ReportKind::RestockRecommendations => Report::RestockRecommendations(Vec::new()),
            ReportKind::MenuProfitability => Report::MenuProfitability(MenuProfitability::default()),
            ReportKind::Anomalies => Report::Anomalies(Vec::new()),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
