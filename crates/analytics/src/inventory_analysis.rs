//! Inventory report: stock statistics, per-item status and usage analysis.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bistro_core::Cents;
use bistro_inventory::{InventoryItem, InventoryItemId};

use crate::restock::{usage_trend, RestockScorer, DEFAULT_TREND_WINDOW_DAYS};
use crate::series::{usage_series_in_range, Bucketing};
use crate::trend::{mean, Trend};

/// Trailing window for usage totals, cover and wastage.
pub const USAGE_WINDOW_DAYS: i64 = 30;
/// Minimum span of usage history before weekday seasonality is judged.
pub const SEASONAL_MIN_HISTORY_DAYS: i64 = 14;
/// Weekday peak relative to the weekday mean that counts as seasonal.
pub const SEASONAL_PEAK_RATIO: f64 = 1.5;
/// Days of cover beyond which stock is considered at risk of waste.
pub const WASTAGE_COVER_DAYS: f64 = 30.0;
pub const DEFAULT_TOP_USED: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: usize,
    pub low_stock_items: usize,
    pub total_value: f64,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    Ok,
}

impl StockStatus {
    pub fn of(item: &InventoryItem) -> Self {
        if item.is_out_of_stock() {
            StockStatus::OutOfStock
        } else if item.is_low_stock() {
            StockStatus::Low
        } else {
            StockStatus::Ok
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemStatus {
    pub id: InventoryItemId,
    pub name: String,
    pub category: String,
    pub current_stock: f64,
    pub min_level: f64,
    pub unit_price: f64,
    pub value: f64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUsage {
    pub item_id: InventoryItemId,
    pub name: String,
    pub usage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTrends {
    pub increasing: Vec<String>,
    pub decreasing: Vec<String>,
    pub seasonal: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WastageItem {
    pub item_id: InventoryItemId,
    pub name: String,
    pub current_stock: f64,
    pub usage_last_30_days: f64,
    /// `None` when nothing was used in the window.
    pub days_of_cover: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageAnalysis {
    pub top_used_items: Vec<ItemUsage>,
    pub usage_trends: UsageTrends,
    pub wastage_items: Vec<WastageItem>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub stats: InventoryStats,
    pub items: Vec<InventoryItemStatus>,
    pub ai_analysis: UsageAnalysis,
}

pub fn inventory_stats(items: &[InventoryItem]) -> InventoryStats {
    let categories: BTreeSet<&str> = items.iter().map(|i| i.category.as_str()).collect();
    InventoryStats {
        total_items: items.len(),
        low_stock_items: items.iter().filter(|i| i.is_low_stock()).count(),
        total_value: items.iter().map(InventoryItem::stock_value).sum::<Cents>().as_units(),
        categories: categories.into_iter().map(str::to_string).collect(),
    }
}

fn item_status(item: &InventoryItem) -> InventoryItemStatus {
    InventoryItemStatus {
        id: item.id,
        name: item.name.clone(),
        category: item.category.clone(),
        current_stock: item.current_stock,
        min_level: item.min_level,
        unit_price: item.unit_price.as_units(),
        value: item.stock_value().as_units(),
        status: StockStatus::of(item),
    }
}

fn usage_last_window(item: &InventoryItem, as_of: DateTime<Utc>) -> f64 {
    item.usage_between(as_of - Duration::days(USAGE_WINDOW_DAYS), as_of)
}

/// Whether the item's usage concentrates on one day of the week.
///
/// Weekday totals are divided by how often that weekday occurs between the
/// first usage and `as_of`, so a partial week does not bias the result.
pub fn is_seasonal(item: &InventoryItem, as_of: DateTime<Utc>) -> bool {
    let Some(first) = item.first_usage_at() else {
        return false;
    };
    if as_of - first < Duration::days(SEASONAL_MIN_HISTORY_DAYS) {
        return false;
    }

    let mut occurrences = [0u32; 7];
    let mut day = first.date_naive();
    let last = as_of.date_naive();
    while day <= last {
        occurrences[day.weekday().num_days_from_monday() as usize] += 1;
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    let totals = usage_series_in_range(item, Bucketing::Weekday, first, as_of).values();
    let per_day: Vec<f64> = totals
        .iter()
        .zip(occurrences.iter())
        .map(|(total, n)| if *n > 0 { total / f64::from(*n) } else { 0.0 })
        .collect();

    let average = mean(&per_day);
    let peak = per_day.iter().copied().fold(0.0_f64, f64::max);
    average > 0.0 && peak >= average * SEASONAL_PEAK_RATIO
}

/// Wastage classification; items without usage history are not classified.
pub fn wastage(item: &InventoryItem, as_of: DateTime<Utc>) -> Option<WastageItem> {
    if !item.has_usage_history() || item.current_stock <= 0.0 {
        return None;
    }

    let used = usage_last_window(item, as_of);
    let days_of_cover = if used > 0.0 {
        Some(item.current_stock / (used / USAGE_WINDOW_DAYS as f64))
    } else {
        None
    };

    let flagged = match days_of_cover {
        Some(days) => days > WASTAGE_COVER_DAYS,
        None => true,
    };
    flagged.then(|| WastageItem {
        item_id: item.id,
        name: item.name.clone(),
        current_stock: item.current_stock,
        usage_last_30_days: used,
        days_of_cover,
    })
}

/// Builds the inventory report from a stock snapshot.
#[derive(Debug, Clone)]
pub struct InventoryAnalyzer {
    scorer: RestockScorer,
    trend_window_days: i64,
}

impl Default for InventoryAnalyzer {
    fn default() -> Self {
        Self {
            scorer: RestockScorer::default(),
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
        }
    }
}

impl InventoryAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, items: &[InventoryItem], as_of: DateTime<Utc>) -> InventoryReport {
        let wastage_items: Vec<WastageItem> = items.iter().filter_map(|i| wastage(i, as_of)).collect();
        let recommendations = self.recommendations(items, &wastage_items, as_of);

        debug!(
            items = items.len(),
            wastage = wastage_items.len(),
            "inventory report built"
        );

        InventoryReport {
            stats: inventory_stats(items),
            items: items.iter().map(item_status).collect(),
            ai_analysis: UsageAnalysis {
                top_used_items: self.top_used_items(items, as_of),
                usage_trends: self.usage_trends(items, as_of),
                wastage_items,
                recommendations,
            },
        }
    }

    fn top_used_items(&self, items: &[InventoryItem], as_of: DateTime<Utc>) -> Vec<ItemUsage> {
        let mut used: Vec<ItemUsage> = items
            .iter()
            .map(|i| ItemUsage {
                item_id: i.id,
                name: i.name.clone(),
                usage: usage_last_window(i, as_of),
            })
            .filter(|u| u.usage > 0.0)
            .collect();
        used.sort_by(|a, b| b.usage.total_cmp(&a.usage).then_with(|| a.name.cmp(&b.name)));
        used.truncate(DEFAULT_TOP_USED);
        used
    }

    fn usage_trends(&self, items: &[InventoryItem], as_of: DateTime<Utc>) -> UsageTrends {
        let mut trends = UsageTrends::default();
        for item in items {
            match usage_trend(item, as_of, self.trend_window_days) {
                Trend::Increasing => trends.increasing.push(item.name.clone()),
                Trend::Decreasing => trends.decreasing.push(item.name.clone()),
                Trend::Stable | Trend::InsufficientData => {}
            }
            if is_seasonal(item, as_of) {
                trends.seasonal.push(item.name.clone());
            }
        }
        trends
    }

    fn recommendations(&self, items: &[InventoryItem], wastage: &[WastageItem], as_of: DateTime<Utc>) -> Vec<String> {
        let restock = self.scorer.recommend(items, as_of, None).into_iter().map(|r| {
            format!(
                "Restock {}: order {} ({}, score {})",
                r.item_name,
                r.restock_amount,
                r.urgency_level.as_str(),
                r.urgency_score
            )
        });
        let waste = wastage.iter().map(|w| match w.days_of_cover {
            Some(days) => format!("Reduce orders of {}: {days:.0} days of cover on hand", w.name),
            None => format!("Review {}: no usage in the last {USAGE_WINDOW_DAYS} days", w.name),
        });
        restock.chain(waste).collect()
    }
}
