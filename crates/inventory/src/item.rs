use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{Cents, DomainError, RecordId};

/// Inventory item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(pub RecordId);

impl InventoryItemId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Stock consumed at a point in time (kitchen usage, not sales).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub date: DateTime<Utc>,
    pub amount: f64,
}

impl UsageEvent {
    pub fn new(date: DateTime<Utc>, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Inventory item snapshot with its embedded usage history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    pub category: String,
    pub current_stock: f64,
    pub min_level: f64,
    /// Price per stock unit in smallest currency unit (e.g., cents).
    pub unit_price: Cents,
    /// Chronologically ordered usage events.
    #[serde(default)]
    pub usage_history: Vec<UsageEvent>,
}

impl InventoryItem {
    pub fn new(
        id: InventoryItemId,
        name: impl Into<String>,
        category: impl Into<String>,
        current_stock: f64,
        min_level: f64,
        unit_price: Cents,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            current_stock,
            min_level,
            unit_price,
            usage_history: Vec::new(),
        }
    }

    pub fn with_usage(mut self, usage_history: Vec<UsageEvent>) -> Self {
        self.usage_history = usage_history;
        self
    }

    /// Check the record invariants: non-negative stock, positive minimum
    /// level, non-negative chronologically ordered usage.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation(format!("item {} has an empty name", self.id)));
        }
        if !(self.current_stock.is_finite() && self.current_stock >= 0.0) {
            return Err(DomainError::validation(format!(
                "item '{}' has invalid current stock {}",
                self.name, self.current_stock
            )));
        }
        if !(self.min_level.is_finite() && self.min_level > 0.0) {
            return Err(DomainError::validation(format!(
                "item '{}' must have a positive minimum level (got {})",
                self.name, self.min_level
            )));
        }
        if let Some(bad) = self
            .usage_history
            .iter()
            .find(|e| !(e.amount.is_finite() && e.amount >= 0.0))
        {
            return Err(DomainError::validation(format!(
                "item '{}' has invalid usage amount {} at {}",
                self.name, bad.amount, bad.date
            )));
        }
        if self.usage_history.windows(2).any(|w| w[1].date < w[0].date) {
            return Err(DomainError::validation(format!(
                "item '{}' usage history is not in chronological order",
                self.name
            )));
        }
        Ok(())
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.current_stock <= 0.0
    }

    pub fn is_low_stock(&self) -> bool {
        self.current_stock < self.min_level
    }

    /// Stock value = current stock × unit price, in smallest currency unit.
    pub fn stock_value(&self) -> Cents {
        Cents((self.current_stock.max(0.0) * self.unit_price.get() as f64).round() as u64)
    }

    /// Total usage with `from < date <= to`.
    pub fn usage_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        self.usage_history
            .iter()
            .filter(|e| e.date > from && e.date <= to)
            .map(|e| e.amount)
            .sum()
    }

    pub fn first_usage_at(&self) -> Option<DateTime<Utc>> {
        self.usage_history.iter().map(|e| e.date).min()
    }

    pub fn has_usage_history(&self) -> bool {
        !self.usage_history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_item_id() -> InventoryItemId {
        InventoryItemId::new(RecordId::from_u128(3))
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap()
    }

    fn test_item() -> InventoryItem {
        InventoryItem::new(test_item_id(), "Mozzarella", "Dairy", 12.0, 10.0, Cents(650))
    }

    #[test]
    fn valid_item_passes_validation() {
        let item = test_item().with_usage(vec![
            UsageEvent::new(test_time() - Duration::days(2), 1.5),
            UsageEvent::new(test_time(), 2.0),
        ]);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_min_level() {
        let mut item = test_item();
        item.min_level = 0.0;
        let err = item.validate().unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("minimum level") => {}
            _ => panic!("Expected Validation error for min level"),
        }
    }

    #[test]
    fn rejects_negative_stock() {
        let mut item = test_item();
        item.current_stock = -1.0;
        assert!(matches!(item.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_unordered_usage_history() {
        let item = test_item().with_usage(vec![
            UsageEvent::new(test_time(), 1.0),
            UsageEvent::new(test_time() - Duration::days(1), 1.0),
        ]);
        let err = item.validate().unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("chronological") => {}
            _ => panic!("Expected Validation error for ordering"),
        }
    }

    #[test]
    fn usage_between_is_left_open_right_closed() {
        let t = test_time();
        let item = test_item().with_usage(vec![
            UsageEvent::new(t - Duration::days(7), 5.0),
            UsageEvent::new(t - Duration::days(3), 2.0),
            UsageEvent::new(t, 1.0),
        ]);
        assert_eq!(item.usage_between(t - Duration::days(7), t), 3.0);
    }

    #[test]
    fn stock_value_multiplies_stock_by_unit_price() {
        assert_eq!(test_item().stock_value(), Cents(12 * 650));
    }

    #[test]
    fn usage_history_defaults_to_empty() {
        let json = serde_json::json!({
            "id": RecordId::from_u128(3).to_string(),
            "name": "Basil",
            "category": "Produce",
            "currentStock": 1.0,
            "minLevel": 2.0,
            "unitPrice": 120
        });
        let item: InventoryItem = serde_json::from_value(json).unwrap();
        assert!(!item.has_usage_history());
        assert!(item.is_low_stock());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: usage over a window never exceeds the total recorded usage.
            #[test]
            fn window_usage_is_bounded_by_total(
                amounts in prop::collection::vec(0.0f64..100.0, 0..30),
                window in 0i64..40
            ) {
                let t = test_time();
                let history: Vec<UsageEvent> = amounts
                    .iter()
                    .enumerate()
                    .map(|(i, a)| UsageEvent::new(t - Duration::days((amounts.len() - i) as i64), *a))
                    .collect();
                let total: f64 = amounts.iter().sum();
                let item = test_item().with_usage(history);
                let windowed = item.usage_between(t - Duration::days(window), t);
                prop_assert!(windowed <= total + 1e-9);
                prop_assert!(item.validate().is_ok());
            }
        }
    }
}
