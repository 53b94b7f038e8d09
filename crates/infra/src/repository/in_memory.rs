use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use bistro_core::DateRange;
use bistro_inventory::InventoryItem;
use bistro_menu::MenuItem;
use bistro_sales::{StatusFilter, TransactionRecord};
use bistro_staff::ShiftRecord;

use super::r#trait::{AnalyticsRepository, RepositoryError};

/// A full snapshot of the records analytics consume.
///
/// Also the on-disk format of the CLI dataset file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsDataset {
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub shifts: Vec<ShiftRecord>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
}

impl AnalyticsDataset {
    /// Check every inventory item's invariants.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        for item in &self.inventory {
            item.validate()
                .map_err(|e| RepositoryError::Malformed(e.to_string()))?;
        }
        Ok(())
    }
}

/// In-memory repository for tests/dev and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryAnalyticsRepository {
    inner: RwLock<AnalyticsDataset>,
}

impl InMemoryAnalyticsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a validated dataset.
    pub fn from_dataset(dataset: AnalyticsDataset) -> Result<Self, RepositoryError> {
        dataset.validate()?;
        Ok(Self {
            inner: RwLock::new(dataset),
        })
    }

    pub fn insert_transaction(&self, transaction: TransactionRecord) -> Result<(), RepositoryError> {
        self.write(|data| data.transactions.push(transaction))
    }

    /// Insert or replace an inventory item (matched by id). The item must
    /// pass the same validation as a loaded dataset.
    pub fn upsert_inventory_item(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        item.validate()
            .map_err(|e| RepositoryError::Malformed(e.to_string()))?;
        self.write(|data| match data.inventory.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => data.inventory.push(item),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&AnalyticsDataset) -> T) -> Result<T, RepositoryError> {
        let data = self.inner.read().map_err(|_| poisoned())?;
        Ok(f(&data))
    }

    fn write(&self, f: impl FnOnce(&mut AnalyticsDataset)) -> Result<(), RepositoryError> {
        let mut data = self.inner.write().map_err(|_| poisoned())?;
        f(&mut data);
        Ok(())
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("in-memory dataset lock poisoned".to_string())
}

impl AnalyticsRepository for InMemoryAnalyticsRepository {
    fn query_transactions(
        &self,
        range: DateRange,
        status_filter: &StatusFilter,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        self.read(|data| {
            let mut out: Vec<TransactionRecord> = data
                .transactions
                .iter()
                .filter(|t| range.contains(t.timestamp) && status_filter.matches(t.status))
                .cloned()
                .collect();
            out.sort_by_key(|t| (t.timestamp, t.id));
            out
        })
    }

    fn query_inventory(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        self.read(|data| data.inventory.clone())
    }

    fn query_shifts(&self, range: DateRange) -> Result<Vec<ShiftRecord>, RepositoryError> {
        self.read(|data| {
            data.shifts
                .iter()
                .filter(|s| range.contains(s.start_time))
                .cloned()
                .collect()
        })
    }

    fn query_menu_items(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        self.read(|data| data.menu_items.clone())
    }
}
