use std::sync::Arc;

use thiserror::Error;

use bistro_core::DateRange;
use bistro_inventory::InventoryItem;
use bistro_menu::MenuItem;
use bistro_sales::{StatusFilter, TransactionRecord};
use bistro_staff::ShiftRecord;

/// Repository operation error.
///
/// These are **infrastructure errors** (the record store could not answer)
/// as opposed to domain errors (a record violates its invariants).
///
/// ## Error Categories
///
/// - **Timeout**: the store did not answer in time
/// - **Unavailable**: the store could not be reached or refused the query
/// - **Malformed**: the store answered with records that fail validation
/// - **Cancelled**: the caller gave up waiting and the query was abandoned
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository timed out: {0}")]
    Timeout(String),

    #[error("repository unavailable: {0}")]
    Unavailable(String),

    #[error("malformed records: {0}")]
    Malformed(String),

    #[error("query cancelled")]
    Cancelled,
}

/// Read-only source of the raw records analytics run over.
///
/// Implementations return owned snapshots; the analytics engine never holds
/// a reference into the store.
pub trait AnalyticsRepository: Send + Sync {
    /// Transactions with `range.from <= timestamp < range.to` whose status
    /// passes `status_filter`.
    fn query_transactions(
        &self,
        range: DateRange,
        status_filter: &StatusFilter,
    ) -> Result<Vec<TransactionRecord>, RepositoryError>;

    /// Current inventory with usage histories.
    fn query_inventory(&self) -> Result<Vec<InventoryItem>, RepositoryError>;

    /// Shifts whose start time falls in `range`.
    fn query_shifts(&self, range: DateRange) -> Result<Vec<ShiftRecord>, RepositoryError>;

    fn query_menu_items(&self) -> Result<Vec<MenuItem>, RepositoryError>;
}

impl<R> AnalyticsRepository for Arc<R>
where
    R: AnalyticsRepository + ?Sized,
{
    fn query_transactions(
        &self,
        range: DateRange,
        status_filter: &StatusFilter,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        (**self).query_transactions(range, status_filter)
    }

    fn query_inventory(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        (**self).query_inventory()
    }

    fn query_shifts(&self, range: DateRange) -> Result<Vec<ShiftRecord>, RepositoryError> {
        (**self).query_shifts(range)
    }

    fn query_menu_items(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        (**self).query_menu_items()
    }
}
