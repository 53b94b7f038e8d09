//! Inventory records (stock levels and usage history).
//!
//! Pure data plus validation; no IO, no storage.

pub mod item;

pub use item::{InventoryItem, InventoryItemId, UsageEvent};
