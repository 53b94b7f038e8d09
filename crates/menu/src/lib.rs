//! Menu catalog records.
//!
//! Read-only inputs for the analytics engine: menu items with their category
//! and per-portion production cost.

pub mod item;

pub use item::{MenuItem, MenuItemId, RecipeLine, DRINKS_CATEGORY};
