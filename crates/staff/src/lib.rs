//! Staff shift records.

pub mod shift;

pub use shift::{ShiftRecord, ShiftStatus};
