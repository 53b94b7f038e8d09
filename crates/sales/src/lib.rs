//! Sales transaction records.
//!
//! Transactions are produced by the order subsystem and are read-only here:
//! the analytics engine only consumes their settled output.

pub mod transaction;

pub use transaction::{LineItem, StatusFilter, TransactionId, TransactionRecord, TransactionStatus};
