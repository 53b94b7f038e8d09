//! Record-store boundary for the analytics engine.
//!
//! The relational store behind the restaurant screens is an external
//! collaborator; this module only defines what analytics read from it.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{AnalyticsDataset, InMemoryAnalyticsRepository};
pub use r#trait::{AnalyticsRepository, RepositoryError};
