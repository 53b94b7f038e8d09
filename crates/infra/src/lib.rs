//! Infrastructure layer: record-store boundary, bounded fetches, config,
//! report service and the background restock runner.

pub mod config;
pub mod fetch;
pub mod repository;
pub mod runner;
pub mod service;


pub use config::AnalyticsConfig;
pub use fetch::{bounded_fetch, CancellationFlag, FetchError};
pub use repository::{AnalyticsDataset, AnalyticsRepository, InMemoryAnalyticsRepository, RepositoryError};
pub use runner::{InMemoryRestockOrderSink, RestockOrderSink, RestockRunner, RestockRunnerHandle, RetryPolicy};
pub use service::AnalyticsService;
