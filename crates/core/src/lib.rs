//! `bistro-core`: shared building blocks for the restaurant analytics workspace.
//!
//! This crate contains **pure** primitives (no infrastructure concerns):
//! identifiers, the domain error model, money and date ranges.

pub mod error;
pub mod id;
pub mod money;
pub mod range;

pub use error::{DomainError, DomainResult};
pub use id::{RecordId, StaffId};
pub use money::Cents;
pub use range::DateRange;
