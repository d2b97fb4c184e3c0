#![forbid(unsafe_code)]

pub mod common;
pub mod list;
pub mod query;

pub use common::{ContractViolation, ReasonCodeId, SchemaVersion, Validate};
