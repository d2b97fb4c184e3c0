#![forbid(unsafe_code)]

pub mod dispatch;
pub mod entry_match;
pub mod memory_service;

pub use dispatch::{
    DispatchOutcome, ListDispatch, ListDispatchConfig, ListService, QueryEngine,
};
pub use entry_match::match_entries;
pub use memory_service::MemoryListService;
