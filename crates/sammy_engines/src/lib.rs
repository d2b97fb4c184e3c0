#![forbid(unsafe_code)]

pub mod action;
pub mod normalize;
pub mod query_parse;
pub mod slots;
pub mod synonyms;
pub mod update_rules;

pub use query_parse::{
    reason_codes, EngineBuildError, ParseOutcome, QueryParseConfig, QueryParseRuntime,
};
pub use synonyms::{ActionCategory, SynonymTable, SynonymTableError, TermCategory};
