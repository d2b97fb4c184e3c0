#![forbid(unsafe_code)]

use once_cell::sync::Lazy;
use regex::Regex;
use sammy_kernel_contracts::query::{Extra, OperationType, ParsedQuery};
use sammy_kernel_contracts::{ReasonCodeId, Validate};

use crate::action::determine_action;
use crate::normalize::normalize;
use crate::slots::{alternation, SlotExtractors, TermSlot};
use crate::synonyms::{SynonymTable, TermCategory};
use crate::update_rules::UpdateCascade;

pub mod reason_codes {
    use sammy_kernel_contracts::ReasonCodeId;

    // Query-parse reason-code namespace.
    pub const Q_TASK_OK: ReasonCodeId = ReasonCodeId(0x5100_0001);
    pub const Q_EXIT: ReasonCodeId = ReasonCodeId(0x5100_0002);
    pub const Q_GREETING_ONLY: ReasonCodeId = ReasonCodeId(0x5100_0003);
    pub const Q_THANKS_ONLY: ReasonCodeId = ReasonCodeId(0x5100_0004);
    pub const Q_NO_ACTION: ReasonCodeId = ReasonCodeId(0x5100_0010);
    pub const Q_TOO_LONG: ReasonCodeId = ReasonCodeId(0x5100_0011);
    pub const Q_MISSING_TERM: ReasonCodeId = ReasonCodeId(0x5100_0012);
    pub const Q_VALUE_DROPPED: ReasonCodeId = ReasonCodeId(0x5100_0013);
    pub const Q_CONTRACT_REJECTED: ReasonCodeId = ReasonCodeId(0x5100_0014);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParseConfig {
    pub max_query_chars: usize,
}

impl QueryParseConfig {
    pub fn mvp_v1() -> Self {
        Self {
            max_query_chars: 2048,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineBuildError {
    #[error("max_query_chars must be > 0")]
    EmptyBudget,
    #[error("synonym phrases produced an invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A parsed query plus the reason code explaining how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub query: ParsedQuery,
    pub reason_code: ReasonCodeId,
}

impl ParseOutcome {
    fn new(query: ParsedQuery, reason_code: ReasonCodeId) -> Self {
        Self { query, reason_code }
    }
}

#[derive(Debug)]
pub struct QueryParseRuntime {
    config: QueryParseConfig,
    table: SynonymTable,
    hello: Regex,
    thanks: Regex,
    slots: SlotExtractors,
    cascade: UpdateCascade,
}

static BUILTIN_RUNTIME: Lazy<QueryParseRuntime> = Lazy::new(|| {
    QueryParseRuntime::new(QueryParseConfig::mvp_v1(), SynonymTable::builtin())
        .expect("built-in synonym table must compile")
});

impl QueryParseRuntime {
    /// Compiles every slot pattern from `table`. Nothing is compiled per query.
    pub fn new(config: QueryParseConfig, table: SynonymTable) -> Result<Self, EngineBuildError> {
        if config.max_query_chars == 0 {
            return Err(EngineBuildError::EmptyBudget);
        }
        let hello = alternation(table.term(TermCategory::Hello));
        let thanks = alternation(table.term(TermCategory::ThankYou));
        Ok(Self {
            config,
            hello: Regex::new(&format!(r"^\s*(?:{hello})\b"))?,
            thanks: Regex::new(&format!(r"\b(?:{thanks})\b"))?,
            slots: SlotExtractors::new(&table)?,
            cascade: UpdateCascade::new(&table)?,
            table,
        })
    }

    /// Shared runtime over the built-in synonym table.
    pub fn builtin() -> &'static QueryParseRuntime {
        &BUILTIN_RUNTIME
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    pub fn process(&self, query: &str) -> ParsedQuery {
        self.process_traced(query).query
    }

    pub fn process_traced(&self, query: &str) -> ParseOutcome {
        let chars = query.chars().count();
        if chars > self.config.max_query_chars {
            log::warn!(
                "query of {chars} chars exceeds budget of {}",
                self.config.max_query_chars
            );
            return ParseOutcome::new(ParsedQuery::unrecognized(), reason_codes::Q_TOO_LONG);
        }

        let text = normalize(query);
        if self.table.term_contains(TermCategory::Exit, text.trim()) {
            return ParseOutcome::new(ParsedQuery::exit(), reason_codes::Q_EXIT);
        }

        let mut out = ParsedQuery {
            extra: self.detect_extra(&text),
            ..ParsedQuery::unrecognized()
        };

        let Some(operation) = determine_action(&text, &self.table) else {
            let reason_code = match out.extra {
                Some(Extra::Greeting) => reason_codes::Q_GREETING_ONLY,
                Some(Extra::Thanks) => reason_codes::Q_THANKS_ONLY,
                _ => reason_codes::Q_NO_ACTION,
            };
            log::debug!("no action in {text:?}");
            return ParseOutcome::new(out, reason_code);
        };
        out.operation = Some(operation);

        match operation {
            OperationType::Search => fill_term(&mut out, self.slots.search(&text)),
            OperationType::Add => fill_term(&mut out, self.slots.add(&text)),
            OperationType::Delete => fill_term(&mut out, self.slots.delete(&text)),
            OperationType::ViewList => {
                if let Some(media_type) = self.slots.view_list(&text) {
                    out.media_type = media_type;
                }
            }
            OperationType::Update | OperationType::UpdateIncrement => {
                self.cascade.run(&text, &mut out);
            }
        }

        let dropped = out.drop_out_of_range_value();
        if let Err(violation) = out.validate() {
            log::warn!("parsed query for {text:?} rejected: {violation}");
            return ParseOutcome::new(
                ParsedQuery::unrecognized(),
                reason_codes::Q_CONTRACT_REJECTED,
            );
        }

        let reason_code = if dropped {
            reason_codes::Q_VALUE_DROPPED
        } else if out.term.is_empty() && out.operation != Some(OperationType::ViewList) {
            reason_codes::Q_MISSING_TERM
        } else {
            reason_codes::Q_TASK_OK
        };
        log::debug!("parsed {text:?} as {out:?}");
        ParseOutcome::new(out, reason_code)
    }

    fn detect_extra(&self, text: &str) -> Option<Extra> {
        if self.hello.is_match(text) {
            Some(Extra::Greeting)
        } else if self.thanks.is_match(text) {
            Some(Extra::Thanks)
        } else {
            None
        }
    }
}

fn fill_term(out: &mut ParsedQuery, slot: Option<TermSlot>) {
    if let Some(slot) = slot {
        out.term = slot.term;
        if let Some(media_type) = slot.media_type {
            out.media_type = media_type;
        }
    }
}
