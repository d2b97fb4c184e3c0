#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Coarse intent buckets scanned by the action disambiguator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Add,
    Delete,
    Increment,
    Search,
    Update,
    ViewList,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 6] = [
        ActionCategory::Add,
        ActionCategory::Delete,
        ActionCategory::Increment,
        ActionCategory::Search,
        ActionCategory::Update,
        ActionCategory::ViewList,
    ];

    /// Category name; ties on match position are broken on this string.
    pub fn name(self) -> &'static str {
        match self {
            ActionCategory::Add => "add",
            ActionCategory::Delete => "delete",
            ActionCategory::Increment => "increment",
            ActionCategory::Search => "search",
            ActionCategory::Update => "update",
            ActionCategory::ViewList => "view_list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    Information,
    Score,
    Status,
    Watching,
    Reading,
    OnHold,
    Completed,
    Dropped,
    PlanToWatch,
    PlanToRead,
    Plan,
    Episode,
    Chapter,
    Volume,
    Hello,
    ThankYou,
    Exit,
}

impl TermCategory {
    pub const ALL: [TermCategory; 17] = [
        TermCategory::Information,
        TermCategory::Score,
        TermCategory::Status,
        TermCategory::Watching,
        TermCategory::Reading,
        TermCategory::OnHold,
        TermCategory::Completed,
        TermCategory::Dropped,
        TermCategory::PlanToWatch,
        TermCategory::PlanToRead,
        TermCategory::Plan,
        TermCategory::Episode,
        TermCategory::Chapter,
        TermCategory::Volume,
        TermCategory::Hello,
        TermCategory::ThankYou,
        TermCategory::Exit,
    ];

    /// Term categories naming a concrete list status.
    pub const STATUS_VALUES: [TermCategory; 8] = [
        TermCategory::Watching,
        TermCategory::Reading,
        TermCategory::OnHold,
        TermCategory::Completed,
        TermCategory::Dropped,
        TermCategory::PlanToWatch,
        TermCategory::PlanToRead,
        TermCategory::Plan,
    ];
}

#[derive(Debug, thiserror::Error)]
pub enum SynonymTableError {
    #[error("failed to read synonym table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse synonym table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("synonym table is missing category {0}")]
    MissingCategory(&'static str),
    #[error("synonym table category {category} has an invalid phrase {phrase:?}: {reason}")]
    InvalidPhrase {
        category: String,
        phrase: String,
        reason: &'static str,
    },
}

/// Immutable trigger-phrase dictionary.
///
/// Phrases may repeat across categories; the disambiguator resolves the overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynonymTable {
    actions: BTreeMap<ActionCategory, Vec<String>>,
    terms: BTreeMap<TermCategory, Vec<String>>,
}

impl SynonymTable {
    pub fn builtin() -> Self {
        let actions = [
            (
                ActionCategory::Search,
                &[
                    "search",
                    "find me some",
                    "find some",
                    "find me",
                    "find",
                    "look up",
                    "look for",
                    "look",
                    "get me some",
                    "get some",
                    "get me",
                    "get",
                    "obtain",
                    "give me some",
                    "give some",
                    "give me",
                    "send me",
                    "send",
                    "show me",
                    "tell me about",
                ][..],
            ),
            (
                ActionCategory::Update,
                &["update", "change", "amend", "give", "rate", "set", "mark"][..],
            ),
            (
                ActionCategory::Increment,
                &["increment", "increase", "bump", "update"][..],
            ),
            (ActionCategory::Add, &["add", "append", "put", "insert"][..]),
            (
                ActionCategory::Delete,
                &["delete", "remove", "eliminate", "get rid of", "take", "erase"][..],
            ),
            (
                ActionCategory::ViewList,
                &[
                    "get me",
                    "get",
                    "give me",
                    "give",
                    "show me",
                    "show",
                    "look at",
                    "look",
                    "what's on",
                    "whats on",
                    "see",
                    "view",
                    "display",
                ][..],
            ),
        ];
        let terms = [
            (
                TermCategory::Information,
                &["information", "info", "data", "details", "deets"][..],
            ),
            (TermCategory::Score, &["score", "rating", "rate"][..]),
            (TermCategory::Status, &["status", "state"][..]),
            (
                TermCategory::Watching,
                &["currently watching", "watching"][..],
            ),
            (TermCategory::Reading, &["currently reading", "reading"][..]),
            (
                TermCategory::OnHold,
                &["on hold", "on-hold", "onhold", "paused"][..],
            ),
            (
                TermCategory::Completed,
                &["completed", "complete", "finished", "done"][..],
            ),
            (TermCategory::Dropped, &["dropped", "abandoned"][..]),
            (
                TermCategory::PlanToWatch,
                &["plan to watch", "planning to watch", "want to watch"][..],
            ),
            (
                TermCategory::PlanToRead,
                &["plan to read", "planning to read", "want to read"][..],
            ),
            (TermCategory::Plan, &["planned", "planning", "plan"][..]),
            (TermCategory::Episode, &["episodes", "episode", "eps", "ep"][..]),
            (TermCategory::Chapter, &["chapters", "chapter", "ch"][..]),
            (TermCategory::Volume, &["volumes", "volume", "vols", "vol"][..]),
            (TermCategory::Hello, &["hello", "hi", "hey", "greetings"][..]),
            (
                TermCategory::ThankYou,
                &["thank you", "thanks", "thx", "cheers", "ty"][..],
            ),
            (
                TermCategory::Exit,
                &["exit", "quit", "leave", "bye", "goodbye"][..],
            ),
        ];

        Self {
            actions: actions
                .into_iter()
                .map(|(k, v)| (k, v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            terms: terms
                .into_iter()
                .map(|(k, v)| (k, v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SynonymTableError> {
        let table: SynonymTable = serde_json::from_str(raw)?;
        table.check()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, SynonymTableError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, SynonymTableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn action(&self, category: ActionCategory) -> &[String] {
        self.actions.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn term(&self, category: TermCategory) -> &[String] {
        self.terms.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn term_contains(&self, category: TermCategory, phrase: &str) -> bool {
        self.term(category).iter().any(|p| p == phrase)
    }

    fn check(&self) -> Result<(), SynonymTableError> {
        for category in ActionCategory::ALL {
            let phrases = self
                .actions
                .get(&category)
                .ok_or(SynonymTableError::MissingCategory(category.name()))?;
            check_phrases(category.name(), phrases)?;
        }
        for category in TermCategory::ALL {
            let phrases = self
                .terms
                .get(&category)
                .ok_or(SynonymTableError::MissingCategory(term_name(category)))?;
            check_phrases(term_name(category), phrases)?;
        }
        Ok(())
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn term_name(category: TermCategory) -> &'static str {
    match category {
        TermCategory::Information => "information",
        TermCategory::Score => "score",
        TermCategory::Status => "status",
        TermCategory::Watching => "watching",
        TermCategory::Reading => "reading",
        TermCategory::OnHold => "on_hold",
        TermCategory::Completed => "completed",
        TermCategory::Dropped => "dropped",
        TermCategory::PlanToWatch => "plan_to_watch",
        TermCategory::PlanToRead => "plan_to_read",
        TermCategory::Plan => "plan",
        TermCategory::Episode => "episode",
        TermCategory::Chapter => "chapter",
        TermCategory::Volume => "volume",
        TermCategory::Hello => "hello",
        TermCategory::ThankYou => "thank_you",
        TermCategory::Exit => "exit",
    }
}

fn check_phrases(category: &str, phrases: &[String]) -> Result<(), SynonymTableError> {
    let invalid = |phrase: &String, reason| SynonymTableError::InvalidPhrase {
        category: category.to_string(),
        phrase: phrase.clone(),
        reason,
    };
    if phrases.is_empty() {
        return Err(SynonymTableError::InvalidPhrase {
            category: category.to_string(),
            phrase: String::new(),
            reason: "category must list at least one phrase",
        });
    }
    for phrase in phrases {
        if phrase.trim().is_empty() {
            return Err(invalid(phrase, "must not be empty"));
        }
        if phrase.trim() != phrase {
            return Err(invalid(phrase, "must not carry surrounding whitespace"));
        }
        if phrase.to_lowercase() != *phrase {
            return Err(invalid(phrase, "must be lowercase"));
        }
    }
    Ok(())
}
