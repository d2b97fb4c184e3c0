#![forbid(unsafe_code)]

use sammy_kernel_contracts::query::OperationType;

use crate::normalize::last_token;
use crate::synonyms::{ActionCategory, SynonymTable, TermCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMatch {
    pub category: ActionCategory,
    /// Byte index of the earliest trigger phrase of this category.
    pub index: usize,
}

pub fn operation_for(category: ActionCategory) -> OperationType {
    match category {
        ActionCategory::Search => OperationType::Search,
        ActionCategory::Update => OperationType::Update,
        ActionCategory::Increment => OperationType::UpdateIncrement,
        ActionCategory::Add => OperationType::Add,
        ActionCategory::Delete => OperationType::Delete,
        ActionCategory::ViewList => OperationType::ViewList,
    }
}

/// Earliest substring hit per action category, sorted by `(index, name)`.
///
/// Information words count as search triggers.
pub fn scan_actions(text: &str, table: &SynonymTable) -> Vec<ActionMatch> {
    let mut out: Vec<ActionMatch> = ActionCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let phrases = table.action(category).iter();
            let index = if category == ActionCategory::Search {
                phrases
                    .chain(table.term(TermCategory::Information))
                    .filter_map(|p| text.find(p.as_str()))
                    .min()
            } else {
                phrases.filter_map(|p| text.find(p.as_str())).min()
            }?;
            Some(ActionMatch { category, index })
        })
        .collect();
    out.sort_by(|a, b| {
        a.index
            .cmp(&b.index)
            .then_with(|| a.category.name().cmp(b.category.name()))
    });
    out
}

/// Resolves exactly one operation from a normalized utterance.
pub fn determine_action(text: &str, table: &SynonymTable) -> Option<OperationType> {
    let matches = scan_actions(text, table);
    let resolved = resolve(text, &matches)?;
    log::debug!(
        "action candidates {:?} resolved to {:?}",
        matches
            .iter()
            .map(|m| (m.category.name(), m.index))
            .collect::<Vec<_>>(),
        resolved
    );
    Some(resolved)
}

fn resolve(text: &str, matches: &[ActionMatch]) -> Option<OperationType> {
    use ActionCategory::*;

    let first = matches.first()?;
    let ends_in_list = last_token(text) == Some("list");
    let list_or_search = if ends_in_list {
        OperationType::ViewList
    } else {
        OperationType::Search
    };

    if let [a, b] = matches {
        if a.index == b.index {
            match (a.category, b.category) {
                (Delete, Search) => return Some(OperationType::Delete),
                (Increment, Update) => return Some(OperationType::Update),
                (Search, ViewList) => return Some(list_or_search),
                _ => {}
            }
        }
    }

    if let [a, b, c, ..] = matches {
        match (a.category, b.category, c.category) {
            (Search, Update, ViewList) => return Some(list_or_search),
            (Delete, Search, ViewList) => {
                let min_index = matches.iter().map(|m| m.index).min().unwrap_or(a.index);
                return Some(if a.index == min_index || text.contains("get rid of") {
                    OperationType::Delete
                } else {
                    OperationType::ViewList
                });
            }
            _ => {}
        }
    }

    Some(operation_for(first.category))
}
