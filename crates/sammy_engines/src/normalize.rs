#![forbid(unsafe_code)]

use sammy_kernel_contracts::query::MediaType;

use crate::synonyms::{SynonymTable, TermCategory};

/// Lowercases and strips trailing punctuation, Unicode included. Internal
/// punctuation and whitespace are left alone.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .trim_end_matches(|c: char| !c.is_alphanumeric() && !c.is_whitespace())
        .to_string()
}

/// Removes trailing "information" words ("naruto info" -> "naruto").
///
/// Strips every trailing information word, so a second pass is a no-op.
pub fn strip_information_suffix<'a>(term: &'a str, table: &SynonymTable) -> &'a str {
    let mut out = term;
    while let Some((head, last)) = split_last_token(out) {
        if !table.term_contains(TermCategory::Information, last) {
            break;
        }
        out = head;
    }
    out
}

/// Removes a trailing literal "anime"/"manga" token and reports which one it was.
pub fn strip_media_type_suffix(term: &str) -> (&str, Option<MediaType>) {
    match split_last_token(term) {
        Some((head, last @ ("anime" | "manga"))) => (head, Some(MediaType::from_literal(last))),
        _ => (term, None),
    }
}

pub fn strip_quotes_and_spaces(term: &str) -> &str {
    term.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
}

/// Splits off the last whitespace-delimited token; the head is right-trimmed.
fn split_last_token(s: &str) -> Option<(&str, &str)> {
    let trimmed = s.trim_end();
    let last = trimmed.split_whitespace().next_back()?;
    let head = trimmed[..trimmed.len() - last.len()].trim_end();
    Some((head, last))
}

pub fn last_token(s: &str) -> Option<&str> {
    s.split_whitespace().next_back()
}
