#![forbid(unsafe_code)]

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sammy_kernel_contracts::query::MediaType;

use crate::normalize::{strip_information_suffix, strip_media_type_suffix, strip_quotes_and_spaces};
use crate::synonyms::{ActionCategory, SynonymTable, TermCategory};

static TRAILING_MEDIA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<media>anime|manga)\s*$").expect("trailing media pattern must compile")
});

/// Builds a regex alternation from trigger phrases. Longer phrases come first
/// so "find me some" is preferred over "find".
pub fn alternation<'a, I>(phrases: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut escaped: Vec<String> = phrases.into_iter().map(|p| regex::escape(p)).collect();
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    escaped.dedup();
    escaped.join("|")
}

/// A compiled slot pattern. Patterns are tried in order; the first match wins.
#[derive(Debug, Clone)]
pub(crate) struct SlotPattern {
    pub name: &'static str,
    pub regex: Regex,
}

impl SlotPattern {
    pub fn compile(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
        })
    }
}

pub(crate) fn first_match<'p, 't>(
    patterns: &'p [SlotPattern],
    text: &'t str,
) -> Option<(&'p SlotPattern, Captures<'t>)> {
    patterns
        .iter()
        .find_map(|p| p.regex.captures(text).map(|caps| (p, caps)))
}

pub(crate) fn group<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str())
}

pub(crate) fn media_group(caps: &Captures<'_>, name: &str) -> Option<MediaType> {
    group(caps, name).map(MediaType::from_literal)
}

/// Term plus the media type the utterance named explicitly, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSlot {
    pub term: String,
    pub media_type: Option<MediaType>,
}

#[derive(Debug, Clone)]
pub struct SlotExtractors {
    search: Vec<SlotPattern>,
    add: Vec<SlotPattern>,
    delete: Vec<SlotPattern>,
    view_list: Vec<SlotPattern>,
    table: SynonymTable,
}

impl SlotExtractors {
    pub fn new(table: &SynonymTable) -> Result<Self, regex::Error> {
        let search = alternation(table.action(ActionCategory::Search));
        let info = alternation(table.term(TermCategory::Information));
        let add = alternation(table.action(ActionCategory::Add));
        let delete = alternation(table.action(ActionCategory::Delete));
        let view = alternation(table.action(ActionCategory::ViewList));

        Ok(Self {
            search: vec![
                SlotPattern::compile(
                    "search_info_before_term",
                    &format!(
                        r"^.*?\b(?:{search})\s+(?:(?:for|on|about)\s+(?:the\s+)?)?(?:{info})\s+(?:(?:for|on|about|of|regarding)\s+(?:the\s+)?)?(?P<term>.+)$"
                    ),
                )?,
                SlotPattern::compile(
                    "search_trigger_then_term",
                    &format!(
                        r"^.*?\b(?:{search}|{info})\s+(?:(?:for|on|about)\s+)?(?:the\s+)?(?P<term>.+)$"
                    ),
                )?,
                SlotPattern::compile(
                    "search_loose",
                    &format!(r"^.*?(?:{search})\s+(?P<term>.+)$"),
                )?,
                SlotPattern::compile(
                    "search_term_then_info",
                    &format!(r"^(?:(?:the|some)\s+)?(?P<term>.+?)\s+(?:{info})$"),
                )?,
            ],
            add: list_edit_patterns(
                ["add_typed_list", "add_list", "add_typed", "add_bare"],
                &add,
                r"(?:(?:to|onto|on|into|in)\s+)?(?:my\s+)?",
            )?,
            delete: list_edit_patterns(
                ["delete_typed_list", "delete_list", "delete_typed", "delete_bare"],
                &delete,
                r"(?:off\s+)?(?:(?:from|of|in|on)\s+)?(?:my\s+)?",
            )?,
            view_list: vec![SlotPattern::compile(
                "view_list",
                &format!(
                    r"^.*?\b(?:{view})\b.*?(?:\b(?P<media>anime|manga)\s+)?\blist\b"
                ),
            )?],
            table: table.clone(),
        })
    }

    pub fn search(&self, text: &str) -> Option<TermSlot> {
        let (pattern, caps) = first_match(&self.search, text)?;
        log::debug!("search slot matched by {}", pattern.name);
        let raw = group(&caps, "term")?;
        let term = strip_quotes_and_spaces(strip_information_suffix(raw, &self.table));
        let (term, media_type) = strip_media_type_suffix(term);
        Some(TermSlot {
            term: strip_quotes_and_spaces(term).to_string(),
            media_type,
        })
    }

    pub fn add(&self, text: &str) -> Option<TermSlot> {
        list_edit_slot(&self.add, text)
    }

    pub fn delete(&self, text: &str) -> Option<TermSlot> {
        list_edit_slot(&self.delete, text)
    }

    /// Media type of the requested list. A bare trailing "manga" or "anime"
    /// token selects the type even when "list" is never said.
    pub fn view_list(&self, text: &str) -> Option<MediaType> {
        if let Some((_, caps)) = first_match(&self.view_list, text) {
            if let Some(media) = media_group(&caps, "media") {
                return Some(media);
            }
        }
        TRAILING_MEDIA
            .captures(text)
            .and_then(|caps| media_group(&caps, "media"))
    }
}

/// Shared shape of the add and delete extractors: trigger, term, connector,
/// then the list the entry goes into or comes out of. Words after "list" are
/// ignored; a bare media word only ends the term at the end of the utterance.
fn list_edit_patterns(
    names: [&'static str; 4],
    trigger: &str,
    connector: &str,
) -> Result<Vec<SlotPattern>, regex::Error> {
    Ok(vec![
        SlotPattern::compile(
            names[0],
            &format!(
                r"^.*?\b(?:{trigger})\s+(?P<term>.+?)\s+{connector}(?P<media>anime|manga)\s+list\b.*$"
            ),
        )?,
        SlotPattern::compile(
            names[1],
            &format!(
                r"^.*?\b(?:{trigger})\s+(?P<term>.+?)\s+{connector}list\b.*$"
            ),
        )?,
        SlotPattern::compile(
            names[2],
            &format!(
                r"^.*?\b(?:{trigger})\s+(?P<term>.+?)\s+{connector}(?P<media>anime|manga)\s*$"
            ),
        )?,
        SlotPattern::compile(
            names[3],
            &format!(r"^.*?\b(?:{trigger})\s+(?P<term>.+?)\s*$"),
        )?,
    ])
}

fn list_edit_slot(patterns: &[SlotPattern], text: &str) -> Option<TermSlot> {
    let (pattern, caps) = first_match(patterns, text)?;
    log::debug!("list edit slot matched by {}", pattern.name);
    let term = strip_quotes_and_spaces(group(&caps, "term")?);
    Some(TermSlot {
        term: term.to_string(),
        media_type: media_group(&caps, "media"),
    })
}
