#![forbid(unsafe_code)]

use std::fmt;

use regex::Captures;
use sammy_kernel_contracts::query::{
    MediaType, Modifier, OperationType, ParsedQuery, QueryValue, StatusType,
};

use crate::normalize::{strip_media_type_suffix, strip_quotes_and_spaces};
use crate::slots::{alternation, first_match, group, media_group, SlotPattern};
use crate::synonyms::{ActionCategory, SynonymTable, TermCategory};

/// One rule of the update cascade.
///
/// Every rule sees the full utterance. A rule that fires overwrites the
/// operation, term, media type, modifier and value it determines, so a later
/// rule wins over an earlier one.
pub trait UpdateRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, text: &str, out: &mut ParsedQuery) -> bool;
}

/// Ordered rule list: increment, count, score, status.
pub struct UpdateCascade {
    rules: Vec<Box<dyn UpdateRule>>,
}

impl fmt::Debug for UpdateCascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl UpdateCascade {
    pub fn new(table: &SynonymTable) -> Result<Self, regex::Error> {
        let vocab = Vocabulary::new(table);
        Ok(Self {
            rules: vec![
                Box::new(IncrementRule::new(&vocab)?),
                Box::new(CountRule::new(&vocab)?),
                Box::new(ScoreRule::new(&vocab)?),
                Box::new(StatusRule::new(&vocab)?),
            ],
        })
    }

    /// Runs every rule in order and returns the names of those that fired.
    pub fn run(&self, text: &str, out: &mut ParsedQuery) -> Vec<&'static str> {
        let fired: Vec<&'static str> = self
            .rules
            .iter()
            .filter_map(|rule| rule.apply(text, out).then(|| rule.name()))
            .collect();
        log::debug!("update cascade fired {fired:?}");
        fired
    }
}

/// Alternations shared by the update rules.
struct Vocabulary {
    table: SynonymTable,
    update: String,
    increment: String,
    update_or_increment: String,
    /// Verbs that are also score words ("rate").
    rate: Option<String>,
    fields: String,
    score: String,
    status_words: String,
    status_values: String,
}

impl Vocabulary {
    fn new(table: &SynonymTable) -> Self {
        let update = table.action(ActionCategory::Update);
        let increment = table.action(ActionCategory::Increment);
        let score = table.term(TermCategory::Score);
        let rate: Vec<&String> = update.iter().filter(|p| score.contains(*p)).collect();
        Self {
            table: table.clone(),
            update: alternation(update),
            increment: alternation(increment),
            update_or_increment: alternation(update.iter().chain(increment)),
            rate: (!rate.is_empty()).then(|| alternation(rate)),
            fields: alternation(
                [
                    TermCategory::Episode,
                    TermCategory::Chapter,
                    TermCategory::Volume,
                ]
                .into_iter()
                .flat_map(|c| table.term(c)),
            ),
            score: alternation(score),
            status_words: alternation(table.term(TermCategory::Status)),
            status_values: alternation(
                TermCategory::STATUS_VALUES
                    .into_iter()
                    .flat_map(|c| table.term(c)),
            ),
        }
    }
}

/// Maps a captured field word to its count modifier.
fn field_modifier(table: &SynonymTable, word: &str) -> Modifier {
    if table.term_contains(TermCategory::Chapter, word) {
        Modifier::Chapter
    } else if table.term_contains(TermCategory::Volume, word) {
        Modifier::Volume
    } else {
        Modifier::Episode
    }
}

fn status_category(table: &SynonymTable, phrase: &str) -> Option<TermCategory> {
    TermCategory::STATUS_VALUES
        .into_iter()
        .find(|c| table.term_contains(*c, phrase))
}

const SCORE_TAIL: &str = r"(?P<value>[0-9]+)(?:\s*(?:/|out of)\s*10)?\s*$";

/// Term with quotes stripped and a trailing media word split off.
fn clean_term(raw: &str) -> (String, Option<MediaType>) {
    let (term, media) = strip_media_type_suffix(strip_quotes_and_spaces(raw));
    (strip_quotes_and_spaces(term).to_string(), media)
}

/// MANGA when any of the named type slots says so.
fn slot_media(caps: &Captures<'_>, names: &[&str], extra: Option<MediaType>) -> MediaType {
    let manga = names
        .iter()
        .filter_map(|n| media_group(caps, n))
        .chain(extra)
        .any(|m| m == MediaType::Manga);
    if manga {
        MediaType::Manga
    } else {
        MediaType::Anime
    }
}

fn count_modifier(field: Option<Modifier>, media: Option<MediaType>) -> Modifier {
    match (field, media) {
        (Some(m), _) => m,
        (None, Some(MediaType::Manga)) => Modifier::Chapter,
        (None, _) => Modifier::Episode,
    }
}

fn overwrite(
    out: &mut ParsedQuery,
    operation: OperationType,
    term: String,
    media_type: MediaType,
    modifier: Modifier,
    value: Option<QueryValue>,
) {
    out.operation = Some(operation);
    out.term = term;
    out.media_type = media_type;
    out.modifier = Some(modifier);
    out.value = value;
}

struct IncrementRule {
    pattern: SlotPattern,
    table: SynonymTable,
}

impl IncrementRule {
    fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        let inc = &vocab.increment;
        let f = &vocab.fields;
        Ok(Self {
            pattern: SlotPattern::compile(
                "increment",
                &format!(
                    r"^.*?\b(?:{inc})\s+(?:(?:the|my)\s+)?(?:(?P<field>{f})\s+)?(?:(?:count|number|progress)\s+)?(?:(?:of|for|on|in)\s+)?(?:the\s+)?(?P<term>.+?)(?:\s+(?P<post_field>{f})(?:\s+(?:count|number|progress))?)?(?:\s+(?P<media>anime|manga))?\s*$"
                ),
            )?,
            table: vocab.table.clone(),
        })
    }
}

impl UpdateRule for IncrementRule {
    fn name(&self) -> &'static str {
        "increment"
    }

    fn apply(&self, text: &str, out: &mut ParsedQuery) -> bool {
        let Some(caps) = self.pattern.regex.captures(text) else {
            return false;
        };
        let Some(raw) = group(&caps, "term") else {
            return false;
        };
        let (term, suffix_media) = clean_term(raw);
        let field = group(&caps, "field")
            .or_else(|| group(&caps, "post_field"))
            .map(|w| field_modifier(&self.table, w));
        let modifier = count_modifier(field, media_group(&caps, "media").or(suffix_media));
        let media_type = modifier.implied_media_type().unwrap_or_default();
        overwrite(
            out,
            OperationType::UpdateIncrement,
            term,
            media_type,
            modifier,
            None,
        );
        true
    }
}

struct CountRule {
    patterns: Vec<SlotPattern>,
    table: SynonymTable,
}

impl CountRule {
    fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        let ui = &vocab.update_or_increment;
        let f = &vocab.fields;
        Ok(Self {
            patterns: vec![
                SlotPattern::compile(
                    "count_field_before_term",
                    &format!(
                        r"^.*?\b(?:{ui})\s+(?:(?:the|my)\s+)?(?P<field>{f})\s+(?:(?:count|number|progress)\s+)?(?:(?:of|for|on|in)\s+)?(?:the\s+)?(?P<term>.+?)\s+(?:(?:to|at|as)\s+)?(?P<value>[0-9]+)\s*$"
                    ),
                )?,
                SlotPattern::compile(
                    "count_term_before_field",
                    &format!(
                        r"^.*?\b(?:{ui})\s+(?:(?:the|my)\s+)?(?P<term>.+?)(?:'s)?\s+(?:(?:to|at|as|on)\s+)?(?P<field>{f})\s+(?:(?:count|number|progress)\s+)?(?:(?:to|at|as)\s+)?(?P<value>[0-9]+)\s*$"
                    ),
                )?,
                SlotPattern::compile(
                    "count_without_field",
                    &format!(
                        r"^.*?\b(?:{ui})\s+(?:(?:the|my)\s+)?(?P<term>.+?)\s+(?:(?:to|at|as)\s+)?(?P<value>[0-9]+)\s*$"
                    ),
                )?,
            ],
            table: vocab.table.clone(),
        })
    }
}

impl UpdateRule for CountRule {
    fn name(&self) -> &'static str {
        "count"
    }

    fn apply(&self, text: &str, out: &mut ParsedQuery) -> bool {
        let Some((pattern, caps)) = first_match(&self.patterns, text) else {
            return false;
        };
        let (Some(raw), Some(digits)) = (group(&caps, "term"), group(&caps, "value")) else {
            return false;
        };
        log::debug!("count rule matched by {}", pattern.name);
        let (term, suffix_media) = clean_term(raw);
        let field = group(&caps, "field").map(|w| field_modifier(&self.table, w));
        let modifier = count_modifier(field, suffix_media);
        let media_type = modifier.implied_media_type().unwrap_or_default();
        // Overflowing counts keep the operation but carry no value.
        let value = digits.parse::<u32>().ok().map(QueryValue::Number);
        overwrite(out, OperationType::Update, term, media_type, modifier, value);
        true
    }
}

struct ScoreRule {
    patterns: Vec<SlotPattern>,
}

impl ScoreRule {
    fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        let u = &vocab.update;
        let sc = &vocab.score;
        let mut patterns = vec![
            SlotPattern::compile(
                "score_before_term",
                &format!(
                    r"^.*?\b(?:{u})\s+(?:(?:the|my)\s+)?(?:{sc})\s+(?:(?:of|for|on|to)\s+)?(?:the\s+)?(?:(?P<pre>anime|manga)\s+)?(?P<term>.+?)(?:\s+(?P<post>anime|manga))?\s+(?:(?:to|at|as|with)\s+)?(?:(?:a|an)\s+)?{SCORE_TAIL}"
                ),
            )?,
            SlotPattern::compile(
                "score_after_term",
                &format!(
                    r"^.*?\b(?:{u})\s+(?:(?:the|my)\s+)?(?:(?P<pre>anime|manga)\s+)?(?P<term>.+?)(?:'s)?(?:\s+(?P<post>anime|manga))?\s+(?:(?:a|an|the|my)\s+)?(?:{sc})\s+(?:(?:of|to|at|as)\s+)?(?:(?:a|an)\s+)?{SCORE_TAIL}"
                ),
            )?,
        ];
        if let Some(rate) = &vocab.rate {
            patterns.push(SlotPattern::compile(
                "score_rate_verb",
                &format!(
                    r"^.*?\b(?:{rate})\s+(?:(?P<pre>anime|manga)\s+)?(?P<term>.+?)(?:\s+(?P<post>anime|manga))?\s+(?:(?:a|an|as|at|with)\s+)?{SCORE_TAIL}"
                ),
            )?);
        }
        patterns.push(SlotPattern::compile(
            "score_article",
            &format!(
                r"^.*?\b(?:{u})\s+(?:(?P<pre>anime|manga)\s+)?(?P<term>.+?)(?:\s+(?P<post>anime|manga))?(?:\s+(?:to|with))?\s+(?:a|an)\s+{SCORE_TAIL}"
            ),
        )?);
        Ok(Self { patterns })
    }
}

impl UpdateRule for ScoreRule {
    fn name(&self) -> &'static str {
        "score"
    }

    fn apply(&self, text: &str, out: &mut ParsedQuery) -> bool {
        let Some((pattern, caps)) = first_match(&self.patterns, text) else {
            return false;
        };
        let (Some(raw), Some(digits)) = (group(&caps, "term"), group(&caps, "value")) else {
            return false;
        };
        log::debug!("score rule matched by {}", pattern.name);
        let (term, suffix_media) = clean_term(raw);
        let media_type = slot_media(&caps, &["pre", "post"], suffix_media);
        let value = digits.parse::<u32>().ok().map(QueryValue::Number);
        overwrite(
            out,
            OperationType::Update,
            term,
            media_type,
            Modifier::Score,
            value,
        );
        true
    }
}

struct StatusRule {
    pattern: SlotPattern,
    table: SynonymTable,
}

impl StatusRule {
    fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        let u = &vocab.update;
        let st = &vocab.status_words;
        let sv = &vocab.status_values;
        Ok(Self {
            pattern: SlotPattern::compile(
                "status",
                &format!(
                    r"^.*?\b(?:{u})\s+(?:(?:the|my)\s+)?(?:(?:{st})\s+(?:(?:of|for|on)\s+)?)?(?:the\s+)?(?:(?P<pre>anime|manga)\s+)?(?P<term>.+?)(?:'s)?(?:\s+(?P<post>anime|manga))?(?:\s+(?:{st}))?\s+(?:(?:to|as|at|is|into|in)\s+)?(?:(?:being|be)\s+)?(?P<status>{sv})\s*$"
                ),
            )?,
            table: vocab.table.clone(),
        })
    }
}

fn status_for(category: TermCategory, media_type: MediaType) -> Option<StatusType> {
    Some(match category {
        TermCategory::Watching => StatusType::Watching,
        TermCategory::Reading => StatusType::Reading,
        TermCategory::OnHold => StatusType::OnHold,
        TermCategory::Completed => StatusType::Completed,
        TermCategory::Dropped => StatusType::Dropped,
        TermCategory::PlanToWatch => StatusType::PlanToWatch,
        TermCategory::PlanToRead => StatusType::PlanToRead,
        TermCategory::Plan => StatusType::planned(media_type),
        _ => return None,
    })
}

impl UpdateRule for StatusRule {
    fn name(&self) -> &'static str {
        "status"
    }

    fn apply(&self, text: &str, out: &mut ParsedQuery) -> bool {
        let Some(caps) = self.pattern.regex.captures(text) else {
            return false;
        };
        let (Some(raw), Some(phrase)) = (group(&caps, "term"), group(&caps, "status")) else {
            return false;
        };
        let (term, suffix_media) = clean_term(raw);
        let slot_type = slot_media(&caps, &["pre", "post"], suffix_media);
        let Some(status) =
            status_category(&self.table, phrase).and_then(|c| status_for(c, slot_type))
        else {
            return false;
        };
        let media_type = status.implied_media_type().unwrap_or(slot_type);
        overwrite(
            out,
            OperationType::Update,
            term,
            media_type,
            Modifier::Status,
            Some(QueryValue::Status(status)),
        );
        true
    }
}
