#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::{ContractViolation, SchemaVersion, Validate};

pub const QUERY_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const SCORE_MIN: u32 = 1;
pub const SCORE_MAX: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Search,
    Update,
    UpdateIncrement,
    Add,
    Delete,
    ViewList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Anime,
    Manga,
}

impl MediaType {
    /// Maps the literal type words used by the slot patterns.
    ///
    /// Panics on anything other than `"anime"` or `"manga"`: callers only pass
    /// captures from patterns that can produce nothing else.
    pub fn from_literal(literal: &str) -> Self {
        match literal {
            "anime" => MediaType::Anime,
            "manga" => MediaType::Manga,
            other => panic!("invalid media type literal {other:?}, must be either anime or manga"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Anime => "anime",
            MediaType::Manga => "manga",
        }
    }
}

/// The entry field an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Status,
    Score,
    Episode,
    Chapter,
    Volume,
}

impl Modifier {
    pub fn is_count(self) -> bool {
        matches!(self, Modifier::Episode | Modifier::Chapter | Modifier::Volume)
    }

    /// Media type a count field belongs to. `None` for status and score.
    pub fn implied_media_type(self) -> Option<MediaType> {
        match self {
            Modifier::Episode => Some(MediaType::Anime),
            Modifier::Chapter | Modifier::Volume => Some(MediaType::Manga),
            Modifier::Status | Modifier::Score => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Status => "status",
            Modifier::Score => "score",
            Modifier::Episode => "episode",
            Modifier::Chapter => "chapter",
            Modifier::Volume => "volume",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusType {
    Watching,
    Reading,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
    PlanToRead,
}

impl StatusType {
    /// Numeric status code understood by the list service.
    pub fn list_code(self) -> u8 {
        match self {
            StatusType::Watching | StatusType::Reading => 1,
            StatusType::Completed => 2,
            StatusType::OnHold => 3,
            StatusType::Dropped => 4,
            StatusType::PlanToWatch | StatusType::PlanToRead => 6,
        }
    }

    /// `Some` only for statuses that exist for a single media type.
    pub fn implied_media_type(self) -> Option<MediaType> {
        match self {
            StatusType::Watching | StatusType::PlanToWatch => Some(MediaType::Anime),
            StatusType::Reading | StatusType::PlanToRead => Some(MediaType::Manga),
            StatusType::Completed | StatusType::OnHold | StatusType::Dropped => None,
        }
    }

    /// The "in progress" status for a media type.
    pub fn in_progress(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Anime => StatusType::Watching,
            MediaType::Manga => StatusType::Reading,
        }
    }

    /// The "plan to" status for a media type.
    pub fn planned(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Anime => StatusType::PlanToWatch,
            MediaType::Manga => StatusType::PlanToRead,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StatusType::Watching => "Watching",
            StatusType::Reading => "Reading",
            StatusType::Completed => "Completed",
            StatusType::OnHold => "On hold",
            StatusType::Dropped => "Dropped",
            StatusType::PlanToWatch => "Plan to watch",
            StatusType::PlanToRead => "Plan to read",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryValue {
    Number(u32),
    Status(StatusType),
}

/// Non-task utterances detected alongside (or instead of) the main action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extra {
    Greeting,
    Thanks,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub schema_version: SchemaVersion,
    pub operation: Option<OperationType>,
    pub media_type: MediaType,
    /// Subject text identifying the list entry. Empty when no slot rule matched.
    pub term: String,
    pub modifier: Option<Modifier>,
    pub value: Option<QueryValue>,
    pub extra: Option<Extra>,
}

impl Default for ParsedQuery {
    fn default() -> Self {
        Self {
            schema_version: QUERY_CONTRACT_VERSION,
            operation: None,
            media_type: MediaType::Anime,
            term: String::new(),
            modifier: None,
            value: None,
            extra: None,
        }
    }
}

impl ParsedQuery {
    pub fn unrecognized() -> Self {
        Self::default()
    }

    /// The EXIT sentinel: nothing else is populated.
    pub fn exit() -> Self {
        Self {
            extra: Some(Extra::Exit),
            ..Self::default()
        }
    }

    pub fn is_exit(&self) -> bool {
        self.extra == Some(Extra::Exit)
    }

    /// Clears a value that falls outside the range of its modifier.
    /// Returns `true` when something was dropped.
    pub fn drop_out_of_range_value(&mut self) -> bool {
        let keep = match (self.modifier, self.value) {
            (_, None) => return false,
            (Some(Modifier::Score), Some(QueryValue::Number(n))) => {
                (SCORE_MIN..=SCORE_MAX).contains(&n)
            }
            (Some(m), Some(QueryValue::Number(_))) => m.is_count(),
            (Some(Modifier::Status), Some(QueryValue::Status(_))) => true,
            _ => false,
        };
        if !keep {
            self.value = None;
        }
        !keep
    }
}

impl Validate for ParsedQuery {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != QUERY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "parsed_query.schema_version",
                reason: "must match QUERY_CONTRACT_VERSION",
            });
        }
        if self.is_exit() && *self != Self::exit() {
            return Err(ContractViolation::InvalidValue {
                field: "parsed_query.extra",
                reason: "exit must not carry any other field",
            });
        }
        if self.term.trim().len() != self.term.len() {
            return Err(ContractViolation::InvalidValue {
                field: "parsed_query.term",
                reason: "must not carry surrounding whitespace",
            });
        }
        match (self.modifier, self.value) {
            (_, None) => {}
            (None, Some(_)) => {
                return Err(ContractViolation::InvalidValue {
                    field: "parsed_query.value",
                    reason: "requires a modifier",
                });
            }
            (Some(Modifier::Score), Some(QueryValue::Number(n))) => {
                if !(SCORE_MIN..=SCORE_MAX).contains(&n) {
                    return Err(ContractViolation::InvalidRange {
                        field: "parsed_query.value",
                        min: SCORE_MIN,
                        max: SCORE_MAX,
                        got: n,
                    });
                }
            }
            (Some(Modifier::Status), Some(QueryValue::Status(_))) => {}
            (Some(m), Some(QueryValue::Number(_))) if m.is_count() => {}
            (Some(_), Some(_)) => {
                return Err(ContractViolation::InvalidValue {
                    field: "parsed_query.value",
                    reason: "value kind does not match modifier",
                });
            }
        }
        Ok(())
    }
}
