#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::query::{MediaType, Modifier, StatusType, SCORE_MAX, SCORE_MIN};
use crate::{ContractViolation, Validate};

/// Caller-owned session details handed to every list-service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub username: String,
}

impl SessionContext {
    pub fn v1(username: String) -> Result<Self, ContractViolation> {
        let ctx = Self {
            username: username.trim().to_string(),
        };
        ctx.validate()?;
        Ok(ctx)
    }
}

impl Validate for SessionContext {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.username.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "session_context.username",
                reason: "must not be empty",
            });
        }
        if self.username.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "session_context.username",
                reason: "must be <= 64 chars",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub title: String,
    /// Alternative titles, as a single free-text field.
    pub synonyms: String,
    pub media_type: MediaType,
    pub status: Option<StatusType>,
    pub score: Option<u32>,
    /// Episodes for anime, chapters for manga.
    pub progress: u32,
    /// Total in the series; 0 when unknown.
    pub series_total: u32,
    /// Volumes read. Manga only, tracked apart from chapters.
    #[serde(default)]
    pub volumes_read: u32,
    /// Volumes in the series; 0 when unknown or not applicable.
    #[serde(default)]
    pub series_volumes: u32,
}

impl ListEntry {
    /// Progress for a count field.
    pub fn count(&self, field: Modifier) -> u32 {
        match field {
            Modifier::Volume => self.volumes_read,
            _ => self.progress,
        }
    }

    pub fn count_mut(&mut self, field: Modifier) -> &mut u32 {
        match field {
            Modifier::Volume => &mut self.volumes_read,
            _ => &mut self.progress,
        }
    }

    /// Series total for a count field; 0 when unknown.
    pub fn total(&self, field: Modifier) -> u32 {
        match field {
            Modifier::Volume => self.series_volumes,
            _ => self.series_total,
        }
    }

    /// Fills every count with a known total up to that total.
    pub fn fill_to_totals(&mut self) {
        if self.series_total > 0 {
            self.progress = self.series_total;
        }
        if self.series_volumes > 0 {
            self.volumes_read = self.series_volumes;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(ListEntry),
    NoResults,
    UserCancelled,
}

/// The change an update request applies to a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    Increment(Modifier),
    SetCount(Modifier, u32),
    SetScore(u32),
    SetStatus(StatusType),
}

impl FieldUpdate {
    pub fn modifier(self) -> Modifier {
        match self {
            FieldUpdate::Increment(m) | FieldUpdate::SetCount(m, _) => m,
            FieldUpdate::SetScore(_) => Modifier::Score,
            FieldUpdate::SetStatus(_) => Modifier::Status,
        }
    }
}

impl Validate for FieldUpdate {
    fn validate(&self) -> Result<(), ContractViolation> {
        match *self {
            FieldUpdate::Increment(m) | FieldUpdate::SetCount(m, _) if !m.is_count() => {
                Err(ContractViolation::InvalidValue {
                    field: "field_update.modifier",
                    reason: "counts only apply to episode, chapter or volume",
                })
            }
            FieldUpdate::SetScore(n) if !(SCORE_MIN..=SCORE_MAX).contains(&n) => {
                Err(ContractViolation::InvalidRange {
                    field: "field_update.score",
                    min: SCORE_MIN,
                    max: SCORE_MAX,
                    got: n,
                })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("could not connect to the list service")]
    ConnectionError,
    #[error("the list service rejected the credentials")]
    Unauthorised,
    #[error("list service error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_context_trims_and_rejects_empty() {
        assert_eq!(
            SessionContext::v1("  kira ".to_string()).unwrap().username,
            "kira"
        );
        assert!(SessionContext::v1("   ".to_string()).is_err());
    }

    #[test]
    fn increment_of_score_is_rejected() {
        assert!(FieldUpdate::Increment(Modifier::Score).validate().is_err());
        assert!(FieldUpdate::Increment(Modifier::Chapter).validate().is_ok());
    }

    #[test]
    fn volumes_are_counted_apart_from_chapters() {
        let mut entry: ListEntry = serde_json::from_str(
            r#"{"title":"Berserk","synonyms":"","media_type":"manga","status":null,
                "score":null,"progress":300,"series_total":364}"#,
        )
        .unwrap();
        assert_eq!(entry.series_volumes, 0);
        *entry.count_mut(Modifier::Volume) = 30;
        assert_eq!(entry.count(Modifier::Chapter), 300);
        assert_eq!(entry.count(Modifier::Volume), 30);
        assert_eq!(entry.total(Modifier::Volume), 0);

        entry.series_volumes = 41;
        entry.fill_to_totals();
        assert_eq!((entry.progress, entry.volumes_read), (364, 41));
    }

    #[test]
    fn set_score_enforces_range() {
        assert!(FieldUpdate::SetScore(0).validate().is_err());
        assert!(FieldUpdate::SetScore(10).validate().is_ok());
    }
}
