//! Card and checklist records, write requests, and due-date handling.
//!
//! # Invariants
//! - A card with `parent_id == None` is ordered among its column's top-level
//!   cards; a card with a parent is ordered among that parent's children.
//! - `due_at` is Unix epoch milliseconds (UTC).

use crate::model::board::ColumnId;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CardId = i64;
pub type ChecklistItemId = i64;

/// Maximum title length in characters.
pub const CARD_TITLE_MAX_CHARS: usize = 200;
/// Maximum checklist item text length in characters.
pub const CHECKLIST_TEXT_MAX_CHARS: usize = 300;

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub column_id: ColumnId,
    /// `None` for top-level cards.
    pub parent_id: Option<CardId>,
    pub title: String,
    pub notes: String,
    pub due_at: Option<i64>,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Card {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub card_id: CardId,
    pub text: String,
    pub done: bool,
    pub position: i64,
}

/// Validated input for inserting one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub column_id: ColumnId,
    pub parent_id: Option<CardId>,
    pub title: String,
    pub notes: String,
    pub due_at: Option<i64>,
}

/// Partial card update. `None` leaves a field untouched.
///
/// `due_at: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUpdate {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due_at: Option<Option<i64>>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.notes.is_none() && self.due_at.is_none()
    }
}

/// Rows removed by one cascading card delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDeletion {
    pub card_id: CardId,
    /// Descendant cards removed along with the target.
    pub removed_children: usize,
    pub removed_checklist_items: usize,
}

/// Outcome of one card move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMove {
    pub card_id: CardId,
    pub from_column_id: ColumnId,
    pub to_column_id: ColumnId,
    /// Final index after clamping and reindexing.
    pub position: i64,
}

/// Top-level card listing row for automation callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub card: Card,
    pub child_count: usize,
    pub checklist_count: usize,
    pub checklist_done: usize,
}

/// Due date text is not a recognized ISO-8601 shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDueDate(pub String);

impl Display for InvalidDueDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid date format `{}`; use YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]",
            self.0
        )
    }
}

impl Error for InvalidDueDate {}

/// Parses ISO-8601 due date text into epoch milliseconds.
///
/// Dates without a time resolve to midnight UTC. Offsets are honored when
/// present (RFC 3339); naive timestamps are read as UTC.
pub fn parse_due_at(raw: &str) -> Result<i64, InvalidDueDate> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.timestamp_millis());
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .ok_or_else(|| InvalidDueDate(value.to_string()))
}

/// Formats epoch milliseconds as `YYYY-MM-DDTHH:MM:SS` (UTC).
pub fn format_due_at(epoch_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|value| value.format("%Y-%m-%dT%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::{format_due_at, parse_due_at};

    #[test]
    fn parse_date_only_resolves_to_utc_midnight() {
        let ms = parse_due_at("2025-03-01").unwrap();
        assert_eq!(format_due_at(ms).as_deref(), Some("2025-03-01T00:00:00"));
    }

    #[test]
    fn parse_accepts_naive_and_offset_timestamps() {
        let naive = parse_due_at("2025-03-01T09:30").unwrap();
        let seconds = parse_due_at("2025-03-01 09:30:00").unwrap();
        let offset = parse_due_at("2025-03-01T10:30:00+01:00").unwrap();
        assert_eq!(naive, seconds);
        assert_eq!(naive, offset);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_due_at("next tuesday").unwrap_err();
        assert!(err.to_string().contains("next tuesday"));
        assert!(parse_due_at("2025-13-40").is_err());
    }
}
