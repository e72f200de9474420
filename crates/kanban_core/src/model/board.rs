//! Board and column records plus the fixed column catalogue.
//!
//! # Invariants
//! - Exactly one board named [`DEFAULT_BOARD_NAME`] exists once seeded.
//! - Seeded column IDs are stable: Todo=1, Doing=2, Done=3.

use crate::model::card::{Card, ChecklistItem};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type BoardId = i64;
pub type ColumnId = i64;

/// Name of the singleton board.
pub const DEFAULT_BOARD_NAME: &str = "My Board";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    /// Display order within the board.
    pub position: i64,
}

/// One of the three seeded columns.
///
/// Shells address columns by this key; the seeder guarantees the ID mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Todo,
    Doing,
    Done,
}

impl ColumnKey {
    /// Seed order.
    pub const ALL: [ColumnKey; 3] = [ColumnKey::Todo, ColumnKey::Doing, ColumnKey::Done];

    pub fn id(self) -> ColumnId {
        match self {
            Self::Todo => 1,
            Self::Doing => 2,
            Self::Done => 3,
        }
    }

    pub fn position(self) -> i64 {
        self.id() - 1
    }

    /// Display name stored in `columns.name`.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::Doing => "Doing",
            Self::Done => "Done",
        }
    }

    /// Lowercase label used by command-line callers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::Done => "done",
        }
    }

    pub fn from_id(id: ColumnId) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.id() == id)
    }

    /// Case-insensitive lookup by label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "doing" => Some(Self::Doing),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl Display for ColumnKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ColumnKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| format!("invalid column `{value}`; use 'todo', 'doing', or 'done'"))
    }
}

/// Eagerly loaded board read model, rendered by shells in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board: Board,
    /// Ordered by `position`.
    pub columns: Vec<ColumnSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub column: Column,
    /// Top-level cards in display order.
    pub cards: Vec<CardNode>,
}

/// One card with its checklist and direct children, each in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardNode {
    pub card: Card,
    pub checklist: Vec<ChecklistItem>,
    pub children: Vec<CardNode>,
}

/// Rows removed by one cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub columns: usize,
    pub cards: usize,
    pub checklist_items: usize,
}

/// Top-level card count for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCount {
    pub column_id: ColumnId,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStatus {
    /// Ordered by column position.
    pub columns: Vec<ColumnCount>,
    pub total: usize,
}

impl BoardStatus {
    pub fn count_for(&self, column_id: ColumnId) -> Option<usize> {
        self.columns
            .iter()
            .find(|entry| entry.column_id == column_id)
            .map(|entry| entry.count)
    }
}
