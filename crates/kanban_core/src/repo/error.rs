//! Error type shared by the board, card and checklist repositories.

use crate::db::DbError;
use crate::repo::ordering::Scope;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by board store operations.
pub type BoardRepoResult<T> = Result<T, BoardRepoError>;

/// Entity kinds addressed by ID in error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Board,
    Column,
    Card,
    ChecklistItem,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Column => "column",
            Self::Card => "card",
            Self::ChecklistItem => "checklist item",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors from board store operations.
#[derive(Debug)]
pub enum BoardRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Operation target does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// A referenced column/parent/card does not exist.
    InvalidReference { kind: EntityKind, id: i64 },
    /// Request is well-formed but violates a hierarchy rule.
    InvalidInput(String),
    /// A sibling scope is not numbered `0..N-1` after a write.
    ConsistencyViolation { scope: Scope, detail: String },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl BoardRepoError {
    pub(crate) fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn invalid_reference(kind: EntityKind, id: i64) -> Self {
        Self::InvalidReference { kind, id }
    }
}

impl Display for BoardRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidReference { kind, id } => {
                write!(f, "referenced {kind} does not exist: {id}")
            }
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::ConsistencyViolation { scope, detail } => {
                write!(f, "ordering invariant broken in {scope}: {detail}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid board data: {message}"),
        }
    }
}

impl Error for BoardRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for BoardRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BoardRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
