//! Board use-case service.
//!
//! # Responsibility
//! - Validate and normalize caller input (titles, checklist text, due dates)
//!   above the repository layer.
//! - Expose the board operation set consumed by shells.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - Titles and checklist text are trimmed and must not be blank.
//! - An omitted patch field is left untouched; an explicit empty `due_at`
//!   clears the due date, an explicit empty `notes` clears the notes.
//! - Service APIs never bypass repository transactions.

use crate::model::board::{Board, BoardSnapshot, BoardStatus, CascadeSummary, ColumnId};
use crate::model::card::{
    parse_due_at, Card, CardDeletion, CardId, CardMove, CardSummary, CardUpdate, ChecklistItem,
    ChecklistItemId, NewCard, CARD_TITLE_MAX_CHARS, CHECKLIST_TEXT_MAX_CHARS,
};
use crate::repo::board_repo::BoardRepository;
use crate::repo::card_repo::CardRepository;
use crate::repo::checklist_repo::ChecklistRepository;
use crate::repo::error::{BoardRepoError, EntityKind};
use crate::repo::ordering::Scope;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from board service operations.
#[derive(Debug)]
pub enum BoardServiceError {
    /// Caller input is malformed or breaks a hierarchy rule.
    InvalidInput(String),
    /// Operation target does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// A referenced column/parent/card does not exist.
    InvalidReference { kind: EntityKind, id: i64 },
    /// Ordering invariant broken; the operation was rolled back.
    ConsistencyViolation { scope: Scope, detail: String },
    /// Repository-level failure.
    Repo(BoardRepoError),
}

impl BoardServiceError {
    /// Stable machine-readable code used in logs and shell envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound { .. } => "not_found",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::ConsistencyViolation { .. } => "consistency_violation",
            Self::Repo(_) => "storage",
        }
    }

    /// Whether a shell should answer with its 404 equivalent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidReference { .. })
    }
}

impl Display for BoardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidReference { kind, id } => {
                write!(f, "referenced {kind} does not exist: {id}")
            }
            Self::ConsistencyViolation { scope, detail } => {
                write!(f, "ordering invariant broken in {scope}: {detail}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BoardRepoError> for BoardServiceError {
    fn from(value: BoardRepoError) -> Self {
        match value {
            BoardRepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            BoardRepoError::InvalidReference { kind, id } => Self::InvalidReference { kind, id },
            BoardRepoError::InvalidInput(message) => Self::InvalidInput(message),
            BoardRepoError::ConsistencyViolation { scope, detail } => {
                Self::ConsistencyViolation { scope, detail }
            }
            other => Self::Repo(other),
        }
    }
}

pub type BoardServiceResult<T> = Result<T, BoardServiceError>;

/// Request model for creating one card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateCardRequest {
    pub column_id: ColumnId,
    pub parent_id: Option<CardId>,
    pub title: String,
    pub notes: Option<String>,
    /// ISO-8601 text; blank means no due date.
    pub due_at: Option<String>,
}

/// Partial update as supplied by a shell.
///
/// `None` leaves a field untouched. `Some("")` clears notes or the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due_at: Option<String>,
}

/// Board service facade over repository implementations.
pub struct BoardService<R> {
    repo: R,
}

impl<R> BoardService<R>
where
    R: BoardRepository + CardRepository + ChecklistRepository,
{
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the singleton board, seeding it on first use.
    pub fn ensure_seed(&self) -> BoardServiceResult<Board> {
        observe("board_seed", || Ok(self.repo.ensure_seed()?))
    }

    /// Appends a card to its column (or to its parent's children).
    pub fn create_card(&self, request: &CreateCardRequest) -> BoardServiceResult<Card> {
        observe("card_create", || {
            let card = NewCard {
                column_id: request.column_id,
                parent_id: request.parent_id,
                title: normalize_title(&request.title)?,
                notes: request.notes.clone().unwrap_or_default(),
                due_at: match request.due_at.as_deref() {
                    Some(raw) => parse_optional_due_at(raw)?,
                    None => None,
                },
            };
            Ok(self.repo.create_card(&card)?)
        })
    }

    /// Overwrites only the fields present in `patch`.
    pub fn update_card(&self, card_id: CardId, patch: &CardPatch) -> BoardServiceResult<Card> {
        observe("card_update", || {
            let update = CardUpdate {
                title: patch.title.as_deref().map(normalize_title).transpose()?,
                notes: patch.notes.clone(),
                due_at: patch
                    .due_at
                    .as_deref()
                    .map(parse_optional_due_at)
                    .transpose()?,
            };
            Ok(self.repo.update_card(card_id, &update)?)
        })
    }

    /// Deletes a card, its children and checklist, then closes the gap.
    pub fn delete_card(&self, card_id: CardId) -> BoardServiceResult<CardDeletion> {
        observe("card_delete", || Ok(self.repo.delete_card(card_id)?))
    }

    /// Moves a card to `position` in `column_id`; out-of-range positions clamp.
    pub fn move_card(
        &self,
        card_id: CardId,
        column_id: ColumnId,
        position: i64,
    ) -> BoardServiceResult<CardMove> {
        observe("card_move", || {
            Ok(self.repo.move_card(card_id, column_id, position)?)
        })
    }

    /// Moves a card to the end of `column_id`.
    pub fn move_card_to_end(
        &self,
        card_id: CardId,
        column_id: ColumnId,
    ) -> BoardServiceResult<CardMove> {
        self.move_card(card_id, column_id, i64::MAX)
    }

    /// Loads one card.
    pub fn get_card(&self, card_id: CardId) -> BoardServiceResult<Card> {
        self.repo
            .get_card(card_id)?
            .ok_or(BoardServiceError::NotFound {
                kind: EntityKind::Card,
                id: card_id,
            })
    }

    /// Lists a card's direct children in display order.
    pub fn list_children(&self, card_id: CardId) -> BoardServiceResult<Vec<Card>> {
        Ok(self.repo.list_children(card_id)?)
    }

    /// Lists top-level cards, optionally for one column.
    pub fn list_cards(&self, column_id: Option<ColumnId>) -> BoardServiceResult<Vec<CardSummary>> {
        if let Some(column_id) = column_id {
            if self.repo.get_column(column_id)?.is_none() {
                return Err(BoardServiceError::InvalidReference {
                    kind: EntityKind::Column,
                    id: column_id,
                });
            }
        }
        Ok(self.repo.list_top_level(column_id)?)
    }

    /// Appends a checklist item to a card.
    pub fn add_checklist_item(
        &self,
        card_id: CardId,
        text: &str,
    ) -> BoardServiceResult<ChecklistItem> {
        observe("checklist_add", || {
            let text = normalize_checklist_text(text)?;
            Ok(self.repo.add_item(card_id, &text)?)
        })
    }

    /// Flips one checklist item's `done` flag.
    pub fn toggle_checklist_item(
        &self,
        item_id: ChecklistItemId,
    ) -> BoardServiceResult<ChecklistItem> {
        observe("checklist_toggle", || Ok(self.repo.toggle_item(item_id)?))
    }

    /// Deletes one checklist item and reindexes the rest.
    pub fn delete_checklist_item(
        &self,
        item_id: ChecklistItemId,
    ) -> BoardServiceResult<ChecklistItem> {
        observe("checklist_delete", || Ok(self.repo.delete_item(item_id)?))
    }

    /// Reorders a checklist item or moves it to another card.
    pub fn move_checklist_item(
        &self,
        item_id: ChecklistItemId,
        card_id: CardId,
        position: i64,
    ) -> BoardServiceResult<ChecklistItem> {
        observe("checklist_move", || {
            Ok(self.repo.move_item(item_id, card_id, position)?)
        })
    }

    /// Lists a card's checklist in display order.
    pub fn list_checklist(&self, card_id: CardId) -> BoardServiceResult<Vec<ChecklistItem>> {
        Ok(self.repo.list_items(card_id)?)
    }

    /// Counts top-level cards per column of the singleton board.
    pub fn get_status(&self) -> BoardServiceResult<BoardStatus> {
        let board = self.ensure_seed()?;
        Ok(self.repo.board_status(board.id)?)
    }

    /// Loads the whole board in display order.
    pub fn board_snapshot(&self) -> BoardServiceResult<BoardSnapshot> {
        let board = self.ensure_seed()?;
        Ok(self.repo.load_snapshot(board.id)?)
    }

    /// Deletes the singleton board with everything on it and reseeds it in one
    /// transaction. A failed reseed leaves the board untouched.
    pub fn reset_board(&self) -> BoardServiceResult<(CascadeSummary, Board)> {
        observe("board_reset", || Ok(self.repo.reset_board()?))
    }
}

fn observe<T>(
    event: &'static str,
    op: impl FnOnce() -> BoardServiceResult<T>,
) -> BoardServiceResult<T> {
    let started_at = Instant::now();
    let result = op();
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(err @ BoardServiceError::ConsistencyViolation { .. }) => error!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
        Err(err) => warn!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
    result
}

fn normalize_title(value: &str) -> BoardServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardServiceError::InvalidInput(
            "card title must not be blank".to_string(),
        ));
    }
    if trimmed.chars().count() > CARD_TITLE_MAX_CHARS {
        return Err(BoardServiceError::InvalidInput(format!(
            "card title exceeds {CARD_TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_checklist_text(value: &str) -> BoardServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardServiceError::InvalidInput(
            "checklist item text must not be blank".to_string(),
        ));
    }
    if trimmed.chars().count() > CHECKLIST_TEXT_MAX_CHARS {
        return Err(BoardServiceError::InvalidInput(format!(
            "checklist item text exceeds {CHECKLIST_TEXT_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Blank text means "no due date".
fn parse_optional_due_at(raw: &str) -> BoardServiceResult<Option<i64>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_due_at(raw)
        .map(Some)
        .map_err(|err| BoardServiceError::InvalidInput(err.to_string()))
}
