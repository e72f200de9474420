//! Kanban board ordering and hierarchy engine.
//!
//! Cards live in the fixed columns of one board, nest one level deep and
//! carry an ordered checklist. Every sibling scope keeps dense `0..N-1`
//! positions across create, delete and move.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BoardConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, normalize_level};
pub use model::board::{
    Board, BoardId, BoardSnapshot, BoardStatus, CardNode, CascadeSummary, Column, ColumnCount,
    ColumnId, ColumnKey, ColumnSnapshot, DEFAULT_BOARD_NAME,
};
pub use model::card::{
    format_due_at, parse_due_at, Card, CardDeletion, CardId, CardMove, CardSummary, CardUpdate,
    ChecklistItem, ChecklistItemId, InvalidDueDate, NewCard,
};
pub use repo::board_repo::BoardRepository;
pub use repo::card_repo::CardRepository;
pub use repo::checklist_repo::ChecklistRepository;
pub use repo::error::{BoardRepoError, BoardRepoResult, EntityKind};
pub use repo::ordering::Scope;
pub use repo::store::SqliteBoardStore;
pub use service::board_service::{
    BoardService, BoardServiceError, BoardServiceResult, CardPatch, CreateCardRequest,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
