//! SQLite-backed board store shared by the repository traits.
//!
//! # Responsibility
//! - Hold the borrowed connection and open write/read transactions.
//! - Own row decoding for cards, columns and checklist items.
//!
//! # Invariants
//! - Every compound write runs in one `IMMEDIATE` transaction, so the writer
//!   lock is held before any position is read.
//! - Dropping an uncommitted transaction rolls the whole operation back.

use crate::db::migrations::latest_version;
use crate::model::board::{Board, BoardId, Column, ColumnId};
use crate::model::card::{Card, CardId, ChecklistItem, ChecklistItemId};
use crate::repo::error::{BoardRepoError, BoardRepoResult, EntityKind};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

pub(crate) const CARD_SELECT_SQL: &str = "SELECT
    id,
    column_id,
    parent_id,
    title,
    notes,
    due_at,
    position,
    created_at,
    updated_at
FROM cards";

pub(crate) const CHECKLIST_SELECT_SQL: &str = "SELECT
    id,
    card_id,
    text,
    done,
    position
FROM checklist_items";

const REQUIRED_TABLES: [&str; 4] = ["boards", "columns", "cards", "checklist_items"];

/// SQLite implementation of the board, card and checklist repositories.
pub struct SqliteBoardStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> BoardRepoResult<Self> {
        ensure_board_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }

    pub(crate) fn write_tx(&self) -> BoardRepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?)
    }

    pub(crate) fn read_tx(&self) -> BoardRepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?)
    }
}

pub(crate) fn find_board_by_name(conn: &Connection, name: &str) -> BoardRepoResult<Option<Board>> {
    let board = conn
        .query_row(
            "SELECT id, name FROM boards WHERE name = ?1;",
            [name],
            parse_board_row,
        )
        .optional()?;
    Ok(board)
}

pub(crate) fn load_board(conn: &Connection, board_id: BoardId) -> BoardRepoResult<Option<Board>> {
    let board = conn
        .query_row(
            "SELECT id, name FROM boards WHERE id = ?1;",
            [board_id],
            parse_board_row,
        )
        .optional()?;
    Ok(board)
}

pub(crate) fn load_column(
    conn: &Connection,
    column_id: ColumnId,
) -> BoardRepoResult<Option<Column>> {
    let column = conn
        .query_row(
            "SELECT id, board_id, name, position FROM columns WHERE id = ?1;",
            [column_id],
            parse_column_row,
        )
        .optional()?;
    Ok(column)
}

pub(crate) fn list_board_columns(
    conn: &Connection,
    board_id: BoardId,
) -> BoardRepoResult<Vec<Column>> {
    let mut stmt = conn.prepare(
        "SELECT id, board_id, name, position
         FROM columns
         WHERE board_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([board_id])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(parse_column_row(row)?);
    }
    Ok(columns)
}

/// Fails with `InvalidReference` when the column does not exist.
pub(crate) fn require_column_reference(
    conn: &Connection,
    column_id: ColumnId,
) -> BoardRepoResult<Column> {
    load_column(conn, column_id)?
        .ok_or_else(|| BoardRepoError::invalid_reference(EntityKind::Column, column_id))
}

pub(crate) fn load_card(conn: &Connection, card_id: CardId) -> BoardRepoResult<Option<Card>> {
    let mut stmt = conn.prepare(&format!("{CARD_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([card_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_card_row(row)?));
    }
    Ok(None)
}

/// Fails with `NotFound` when the card does not exist.
pub(crate) fn require_card(conn: &Connection, card_id: CardId) -> BoardRepoResult<Card> {
    load_card(conn, card_id)?
        .ok_or_else(|| BoardRepoError::not_found(EntityKind::Card, card_id))
}

pub(crate) fn query_cards(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> BoardRepoResult<Vec<Card>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut cards = Vec::new();
    while let Some(row) = rows.next()? {
        cards.push(parse_card_row(row)?);
    }
    Ok(cards)
}

pub(crate) fn load_checklist_item(
    conn: &Connection,
    item_id: ChecklistItemId,
) -> BoardRepoResult<Option<ChecklistItem>> {
    let mut stmt = conn.prepare(&format!("{CHECKLIST_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([item_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_checklist_row(row)?));
    }
    Ok(None)
}

pub(crate) fn query_checklist_items(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> BoardRepoResult<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_checklist_row(row)?);
    }
    Ok(items)
}

fn parse_board_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn parse_column_row(row: &Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: row.get(0)?,
        board_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
    })
}

pub(crate) fn parse_card_row(row: &Row<'_>) -> BoardRepoResult<Card> {
    Ok(Card {
        id: row.get("id")?,
        column_id: row.get("column_id")?,
        parent_id: row.get("parent_id")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        due_at: row.get("due_at")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_checklist_row(row: &Row<'_>) -> BoardRepoResult<ChecklistItem> {
    let done = match row.get::<_, i64>("done")? {
        0 => false,
        1 => true,
        other => {
            return Err(BoardRepoError::InvalidData(format!(
                "invalid done value `{other}` in checklist_items.done"
            )));
        }
    };

    Ok(ChecklistItem {
        id: row.get("id")?,
        card_id: row.get("card_id")?,
        text: row.get("text")?,
        done,
        position: row.get("position")?,
    })
}

fn ensure_board_connection_ready(conn: &Connection) -> BoardRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(BoardRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(BoardRepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
