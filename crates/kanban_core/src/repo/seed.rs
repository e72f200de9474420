//! Singleton board seeding.
//!
//! # Invariants
//! - At most one board named [`DEFAULT_BOARD_NAME`] ever exists.
//! - A freshly seeded board has exactly the [`ColumnKey::ALL`] columns, with
//!   the IDs and positions the keys declare.
//! - An existing board is returned untouched.

use crate::model::board::{Board, ColumnKey, DEFAULT_BOARD_NAME};
use crate::repo::error::{BoardRepoError, BoardRepoResult};
use crate::repo::store::{find_board_by_name, SqliteBoardStore};
use log::info;
use rusqlite::{params, Connection};

impl SqliteBoardStore<'_> {
    /// Returns the singleton board, creating it and its columns on first use.
    pub(crate) fn seed_board(&self) -> BoardRepoResult<Board> {
        if let Some(board) = find_board_by_name(self.conn(), DEFAULT_BOARD_NAME)? {
            return Ok(board);
        }

        let tx = self.write_tx()?;
        // Re-check under the writer lock: another connection may have seeded.
        if let Some(board) = find_board_by_name(&tx, DEFAULT_BOARD_NAME)? {
            return Ok(board);
        }

        let board = insert_seed_board(&tx)?;
        tx.commit()?;
        info!(
            "event=board_seed module=repo status=ok board_id={} columns={}",
            board.id,
            ColumnKey::ALL.len()
        );
        Ok(board)
    }
}

/// Inserts the singleton board and its fixed columns.
///
/// Callers hold the write transaction and have checked that no board exists.
pub(crate) fn insert_seed_board(conn: &Connection) -> BoardRepoResult<Board> {
    conn.execute(
        "INSERT INTO boards (name) VALUES (?1);",
        [DEFAULT_BOARD_NAME],
    )?;
    let board_id = conn.last_insert_rowid();

    for key in ColumnKey::ALL {
        let taken: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM columns WHERE id = ?1);",
            [key.id()],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(BoardRepoError::InvalidData(format!(
                "column id {} is held by another board; cannot seed `{}`",
                key.id(),
                key.display_name()
            )));
        }
        conn.execute(
            "INSERT INTO columns (id, board_id, name, position) VALUES (?1, ?2, ?3, ?4);",
            params![key.id(), board_id, key.display_name(), key.position()],
        )?;
    }

    Ok(Board {
        id: board_id,
        name: DEFAULT_BOARD_NAME.to_string(),
    })
}
