//! Board and column repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Seed and look up the singleton board.
//! - Build eager board snapshots and per-column counts with explicit queries.
//! - Cascade board/column deletes through cards and checklist items.
//! - Reset the board (cascade delete plus reseed) as one write.
//!
//! # Invariants
//! - Snapshot reads happen inside one read transaction, so a concurrent move
//!   is either fully visible or not at all.
//! - Columns, cards, children and checklist items come back in display order.

use crate::model::board::{
    Board, BoardId, BoardSnapshot, BoardStatus, CardNode, CascadeSummary, Column, ColumnCount,
    ColumnId, ColumnSnapshot, DEFAULT_BOARD_NAME,
};
use crate::model::card::{CardId, ChecklistItem};
use crate::repo::cascade::purge_column;
use crate::repo::error::{BoardRepoError, BoardRepoResult, EntityKind};
use crate::repo::seed::insert_seed_board;
use crate::repo::store::{
    find_board_by_name, list_board_columns, load_board, load_column, query_cards,
    query_checklist_items, SqliteBoardStore, CARD_SELECT_SQL, CHECKLIST_SELECT_SQL,
};
use rusqlite::Connection;
use std::collections::HashMap;

/// Repository interface for board-level operations.
pub trait BoardRepository {
    /// Returns the singleton board, seeding it on first call.
    fn ensure_seed(&self) -> BoardRepoResult<Board>;
    /// Looks up the singleton board without seeding.
    fn find_board(&self) -> BoardRepoResult<Option<Board>>;
    /// Lists one board's columns by position.
    fn list_columns(&self, board_id: BoardId) -> BoardRepoResult<Vec<Column>>;
    /// Loads one column by id.
    fn get_column(&self, column_id: ColumnId) -> BoardRepoResult<Option<Column>>;
    /// Loads board → columns → cards → children + checklists.
    fn load_snapshot(&self, board_id: BoardId) -> BoardRepoResult<BoardSnapshot>;
    /// Counts top-level cards per column.
    fn board_status(&self, board_id: BoardId) -> BoardRepoResult<BoardStatus>;
    /// Deletes one column and every card scoped to it.
    fn delete_column(&self, column_id: ColumnId) -> BoardRepoResult<CascadeSummary>;
    /// Deletes one board with all of its columns.
    fn delete_board(&self, board_id: BoardId) -> BoardRepoResult<CascadeSummary>;
    /// Deletes the singleton board with everything on it and reseeds it, in
    /// one transaction.
    fn reset_board(&self) -> BoardRepoResult<(CascadeSummary, Board)>;
}

impl BoardRepository for SqliteBoardStore<'_> {
    fn ensure_seed(&self) -> BoardRepoResult<Board> {
        self.seed_board()
    }

    fn find_board(&self) -> BoardRepoResult<Option<Board>> {
        find_board_by_name(self.conn(), DEFAULT_BOARD_NAME)
    }

    fn list_columns(&self, board_id: BoardId) -> BoardRepoResult<Vec<Column>> {
        list_board_columns(self.conn(), board_id)
    }

    fn get_column(&self, column_id: ColumnId) -> BoardRepoResult<Option<Column>> {
        load_column(self.conn(), column_id)
    }

    fn load_snapshot(&self, board_id: BoardId) -> BoardRepoResult<BoardSnapshot> {
        let tx = self.read_tx()?;
        let board = load_board(&tx, board_id)?
            .ok_or_else(|| BoardRepoError::not_found(EntityKind::Board, board_id))?;
        let columns = list_board_columns(&tx, board_id)?;

        let cards = query_cards(
            &tx,
            &format!(
                "{CARD_SELECT_SQL}
                 WHERE column_id IN (SELECT id FROM columns WHERE board_id = ?1)
                 ORDER BY position ASC, id ASC;"
            ),
            [board_id],
        )?;
        let items = query_checklist_items(
            &tx,
            &format!(
                "{CHECKLIST_SELECT_SQL}
                 WHERE card_id IN (
                    SELECT cards.id
                    FROM cards
                    INNER JOIN columns ON columns.id = cards.column_id
                    WHERE columns.board_id = ?1
                 )
                 ORDER BY position ASC, id ASC;"
            ),
            [board_id],
        )?;
        tx.commit()?;

        let mut checklists: HashMap<CardId, Vec<ChecklistItem>> = HashMap::new();
        for item in items {
            checklists.entry(item.card_id).or_default().push(item);
        }

        let mut children: HashMap<CardId, Vec<CardNode>> = HashMap::new();
        let mut top_level: HashMap<ColumnId, Vec<CardNode>> = HashMap::new();
        for card in cards {
            let node = CardNode {
                checklist: checklists.remove(&card.id).unwrap_or_default(),
                children: Vec::new(),
                card,
            };
            match node.card.parent_id {
                Some(parent_id) => children.entry(parent_id).or_default().push(node),
                None => top_level.entry(node.card.column_id).or_default().push(node),
            }
        }

        let columns = columns
            .into_iter()
            .map(|column| {
                let mut cards = top_level.remove(&column.id).unwrap_or_default();
                for node in &mut cards {
                    node.children = children.remove(&node.card.id).unwrap_or_default();
                }
                ColumnSnapshot { column, cards }
            })
            .collect();

        Ok(BoardSnapshot { board, columns })
    }

    fn board_status(&self, board_id: BoardId) -> BoardRepoResult<BoardStatus> {
        let mut stmt = self.conn().prepare(
            "SELECT columns.id, columns.name, COUNT(cards.id)
             FROM columns
             LEFT JOIN cards
               ON cards.column_id = columns.id
              AND cards.parent_id IS NULL
             WHERE columns.board_id = ?1
             GROUP BY columns.id
             ORDER BY columns.position ASC, columns.id ASC;",
        )?;
        let mut rows = stmt.query([board_id])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            let count: i64 = row.get(2)?;
            columns.push(ColumnCount {
                column_id: row.get(0)?,
                name: row.get(1)?,
                count: usize::try_from(count).map_err(|_| {
                    BoardRepoError::InvalidData(format!("negative card count `{count}`"))
                })?,
            });
        }
        let total = columns.iter().map(|entry| entry.count).sum();
        Ok(BoardStatus { columns, total })
    }

    fn delete_column(&self, column_id: ColumnId) -> BoardRepoResult<CascadeSummary> {
        let tx = self.write_tx()?;
        if load_column(&tx, column_id)?.is_none() {
            return Err(BoardRepoError::not_found(EntityKind::Column, column_id));
        }
        let summary = purge_column(&tx, column_id)?;
        tx.commit()?;
        Ok(summary)
    }

    fn delete_board(&self, board_id: BoardId) -> BoardRepoResult<CascadeSummary> {
        let tx = self.write_tx()?;
        if load_board(&tx, board_id)?.is_none() {
            return Err(BoardRepoError::not_found(EntityKind::Board, board_id));
        }

        let summary = purge_board(&tx, board_id)?;
        tx.commit()?;
        Ok(summary)
    }

    fn reset_board(&self) -> BoardRepoResult<(CascadeSummary, Board)> {
        let tx = self.write_tx()?;
        let removed = match find_board_by_name(&tx, DEFAULT_BOARD_NAME)? {
            Some(board) => purge_board(&tx, board.id)?,
            None => CascadeSummary::default(),
        };
        let board = insert_seed_board(&tx)?;
        tx.commit()?;
        Ok((removed, board))
    }
}

/// Deletes every column of the board, then the board row itself.
fn purge_board(conn: &Connection, board_id: BoardId) -> BoardRepoResult<CascadeSummary> {
    let mut summary = CascadeSummary::default();
    for column in list_board_columns(conn, board_id)? {
        let removed = purge_column(conn, column.id)?;
        summary.columns += removed.columns;
        summary.cards += removed.cards;
        summary.checklist_items += removed.checklist_items;
    }
    conn.execute("DELETE FROM boards WHERE id = ?1;", [board_id])?;
    Ok(summary)
}
