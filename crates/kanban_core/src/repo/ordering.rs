//! Sibling-scope position sequencing and reindexing.
//!
//! # Responsibility
//! - Compute append positions inside one sibling scope.
//! - Rewrite a scope's positions to `0..N-1`, either preserving the current
//!   order or applying an explicit one.
//! - Detect scopes whose numbering has drifted.
//!
//! # Invariants
//! - Callers run these helpers inside the same write transaction as the
//!   insert/delete/move they belong to; nothing here opens a transaction.
//! - Member order is `position ASC, id ASC`, so rows that share a position
//!   keep creation order.

use crate::model::board::ColumnId;
use crate::model::card::CardId;
use crate::repo::error::{BoardRepoError, BoardRepoResult};
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// A set of siblings whose positions must stay contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Top-level cards of one column.
    Column(ColumnId),
    /// Direct children of one card.
    Children(CardId),
    /// Checklist items of one card.
    Checklist(CardId),
}

impl Scope {
    /// Scope a card with the given placement is ordered in.
    pub fn for_card(column_id: ColumnId, parent_id: Option<CardId>) -> Self {
        match parent_id {
            Some(parent_id) => Self::Children(parent_id),
            None => Self::Column(column_id),
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Column(_) | Self::Children(_) => "cards",
            Self::Checklist(_) => "checklist_items",
        }
    }

    fn owner_id(self) -> i64 {
        match self {
            Self::Column(id) | Self::Children(id) | Self::Checklist(id) => id,
        }
    }

    fn predicate(self, placeholder: &str) -> String {
        match self {
            Self::Column(_) => format!("column_id = {placeholder} AND parent_id IS NULL"),
            Self::Children(_) => format!("parent_id = {placeholder}"),
            Self::Checklist(_) => format!("card_id = {placeholder}"),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column(id) => write!(f, "column {id}"),
            Self::Children(id) => write!(f, "children of card {id}"),
            Self::Checklist(id) => write!(f, "checklist of card {id}"),
        }
    }
}

/// Returns `max(position) + 1` for the scope, or `0` when it is empty.
pub fn next_position(conn: &Connection, scope: Scope) -> BoardRepoResult<i64> {
    let sql = format!(
        "SELECT COALESCE(MAX(position), -1) + 1
         FROM {}
         WHERE {};",
        scope.table(),
        scope.predicate("?1")
    );
    let next = conn.query_row(&sql, [scope.owner_id()], |row| row.get(0))?;
    Ok(next)
}

/// Lists member IDs in display order.
pub fn member_ids(conn: &Connection, scope: Scope) -> BoardRepoResult<Vec<i64>> {
    let sql = format!(
        "SELECT id
         FROM {}
         WHERE {}
         ORDER BY position ASC, id ASC;",
        scope.table(),
        scope.predicate("?1")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([scope.owner_id()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

/// Inserts `id` into `ids` at `target_position` clamped to `0..=ids.len()`.
///
/// Returns the index used.
pub fn insert_clamped(ids: &mut Vec<i64>, id: i64, target_position: i64) -> usize {
    let upper = i64::try_from(ids.len()).unwrap_or(i64::MAX);
    let index = usize::try_from(target_position.clamp(0, upper)).unwrap_or(ids.len());
    ids.insert(index, id);
    index
}

/// Writes positions `0..N-1` following `ordered_ids`.
///
/// `ordered_ids` must contain every current member exactly once.
pub fn apply_order(conn: &Connection, scope: Scope, ordered_ids: &[i64]) -> BoardRepoResult<()> {
    let current: BTreeSet<i64> = member_ids(conn, scope)?.into_iter().collect();
    let requested: BTreeSet<i64> = ordered_ids.iter().copied().collect();
    if requested.len() != ordered_ids.len() {
        return Err(BoardRepoError::ConsistencyViolation {
            scope,
            detail: "requested order repeats a member".to_string(),
        });
    }
    if current != requested {
        return Err(BoardRepoError::ConsistencyViolation {
            scope,
            detail: format!(
                "requested order covers {} member(s), scope holds {}",
                requested.len(),
                current.len()
            ),
        });
    }

    let sql = format!(
        "UPDATE {}
         SET position = ?1
         WHERE id = ?2
           AND position <> ?1
           AND {};",
        scope.table(),
        scope.predicate("?3")
    );
    let mut stmt = conn.prepare(&sql)?;
    for (index, id) in ordered_ids.iter().enumerate() {
        let position = i64::try_from(index).map_err(|_| BoardRepoError::ConsistencyViolation {
            scope,
            detail: format!("position index {index} overflows"),
        })?;
        stmt.execute(params![position, id, scope.owner_id()])?;
    }
    Ok(())
}

/// Renumbers the scope to `0..N-1`, keeping its current relative order.
///
/// Running it twice in a row leaves positions unchanged.
pub fn reindex(conn: &Connection, scope: Scope) -> BoardRepoResult<()> {
    let ids = member_ids(conn, scope)?;
    apply_order(conn, scope, &ids)
}

/// Fails with `ConsistencyViolation` unless positions are exactly `0..N-1`.
pub fn verify_scope(conn: &Connection, scope: Scope) -> BoardRepoResult<()> {
    let sql = format!(
        "SELECT position
         FROM {}
         WHERE {}
         ORDER BY position ASC, id ASC;",
        scope.table(),
        scope.predicate("?1")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([scope.owner_id()])?;
    let mut expected: i64 = 0;
    while let Some(row) = rows.next()? {
        let position: i64 = row.get(0)?;
        if position != expected {
            return Err(BoardRepoError::ConsistencyViolation {
                scope,
                detail: format!("expected position {expected}, found {position}"),
            });
        }
        expected += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        apply_order, insert_clamped, member_ids, next_position, reindex, verify_scope, Scope,
    };
    use crate::db::open_db_in_memory;
    use crate::repo::error::BoardRepoError;
    use rusqlite::Connection;

    fn column_with_positions(positions: &[i64]) -> Connection {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO boards (id, name) VALUES (1, 'My Board');
             INSERT INTO columns (id, board_id, name, position) VALUES (1, 1, 'Todo', 0);",
        )
        .unwrap();
        for (index, position) in positions.iter().enumerate() {
            conn.execute(
                "INSERT INTO cards (column_id, title, position) VALUES (1, ?1, ?2);",
                rusqlite::params![format!("card-{index}"), position],
            )
            .unwrap();
        }
        conn
    }

    fn positions(conn: &Connection) -> Vec<(i64, i64)> {
        let mut stmt = conn
            .prepare("SELECT id, position FROM cards ORDER BY id ASC;")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn insert_clamped_bounds_target_index() {
        let mut ids = vec![10, 20];
        assert_eq!(insert_clamped(&mut ids, 30, 999), 2);
        assert_eq!(ids, vec![10, 20, 30]);

        assert_eq!(insert_clamped(&mut ids, 40, -5), 0);
        assert_eq!(ids, vec![40, 10, 20, 30]);

        let mut empty = Vec::new();
        assert_eq!(insert_clamped(&mut empty, 1, 3), 0);
        assert_eq!(empty, vec![1]);
    }

    #[test]
    fn next_position_is_zero_for_empty_scope_then_max_plus_one() {
        let conn = column_with_positions(&[]);
        assert_eq!(next_position(&conn, Scope::Column(1)).unwrap(), 0);

        let conn = column_with_positions(&[0, 4]);
        assert_eq!(next_position(&conn, Scope::Column(1)).unwrap(), 5);
    }

    #[test]
    fn reindex_closes_gaps_and_breaks_ties_by_id() {
        let conn = column_with_positions(&[5, 2, 2, 9]);
        assert!(matches!(
            verify_scope(&conn, Scope::Column(1)),
            Err(BoardRepoError::ConsistencyViolation { .. })
        ));

        reindex(&conn, Scope::Column(1)).unwrap();
        assert_eq!(positions(&conn), vec![(1, 2), (2, 0), (3, 1), (4, 3)]);
        verify_scope(&conn, Scope::Column(1)).unwrap();

        reindex(&conn, Scope::Column(1)).unwrap();
        assert_eq!(positions(&conn), vec![(1, 2), (2, 0), (3, 1), (4, 3)]);
        let members = member_ids(&conn, Scope::Column(1)).unwrap();
        assert_eq!(members, vec![2, 3, 1, 4]);
    }

    #[test]
    fn apply_order_rejects_partial_membership() {
        let conn = column_with_positions(&[0, 1, 2]);
        let err = apply_order(&conn, Scope::Column(1), &[3, 1]).unwrap_err();
        assert!(matches!(err, BoardRepoError::ConsistencyViolation { .. }));
        assert_eq!(positions(&conn), vec![(1, 0), (2, 1), (3, 2)]);
    }
}
