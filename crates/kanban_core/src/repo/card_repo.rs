//! Card repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create, update, delete and move cards while keeping every sibling scope
//!   numbered `0..N-1`.
//! - Enforce column/parent references and the one-level nesting rule.
//!
//! # Invariants
//! - Each write method is exactly one `IMMEDIATE` transaction; scopes touched
//!   by the write are verified before commit.
//! - A child card shares its parent's column. Moving a parent carries the
//!   subtree's `column_id` along.
//! - Only top-level cards change columns; children are reordered in place.

use crate::model::board::ColumnId;
use crate::model::card::{Card, CardDeletion, CardId, CardMove, CardSummary, CardUpdate, NewCard};
use crate::repo::cascade::{card_subtree, purge_cards};
use crate::repo::error::{BoardRepoError, BoardRepoResult, EntityKind};
use crate::repo::ordering::{
    apply_order, insert_clamped, member_ids, next_position, reindex, verify_scope, Scope,
};
use crate::repo::store::{
    load_card, parse_card_row, query_cards, require_card, require_column_reference,
    SqliteBoardStore, CARD_SELECT_SQL,
};
use rusqlite::{params, Connection};

/// Repository interface for card operations.
pub trait CardRepository {
    /// Appends one card to the end of its scope.
    fn create_card(&self, card: &NewCard) -> BoardRepoResult<Card>;
    /// Loads one card by id.
    fn get_card(&self, card_id: CardId) -> BoardRepoResult<Option<Card>>;
    /// Overwrites only the fields present in `update`.
    fn update_card(&self, card_id: CardId, update: &CardUpdate) -> BoardRepoResult<Card>;
    /// Deletes a card with its descendants and checklist items.
    fn delete_card(&self, card_id: CardId) -> BoardRepoResult<CardDeletion>;
    /// Moves a card to `target_position` (clamped) in the target column.
    fn move_card(
        &self,
        card_id: CardId,
        target_column_id: ColumnId,
        target_position: i64,
    ) -> BoardRepoResult<CardMove>;
    /// Lists direct children in display order.
    fn list_children(&self, card_id: CardId) -> BoardRepoResult<Vec<Card>>;
    /// Lists top-level cards by column position, then card position.
    fn list_top_level(&self, column_id: Option<ColumnId>) -> BoardRepoResult<Vec<CardSummary>>;
}

impl CardRepository for SqliteBoardStore<'_> {
    fn create_card(&self, card: &NewCard) -> BoardRepoResult<Card> {
        let tx = self.write_tx()?;
        require_column_reference(&tx, card.column_id)?;

        if let Some(parent_id) = card.parent_id {
            let parent = load_card(&tx, parent_id)?
                .ok_or_else(|| BoardRepoError::invalid_reference(EntityKind::Card, parent_id))?;
            if !parent.is_top_level() {
                return Err(BoardRepoError::InvalidInput(format!(
                    "card {parent_id} is already a child card; cards nest one level deep"
                )));
            }
            if parent.column_id != card.column_id {
                return Err(BoardRepoError::InvalidInput(format!(
                    "child card must be created in its parent's column {}",
                    parent.column_id
                )));
            }
        }

        let scope = Scope::for_card(card.column_id, card.parent_id);
        let position = next_position(&tx, scope)?;
        tx.execute(
            "INSERT INTO cards (column_id, parent_id, title, notes, due_at, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                card.column_id,
                card.parent_id,
                card.title.as_str(),
                card.notes.as_str(),
                card.due_at,
                position,
            ],
        )?;
        let card_id = tx.last_insert_rowid();
        verify_scope(&tx, scope)?;

        let created = require_card(&tx, card_id)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_card(&self, card_id: CardId) -> BoardRepoResult<Option<Card>> {
        load_card(self.conn(), card_id)
    }

    fn update_card(&self, card_id: CardId, update: &CardUpdate) -> BoardRepoResult<Card> {
        let tx = self.write_tx()?;
        let current = require_card(&tx, card_id)?;
        if update.is_empty() {
            return Ok(current);
        }

        let title = update.title.as_deref().unwrap_or(current.title.as_str());
        let notes = update.notes.as_deref().unwrap_or(current.notes.as_str());
        let due_at = update.due_at.unwrap_or(current.due_at);
        tx.execute(
            "UPDATE cards
             SET title = ?2,
                 notes = ?3,
                 due_at = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![card_id, title, notes, due_at],
        )?;

        let updated = require_card(&tx, card_id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_card(&self, card_id: CardId) -> BoardRepoResult<CardDeletion> {
        let tx = self.write_tx()?;
        let card = require_card(&tx, card_id)?;
        let vacated = Scope::for_card(card.column_id, card.parent_id);

        let subtree = card_subtree(&tx, card_id)?;
        let summary = purge_cards(&tx, &subtree)?;
        reindex(&tx, vacated)?;
        verify_scope(&tx, vacated)?;
        tx.commit()?;

        Ok(CardDeletion {
            card_id,
            removed_children: summary.cards.saturating_sub(1),
            removed_checklist_items: summary.checklist_items,
        })
    }

    fn move_card(
        &self,
        card_id: CardId,
        target_column_id: ColumnId,
        target_position: i64,
    ) -> BoardRepoResult<CardMove> {
        let tx = self.write_tx()?;
        let card = require_card(&tx, card_id)?;
        require_column_reference(&tx, target_column_id)?;

        let moved = match card.parent_id {
            Some(parent_id) => {
                if target_column_id != card.column_id {
                    return Err(BoardRepoError::InvalidInput(format!(
                        "child card {card_id} moves with its parent {parent_id}; \
                         only reordering within column {} is allowed",
                        card.column_id
                    )));
                }
                reorder_within(&tx, Scope::Children(parent_id), card_id, target_position)?
            }
            None => move_top_level(&tx, &card, target_column_id, target_position)?,
        };
        tx.commit()?;

        Ok(CardMove {
            card_id,
            from_column_id: card.column_id,
            to_column_id: target_column_id,
            position: moved,
        })
    }

    fn list_children(&self, card_id: CardId) -> BoardRepoResult<Vec<Card>> {
        let tx = self.read_tx()?;
        require_card(&tx, card_id)?;
        let children = query_cards(
            &tx,
            &format!("{CARD_SELECT_SQL} WHERE parent_id = ?1 ORDER BY position ASC, id ASC;"),
            [card_id],
        )?;
        tx.commit()?;
        Ok(children)
    }

    fn list_top_level(&self, column_id: Option<ColumnId>) -> BoardRepoResult<Vec<CardSummary>> {
        let tx = self.read_tx()?;
        let summaries = {
            let mut stmt = tx.prepare(
                "SELECT
                    c.id AS id,
                    c.column_id AS column_id,
                    c.parent_id AS parent_id,
                    c.title AS title,
                    c.notes AS notes,
                    c.due_at AS due_at,
                    c.position AS position,
                    c.created_at AS created_at,
                    c.updated_at AS updated_at,
                    (SELECT COUNT(*) FROM cards child WHERE child.parent_id = c.id)
                        AS child_count,
                    (SELECT COUNT(*) FROM checklist_items i WHERE i.card_id = c.id)
                        AS checklist_count,
                    (SELECT COUNT(*) FROM checklist_items i WHERE i.card_id = c.id AND i.done = 1)
                        AS checklist_done
                 FROM cards c
                 INNER JOIN columns col ON col.id = c.column_id
                 WHERE c.parent_id IS NULL
                   AND (?1 IS NULL OR c.column_id = ?1)
                 ORDER BY col.position ASC, col.id ASC, c.position ASC, c.id ASC;",
            )?;
            let mut rows = stmt.query([column_id])?;
            let mut summaries = Vec::new();
            while let Some(row) = rows.next()? {
                summaries.push(CardSummary {
                    card: parse_card_row(row)?,
                    child_count: count_column(row.get("child_count")?)?,
                    checklist_count: count_column(row.get("checklist_count")?)?,
                    checklist_done: count_column(row.get("checklist_done")?)?,
                });
            }
            summaries
        };
        tx.commit()?;
        Ok(summaries)
    }
}

/// Removes the card from its column scope and inserts it into the target
/// column scope, reindexing both. Returns the final index.
fn move_top_level(
    conn: &Connection,
    card: &Card,
    target_column_id: ColumnId,
    target_position: i64,
) -> BoardRepoResult<i64> {
    let source = Scope::Column(card.column_id);
    let target = Scope::Column(target_column_id);
    if source == target {
        return reorder_within(conn, target, card.id, target_position);
    }

    let mut target_ids = member_ids(conn, target)?;
    let index = insert_clamped(&mut target_ids, card.id, target_position);

    conn.execute(
        "UPDATE cards
         SET column_id = ?2,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![card.id, target_column_id],
    )?;
    // Descendants follow the parent so column cascades stay complete.
    conn.execute(
        "WITH RECURSIVE descendants(id) AS (
            SELECT id FROM cards WHERE parent_id = ?1
            UNION ALL
            SELECT child.id
            FROM cards child
            INNER JOIN descendants parent ON child.parent_id = parent.id
         )
         UPDATE cards
         SET column_id = ?2
         WHERE id IN (SELECT id FROM descendants);",
        params![card.id, target_column_id],
    )?;

    apply_order(conn, target, &target_ids)?;
    reindex(conn, source)?;
    verify_scope(conn, target)?;
    verify_scope(conn, source)?;
    index_to_position(index)
}

/// Remove-then-reinsert inside a single scope.
fn reorder_within(
    conn: &Connection,
    scope: Scope,
    card_id: CardId,
    target_position: i64,
) -> BoardRepoResult<i64> {
    let mut ids = member_ids(conn, scope)?;
    ids.retain(|id| *id != card_id);
    let index = insert_clamped(&mut ids, card_id, target_position);
    apply_order(conn, scope, &ids)?;
    verify_scope(conn, scope)?;
    index_to_position(index)
}

fn index_to_position(index: usize) -> BoardRepoResult<i64> {
    i64::try_from(index)
        .map_err(|_| BoardRepoError::InvalidData(format!("position index {index} overflows")))
}

fn count_column(value: i64) -> BoardRepoResult<usize> {
    usize::try_from(value)
        .map_err(|_| BoardRepoError::InvalidData(format!("negative count `{value}`")))
}
