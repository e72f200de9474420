//! Checklist repository contract and SQLite implementation.
//!
//! # Invariants
//! - Items are ordered per card; positions stay `0..N-1` after add, delete
//!   and move.
//! - Deleting an item reindexes the remaining items of its card.

use crate::model::card::{CardId, ChecklistItem, ChecklistItemId};
use crate::repo::error::{BoardRepoError, BoardRepoResult, EntityKind};
use crate::repo::ordering::{
    apply_order, insert_clamped, member_ids, next_position, reindex, verify_scope, Scope,
};
use crate::repo::store::{
    load_card, load_checklist_item, query_checklist_items, require_card, SqliteBoardStore,
    CHECKLIST_SELECT_SQL,
};
use rusqlite::{params, Connection};

/// Repository interface for checklist operations.
pub trait ChecklistRepository {
    /// Appends one item to the card's checklist.
    fn add_item(&self, card_id: CardId, text: &str) -> BoardRepoResult<ChecklistItem>;
    /// Flips `done` on one item.
    fn toggle_item(&self, item_id: ChecklistItemId) -> BoardRepoResult<ChecklistItem>;
    /// Deletes one item and closes the gap it leaves.
    fn delete_item(&self, item_id: ChecklistItemId) -> BoardRepoResult<ChecklistItem>;
    /// Moves one item to `target_position` (clamped) on the target card.
    fn move_item(
        &self,
        item_id: ChecklistItemId,
        target_card_id: CardId,
        target_position: i64,
    ) -> BoardRepoResult<ChecklistItem>;
    /// Lists a card's checklist in display order.
    fn list_items(&self, card_id: CardId) -> BoardRepoResult<Vec<ChecklistItem>>;
}

impl ChecklistRepository for SqliteBoardStore<'_> {
    fn add_item(&self, card_id: CardId, text: &str) -> BoardRepoResult<ChecklistItem> {
        let tx = self.write_tx()?;
        require_card(&tx, card_id)?;

        let scope = Scope::Checklist(card_id);
        let position = next_position(&tx, scope)?;
        tx.execute(
            "INSERT INTO checklist_items (card_id, text, done, position)
             VALUES (?1, ?2, 0, ?3);",
            params![card_id, text, position],
        )?;
        let item_id = tx.last_insert_rowid();
        verify_scope(&tx, scope)?;

        let item = require_item(&tx, item_id)?;
        tx.commit()?;
        Ok(item)
    }

    fn toggle_item(&self, item_id: ChecklistItemId) -> BoardRepoResult<ChecklistItem> {
        let tx = self.write_tx()?;
        let changed = tx.execute(
            "UPDATE checklist_items SET done = 1 - done WHERE id = ?1;",
            [item_id],
        )?;
        if changed == 0 {
            return Err(BoardRepoError::not_found(EntityKind::ChecklistItem, item_id));
        }
        let item = require_item(&tx, item_id)?;
        tx.commit()?;
        Ok(item)
    }

    fn delete_item(&self, item_id: ChecklistItemId) -> BoardRepoResult<ChecklistItem> {
        let tx = self.write_tx()?;
        let item = require_item(&tx, item_id)?;
        let scope = Scope::Checklist(item.card_id);

        tx.execute("DELETE FROM checklist_items WHERE id = ?1;", [item_id])?;
        reindex(&tx, scope)?;
        verify_scope(&tx, scope)?;
        tx.commit()?;
        Ok(item)
    }

    fn move_item(
        &self,
        item_id: ChecklistItemId,
        target_card_id: CardId,
        target_position: i64,
    ) -> BoardRepoResult<ChecklistItem> {
        let tx = self.write_tx()?;
        let item = require_item(&tx, item_id)?;
        if load_card(&tx, target_card_id)?.is_none() {
            return Err(BoardRepoError::invalid_reference(EntityKind::Card, target_card_id));
        }

        let source = Scope::Checklist(item.card_id);
        let target = Scope::Checklist(target_card_id);
        let mut target_ids = member_ids(&tx, target)?;
        target_ids.retain(|id| *id != item_id);
        insert_clamped(&mut target_ids, item_id, target_position);

        if source != target {
            tx.execute(
                "UPDATE checklist_items SET card_id = ?2 WHERE id = ?1;",
                params![item_id, target_card_id],
            )?;
        }
        apply_order(&tx, target, &target_ids)?;
        verify_scope(&tx, target)?;
        if source != target {
            reindex(&tx, source)?;
            verify_scope(&tx, source)?;
        }

        let moved = require_item(&tx, item_id)?;
        tx.commit()?;
        Ok(moved)
    }

    fn list_items(&self, card_id: CardId) -> BoardRepoResult<Vec<ChecklistItem>> {
        let tx = self.read_tx()?;
        require_card(&tx, card_id)?;
        let items = query_checklist_items(
            &tx,
            &format!("{CHECKLIST_SELECT_SQL} WHERE card_id = ?1 ORDER BY position ASC, id ASC;"),
            [card_id],
        )?;
        tx.commit()?;
        Ok(items)
    }
}

fn require_item(conn: &Connection, item_id: ChecklistItemId) -> BoardRepoResult<ChecklistItem> {
    load_checklist_item(conn, item_id)?
        .ok_or_else(|| BoardRepoError::not_found(EntityKind::ChecklistItem, item_id))
}
