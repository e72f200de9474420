//! Cascade-delete walks over the card hierarchy.
//!
//! Deletes are issued children-first so no row is ever removed while a
//! dependent still points at it. The schema's `ON DELETE CASCADE` clauses are
//! a backstop, not the mechanism.

use crate::model::board::{CascadeSummary, ColumnId};
use crate::model::card::CardId;
use crate::repo::error::BoardRepoResult;
use rusqlite::Connection;

/// Card and all of its descendants, deepest first (the card itself last).
pub(crate) fn card_subtree(conn: &Connection, card_id: CardId) -> BoardRepoResult<Vec<CardId>> {
    collect_deepest_first(
        conn,
        "WITH RECURSIVE subtree(id, depth) AS (
            SELECT id, 0
            FROM cards
            WHERE id = ?1
            UNION ALL
            SELECT child.id, parent.depth + 1
            FROM cards child
            INNER JOIN subtree parent ON child.parent_id = parent.id
         )
         SELECT id
         FROM subtree
         GROUP BY id
         ORDER BY MAX(depth) DESC, id DESC;",
        card_id,
    )
}

/// Every card scoped to the column plus any descendant, deepest first.
pub(crate) fn column_cards(conn: &Connection, column_id: ColumnId) -> BoardRepoResult<Vec<CardId>> {
    collect_deepest_first(
        conn,
        "WITH RECURSIVE doomed(id, depth) AS (
            SELECT id, 0
            FROM cards
            WHERE column_id = ?1
            UNION ALL
            SELECT child.id, parent.depth + 1
            FROM cards child
            INNER JOIN doomed parent ON child.parent_id = parent.id
         )
         SELECT id
         FROM doomed
         GROUP BY id
         ORDER BY MAX(depth) DESC, id DESC;",
        column_id,
    )
}

/// Deletes checklist items, then the cards, in the given order.
pub(crate) fn purge_cards(
    conn: &Connection,
    card_ids: &[CardId],
) -> BoardRepoResult<CascadeSummary> {
    let mut summary = CascadeSummary::default();
    let mut delete_items = conn.prepare("DELETE FROM checklist_items WHERE card_id = ?1;")?;
    let mut delete_card = conn.prepare("DELETE FROM cards WHERE id = ?1;")?;
    for card_id in card_ids {
        summary.checklist_items += delete_items.execute([card_id])?;
        summary.cards += delete_card.execute([card_id])?;
    }
    Ok(summary)
}

/// Deletes a column with every card scoped to it.
pub(crate) fn purge_column(
    conn: &Connection,
    column_id: ColumnId,
) -> BoardRepoResult<CascadeSummary> {
    let card_ids = column_cards(conn, column_id)?;
    let mut summary = purge_cards(conn, &card_ids)?;
    summary.columns = conn.execute("DELETE FROM columns WHERE id = ?1;", [column_id])?;
    Ok(summary)
}

fn collect_deepest_first(conn: &Connection, sql: &str, root: i64) -> BoardRepoResult<Vec<CardId>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([root])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}
