#![allow(dead_code)]

use kanban_core::{BoardService, Card, ChecklistItem, ColumnId, CreateCardRequest, SqliteBoardStore};
use rusqlite::Connection;

pub const TODO: ColumnId = 1;
pub const DOING: ColumnId = 2;
pub const DONE: ColumnId = 3;

pub type Service<'conn> = BoardService<SqliteBoardStore<'conn>>;

pub fn seeded_service(conn: &Connection) -> Service<'_> {
    let store = SqliteBoardStore::try_new(conn).unwrap();
    let service = BoardService::new(store);
    service.ensure_seed().unwrap();
    service
}

pub fn add_card(service: &Service<'_>, column_id: ColumnId, title: &str) -> Card {
    service
        .create_card(&CreateCardRequest {
            column_id,
            title: title.to_string(),
            ..CreateCardRequest::default()
        })
        .unwrap()
}

pub fn add_child(service: &Service<'_>, parent: &Card, title: &str) -> Card {
    service
        .create_card(&CreateCardRequest {
            column_id: parent.column_id,
            parent_id: Some(parent.id),
            title: title.to_string(),
            ..CreateCardRequest::default()
        })
        .unwrap()
}

pub fn add_item(service: &Service<'_>, card: &Card, text: &str) -> ChecklistItem {
    service.add_checklist_item(card.id, text).unwrap()
}

/// `(id, position)` pairs of a column's top-level cards in display order.
pub fn column_layout(service: &Service<'_>, column_id: ColumnId) -> Vec<(i64, i64)> {
    service
        .list_cards(Some(column_id))
        .unwrap()
        .into_iter()
        .map(|summary| (summary.card.id, summary.card.position))
        .collect()
}

pub fn positions_are_dense(layout: &[(i64, i64)]) -> bool {
    layout
        .iter()
        .enumerate()
        .all(|(index, (_, position))| *position == index as i64)
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table};");
    conn.query_row(&sql, [], |row| row.get(0)).unwrap()
}
