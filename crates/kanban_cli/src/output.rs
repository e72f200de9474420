//! JSON envelopes printed by every command.
//!
//! Success: `{"success": true, ...fields}`.
//! Failure: `{"success": false, "error": "...", "code": "..."}`.

use kanban_core::{format_due_at, BoardServiceError, Card, ChecklistItem, ColumnId, ColumnKey};
use serde_json::{json, Map, Value};

pub fn success(fields: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(true));
    if let Value::Object(fields) = fields {
        envelope.extend(fields);
    }
    Value::Object(envelope)
}

pub fn failure(err: &anyhow::Error) -> Value {
    json!({
        "success": false,
        "error": format!("{err:#}"),
        "code": error_code(err),
    })
}

fn error_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<BoardServiceError>()
        .map(BoardServiceError::code)
        .unwrap_or("error")
}

/// Lowercase column label, falling back to the raw id for unseeded columns.
pub fn column_label(column_id: ColumnId) -> Value {
    match ColumnKey::from_id(column_id) {
        Some(key) => Value::from(key.label()),
        None => Value::from(column_id),
    }
}

pub fn card_json(card: &Card) -> Value {
    json!({
        "id": card.id,
        "title": card.title,
        "notes": card.notes,
        "column": column_label(card.column_id),
        "parent_id": card.parent_id,
        "position": card.position,
        "due_at": card.due_at.and_then(format_due_at),
    })
}

pub fn checklist_json(item: &ChecklistItem) -> Value {
    json!({
        "item_id": item.id,
        "card_id": item.card_id,
        "text": item.text,
        "done": item.done,
        "position": item.position,
    })
}

#[cfg(test)]
mod tests {
    use super::{column_label, failure, success};
    use kanban_core::{BoardServiceError, EntityKind};
    use serde_json::json;

    #[test]
    fn success_merges_fields_after_flag() {
        let envelope = success(json!({ "count": 2 }));
        assert_eq!(envelope, json!({ "success": true, "count": 2 }));
    }

    #[test]
    fn failure_carries_service_error_code() {
        let err = anyhow::Error::new(BoardServiceError::NotFound {
            kind: EntityKind::Card,
            id: 9,
        });
        let envelope = failure(&err);
        assert_eq!(envelope["success"], json!(false));
        assert_eq!(envelope["code"], json!("not_found"));
        assert_eq!(envelope["error"], json!("card not found: 9"));
    }

    #[test]
    fn column_label_uses_seeded_keys() {
        assert_eq!(column_label(2), json!("doing"));
        assert_eq!(column_label(42), json!(42));
    }
}
