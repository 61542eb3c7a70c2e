//! Todo record and wire types.
//!
//! Two shapes for the same thing:
//!
//! - [`TodoRecord`] — the persisted document. `_id` is a BSON ObjectId and
//!   the timestamps serialize as BSON datetimes so the driver stores real
//!   dates, not strings.
//! - [`Todo`] — the wire form. The id is hex, the timestamps are RFC 3339.
//!
//! Inbound payloads get their own structs because the contract differs per
//! operation: create requires a title, update tolerates its absence (and
//! rejects it with a 400 of its own).

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A todo document as stored in the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub is_completed: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// A todo as it appears in responses.
#[derive(Debug, Clone, Serialize)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TodoRecord> for Todo {
    fn from(record: &TodoRecord) -> Self {
        Self {
            id: record.id.to_hex(),
            title: record.title.clone(),
            is_completed: record.is_completed,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Inbound body for `POST /todo`.
///
/// Only `title` is required. `is_completed` is accepted for wire
/// compatibility but ignored — a new todo always starts incomplete — and
/// any client-supplied timestamps are dropped (server-assigned).
#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub is_completed: bool,
}

/// Inbound body for `PUT`/`PATCH /todo/{id}`.
///
/// A missing title deserializes as empty and is rejected by the handler,
/// matching the "Title is required" contract. Update can change nothing but
/// the title; completion status is deliberately out of its reach.
#[derive(Debug, Deserialize)]
pub struct UpdateTodo {
    #[serde(default)]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_renders_hex_id() {
        let now = Utc::now();
        let record = TodoRecord {
            id: ObjectId::new(),
            title: "buy milk".to_owned(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        };

        let todo = Todo::from(&record);
        assert_eq!(todo.id, record.id.to_hex());
        assert_eq!(todo.id.len(), 24);
        assert_eq!(todo.title, "buy milk");
        assert!(!todo.is_completed);
    }

    #[test]
    fn wire_form_serializes_id_as_underscore_id() {
        let now = Utc::now();
        let record = TodoRecord {
            id: ObjectId::new(),
            title: "t".to_owned(),
            is_completed: true,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(Todo::from(&record)).unwrap();
        assert!(value.get("_id").is_some());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn create_payload_defaults_is_completed() {
        let payload: CreateTodo = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert!(!payload.is_completed);
    }

    #[test]
    fn create_payload_requires_title() {
        let err = serde_json::from_str::<CreateTodo>("{}").unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn update_payload_tolerates_missing_title() {
        let payload: UpdateTodo = serde_json::from_str("{}").unwrap();
        assert!(payload.title.is_empty());
    }
}
