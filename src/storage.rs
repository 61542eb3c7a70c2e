//! Storage gateway.
//!
//! Pure bootstrap plus a narrow seam. [`connect`] is invoked once at
//! startup and fails fatally when the document store is unreachable within
//! ten seconds — no partial startup. The resulting handle is wrapped in an
//! [`AppContext`] and injected into every handler; the mongodb collection
//! handle is already safe for concurrent use, so this layer adds no locking
//! of its own.
//!
//! [`TodoStore`] is the injection seam: the request pipeline issues exactly
//! one call through it per request and never sees the driver. Production
//! uses [`MongoTodoStore`]; tests use [`MemoryTodoStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bson::doc;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use mongodb::{Client, Collection};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::StoreError;
use crate::model::TodoRecord;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared per-process application state, constructed once at bootstrap.
pub struct AppContext {
    pub store: Arc<dyn TodoStore>,
}

impl AppContext {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

// ── Storage call outcomes ─────────────────────────────────────────────────────

/// Driver acknowledgement of an insert, echoed to the client as `result`.
#[derive(Debug, Serialize)]
pub struct InsertOutcome {
    pub inserted_id: String,
}

/// Driver acknowledgement of an update.
#[derive(Debug, Serialize)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

/// Driver acknowledgement of a delete. `deleted_count` is zero when the id
/// matched nothing — still a success.
#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

// ── The seam ──────────────────────────────────────────────────────────────────

/// The storage operations the request pipeline consumes.
///
/// One method per pipeline operation. Every filter is an equality match on
/// the id, or match-all for [`find_all`](TodoStore::find_all).
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Unbounded scan of the whole collection.
    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError>;

    /// Inserts one record. The caller supplies the id and timestamps.
    async fn insert_one(&self, record: TodoRecord) -> Result<InsertOutcome, StoreError>;

    /// Sets `title` and `updated_at` on the record with the given id,
    /// upserting when no record matches. Nothing else is ever touched.
    async fn update_title(
        &self,
        id: ObjectId,
        title: String,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Deletes by id. Zero matched rows is not an error.
    async fn delete_one(&self, id: ObjectId) -> Result<DeleteOutcome, StoreError>;
}

// ── MongoDB implementation ────────────────────────────────────────────────────

/// Opens the connection and returns a handle to the configured collection.
///
/// Issues a `ping` so an unreachable store fails here, at boot, instead of
/// on the first request. Both the TCP connect and server selection are
/// bounded by ten seconds.
pub async fn connect(config: &Config) -> Result<MongoTodoStore, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.mongo_uri).await?;
    options.connect_timeout = Some(CONNECT_TIMEOUT);
    options.server_selection_timeout = Some(CONNECT_TIMEOUT);

    let client = Client::with_options(options)?;
    let database = client.database(&config.database);
    database.run_command(doc! { "ping": 1 }).await?;

    info!(
        uri = %config.mongo_uri,
        database = %config.database,
        collection = %config.collection,
        "connected to document store"
    );

    Ok(MongoTodoStore {
        collection: database.collection(&config.collection),
    })
}

/// [`TodoStore`] backed by a MongoDB collection.
pub struct MongoTodoStore {
    collection: Collection<TodoRecord>,
}

#[async_trait]
impl TodoStore for MongoTodoStore {
    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        // A cursor that fails to materialize is a distinct failure from a
        // query that never ran; the list handler treats it as fatal.
        cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Scan(e.to_string()))
    }

    async fn insert_one(&self, record: TodoRecord) -> Result<InsertOutcome, StoreError> {
        self.collection
            .insert_one(&record)
            .await
            .map(InsertOutcome::from)
            .map_err(|e| StoreError::Insert(e.to_string()))
    }

    async fn update_title(
        &self,
        id: ObjectId,
        title: String,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        let update = doc! {
            "$set": {
                "title": title,
                "updated_at": bson::DateTime::from_chrono(updated_at),
            }
        };

        self.collection
            .update_one(doc! { "_id": id }, update)
            .upsert(true)
            .await
            .map(UpdateOutcome::from)
            .map_err(|e| StoreError::Update(e.to_string()))
    }

    async fn delete_one(&self, id: ObjectId) -> Result<DeleteOutcome, StoreError> {
        self.collection
            .delete_one(doc! { "_id": id })
            .await
            .map(DeleteOutcome::from)
            .map_err(|e| StoreError::Delete(e.to_string()))
    }
}

impl From<InsertOneResult> for InsertOutcome {
    fn from(result: InsertOneResult) -> Self {
        let inserted_id = result
            .inserted_id
            .as_object_id()
            .map_or_else(|| result.inserted_id.to_string(), |id| id.to_hex());
        Self { inserted_id }
    }
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(result: UpdateResult) -> Self {
        Self {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result
                .upserted_id
                .and_then(|id| id.as_object_id().map(|id| id.to_hex())),
        }
    }
}

impl From<DeleteResult> for DeleteOutcome {
    fn from(result: DeleteResult) -> Self {
        Self { deleted_count: result.deleted_count }
    }
}

// ── In-memory implementation ──────────────────────────────────────────────────

/// [`TodoStore`] over a mutex-guarded map. The test double promised by the
/// injection seam; it mirrors the backend's observable semantics, including
/// upsert-on-update and zero-row deletes.
#[derive(Default)]
pub struct MemoryTodoStore {
    records: Mutex<HashMap<ObjectId, TodoRecord>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        let mut all: Vec<TodoRecord> = records.values().cloned().collect();
        all.sort_by_key(|r| r.created_at);
        Ok(all)
    }

    async fn insert_one(&self, record: TodoRecord) -> Result<InsertOutcome, StoreError> {
        let inserted_id = record.id.to_hex();
        let mut records = self.records.lock().expect("store mutex poisoned");
        records.insert(record.id, record);
        Ok(InsertOutcome { inserted_id })
    }

    async fn update_title(
        &self,
        id: ObjectId,
        title: String,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        match records.get_mut(&id) {
            Some(record) => {
                record.title = title;
                record.updated_at = updated_at;
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: 1,
                    upserted_id: None,
                })
            }
            None => {
                records.insert(
                    id,
                    TodoRecord {
                        id,
                        title,
                        is_completed: false,
                        created_at: updated_at,
                        updated_at,
                    },
                );
                Ok(UpdateOutcome {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: Some(id.to_hex()),
                })
            }
        }
    }

    async fn delete_one(&self, id: ObjectId) -> Result<DeleteOutcome, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let deleted_count = u64::from(records.remove(&id).is_some());
        Ok(DeleteOutcome { deleted_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> TodoRecord {
        let now = Utc::now();
        TodoRecord {
            id: ObjectId::new(),
            title: title.to_owned(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn memory_store_round_trips_a_record() {
        let store = MemoryTodoStore::new();
        let r = record("buy milk");
        let id = r.id;

        store.insert_one(r).await.unwrap();
        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
    }

    #[tokio::test]
    async fn memory_store_update_touches_title_and_timestamp_only() {
        let store = MemoryTodoStore::new();
        let r = record("before");
        let id = r.id;
        let created_at = r.created_at;
        store.insert_one(r).await.unwrap();

        let later = Utc::now() + chrono::Duration::seconds(1);
        let outcome = store
            .update_title(id, "after".to_owned(), later)
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert!(outcome.upserted_id.is_none());

        let all = store.find_all().await.unwrap();
        assert_eq!(all[0].title, "after");
        assert_eq!(all[0].created_at, created_at);
        assert_eq!(all[0].updated_at, later);
        assert!(!all[0].is_completed);
    }

    #[tokio::test]
    async fn memory_store_upserts_unknown_id() {
        let store = MemoryTodoStore::new();
        let id = ObjectId::new();

        let outcome = store
            .update_title(id, "fresh".to_owned(), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.upserted_id, Some(id.to_hex()));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn memory_store_delete_is_idempotent() {
        let store = MemoryTodoStore::new();
        let outcome = store.delete_one(ObjectId::new()).await.unwrap();
        assert_eq!(outcome.deleted_count, 0);
    }
}
