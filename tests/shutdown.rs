//! Lifecycle tests: the shutdown handshake and the bounded drain.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use tokio::net::TcpStream;
use tudu::StoreError;
use tudu::TodoRecord;
use tudu::storage::{DeleteOutcome, InsertOutcome, TodoStore, UpdateOutcome};

use common::{request_json, spawn, spawn_with};

/// A store whose scan takes `delay` to answer, to keep a request in flight
/// while the server drains.
struct SlowStore {
    delay: Duration,
}

#[async_trait]
impl TodoStore for SlowStore {
    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn insert_one(&self, record: TodoRecord) -> Result<InsertOutcome, StoreError> {
        Ok(InsertOutcome { inserted_id: record.id.to_hex() })
    }

    async fn update_title(
        &self,
        _id: ObjectId,
        _title: String,
        _updated_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        Ok(UpdateOutcome { matched_count: 0, modified_count: 0, upserted_id: None })
    }

    async fn delete_one(&self, _id: ObjectId) -> Result<DeleteOutcome, StoreError> {
        Ok(DeleteOutcome { deleted_count: 0 })
    }
}

#[tokio::test]
async fn shutdown_stops_accepting_new_connections() {
    let server = spawn().await;
    let addr = server.addr;

    // Sanity: the server answers before shutdown.
    let (status, _) = request_json(addr, "GET", "/todo", None).await;
    assert_eq!(status, 200);

    server.shutdown().await;

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn inflight_request_completes_during_drain() {
    let server = spawn_with(Arc::new(SlowStore { delay: Duration::from_millis(300) })).await;
    let addr = server.addr;

    let inflight = tokio::spawn(async move { request_json(addr, "GET", "/todo", None).await });

    // Let the request reach the handler, then pull the plug.
    tokio::time::sleep(Duration::from_millis(50)).await;
    server.shutdown().await;

    let (status, response) = inflight.await.unwrap();
    assert_eq!(status, 200);
    assert!(response["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn drain_bound_expires_when_a_request_stalls() {
    // The scan stalls well past the five-second drain bound; the server must
    // come back regardless, abandoning the stuck request.
    let server = spawn_with(Arc::new(SlowStore { delay: Duration::from_secs(60) })).await;
    let addr = server.addr;

    let _inflight = tokio::spawn(async move { request_json(addr, "GET", "/todo", None).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    server.shutdown().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(5), "drain returned before the bound: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(7), "drain overshot the bound: {elapsed:?}");
}
