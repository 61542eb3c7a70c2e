//! The todo request pipeline.
//!
//! Each operation walks the same line: validate, issue exactly one storage
//! call, map the outcome to a status and a JSON body. Nothing is retained
//! between requests; the only shared state is the injected storage handle.
//!
//! Storage calls are bounded per operation — ten seconds for the list scan,
//! five for the writes. A timeout surfaces as the same 500 the backend's
//! own failure would.

use std::sync::Arc;
use std::time::Duration;

use bson::oid::ObjectId;
use chrono::Utc;
use http::StatusCode;
use serde_json::json;
use tokio::time::timeout;
use tracing::error;

use crate::error::StoreError;
use crate::model::{CreateTodo, Todo, TodoRecord, UpdateTodo};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::storage::AppContext;

const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

const HOME_PAGE: &str = include_str!("../static/home.html");

/// The application route table: home page plus the todo resource mounted
/// under `/todo`.
pub fn routes() -> Router {
    let todos = Router::new()
        .get("/", list_todos)
        .post("/", create_todo)
        .put("/{id}", update_todo)
        .patch("/{id}", update_todo)
        .delete("/{id}", delete_todo);

    Router::new().get("/", home).mount("/todo", todos)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn home(_req: Request, _ctx: Arc<AppContext>) -> Response {
    Response::html(HOME_PAGE)
}

/// `GET /todo` — every record in the collection, oldest first not
/// guaranteed.
async fn list_todos(_req: Request, ctx: Arc<AppContext>) -> Response {
    let records = match timeout(LIST_TIMEOUT, ctx.store.find_all()).await {
        Ok(Ok(records)) => records,
        Ok(Err(StoreError::Scan(e))) => {
            // A query that ran but whose results cannot be read means the
            // collection holds documents this build cannot represent.
            // Surfacing that as a 500 would report it once per request
            // forever; treat it as unrecoverable instead.
            error!(error = %e, "todo scan failed, terminating");
            std::process::exit(1);
        }
        Ok(Err(e)) => {
            return Response::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "message": "Failed to fetch todo", "error": e.to_string() }),
            );
        }
        Err(_) => {
            return Response::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "message": "Failed to fetch todo", "error": "query timed out" }),
            );
        }
    };

    let data: Vec<Todo> = records.iter().map(Todo::from).collect();
    Response::json(StatusCode::OK, &json!({ "data": data }))
}

/// `POST /todo` — validate, stamp, insert.
async fn create_todo(req: Request, ctx: Arc<AppContext>) -> Response {
    let payload: CreateTodo = match serde_json::from_slice(req.body()) {
        Ok(payload) => payload,
        Err(e) if e.is_data() => {
            return Response::json(
                StatusCode::BAD_REQUEST,
                &json!({ "message": "Error parsing your request", "error": e.to_string() }),
            );
        }
        Err(e) => {
            return Response::json(
                StatusCode::BAD_REQUEST,
                &json!({ "message": "Invalid request body", "error": e.to_string() }),
            );
        }
    };

    if payload.title.trim().is_empty() {
        return Response::json(
            StatusCode::BAD_REQUEST,
            &json!({ "message": "Title is required" }),
        );
    }

    let now = Utc::now();
    let record = TodoRecord {
        id: ObjectId::new(),
        title: payload.title,
        is_completed: false,
        created_at: now,
        updated_at: now,
    };
    let todo_id = record.id.to_hex();

    match timeout(WRITE_TIMEOUT, ctx.store.insert_one(record)).await {
        Ok(Ok(result)) => Response::json(
            StatusCode::CREATED,
            &json!({
                "message": "Todo creation successful",
                "result": result,
                "todo_id": todo_id,
            }),
        ),
        Ok(Err(e)) => Response::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "message": "Todo Creation failed", "error": e.to_string() }),
        ),
        Err(_) => Response::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "message": "Todo Creation failed", "error": "insert timed out" }),
        ),
    }
}

/// `PUT`/`PATCH /todo/{id}` — retitle a record, refreshing `updated_at`.
///
/// Completion status is deliberately out of reach here; the only mutable
/// field is the title. The id must parse before any storage call happens.
async fn update_todo(req: Request, ctx: Arc<AppContext>) -> Response {
    let raw_id = req.param("id").unwrap_or_default().trim().to_owned();
    let id = match ObjectId::parse_str(&raw_id) {
        Ok(id) => id,
        Err(e) => {
            return Response::json(
                StatusCode::BAD_REQUEST,
                &json!({ "message": "Error Parsing your request", "error": e.to_string() }),
            );
        }
    };

    let payload: UpdateTodo = match serde_json::from_slice(req.body()) {
        Ok(payload) => payload,
        Err(e) => {
            return Response::json(
                StatusCode::BAD_REQUEST,
                &json!({ "message": "Invalid request body", "error": e.to_string() }),
            );
        }
    };

    if payload.title.trim().is_empty() {
        return Response::json(
            StatusCode::BAD_REQUEST,
            &json!({ "message": "Title is required" }),
        );
    }

    match timeout(WRITE_TIMEOUT, ctx.store.update_title(id, payload.title, Utc::now())).await {
        Ok(Ok(result)) => Response::json(
            StatusCode::OK,
            &json!({
                "message": "Update Successful",
                "todo_id": raw_id,
                "result": result,
            }),
        ),
        Ok(Err(e)) => Response::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "message": "Update Failed", "error": e.to_string() }),
        ),
        Err(_) => Response::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "message": "Update Failed", "error": "update timed out" }),
        ),
    }
}

/// `DELETE /todo/{id}` — idempotent: deleting an id that matches nothing
/// still succeeds with a zero count.
async fn delete_todo(req: Request, ctx: Arc<AppContext>) -> Response {
    let raw_id = req.param("id").unwrap_or_default().trim().to_owned();
    let id = match ObjectId::parse_str(&raw_id) {
        Ok(id) => id,
        Err(e) => {
            return Response::json(
                StatusCode::BAD_REQUEST,
                &json!({ "message": "Error Parsing your request", "error": e.to_string() }),
            );
        }
    };

    match timeout(WRITE_TIMEOUT, ctx.store.delete_one(id)).await {
        Ok(Ok(result)) => Response::json(
            StatusCode::OK,
            &json!({
                "message": "Todo deletion successful",
                "todo_id": raw_id,
                "result": result,
            }),
        ),
        Ok(Err(e)) => Response::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "message": "Error deleting the todo", "error": e.to_string() }),
        ),
        Err(_) => Response::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "message": "Error deleting the todo", "error": "delete timed out" }),
        ),
    }
}
