//! # tudu
//!
//! A minimal todo HTTP API backed by a MongoDB document store.
//! Four operations over one collection. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! MongoDB owns persistence — durability, concurrency control, indexing.
//! tudu does not re-arbitrate any of it. The store does store things. The
//! service validates, issues exactly one storage call per request, and maps
//! the outcome to an HTTP status and a JSON body.
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | `GET` | `/` | 200 home page |
//! | `GET` | `/todo` | 200 `{data: [todo]}` |
//! | `POST` | `/todo` | 201 `{message, result, todo_id}` |
//! | `PUT`/`PATCH` | `/todo/{id}` | 200 `{message, todo_id, result}` |
//! | `DELETE` | `/todo/{id}` | 200 `{message, todo_id, result}` |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tudu::config::Config;
//! use tudu::storage::AppContext;
//! use tudu::{Server, storage, todo};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env();
//!     let store = storage::connect(&config).await.unwrap();
//!     let ctx = Arc::new(AppContext::new(Arc::new(store)));
//!
//!     Server::bind(&config.listen_addr)
//!         .serve(todo::routes(), ctx)
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! Shutdown is graceful: the first SIGINT / SIGTERM stops the accept loop,
//! in-flight requests get up to five seconds to finish, then the process
//! exits. Repeated interrupts during the drain change nothing.

pub mod config;
pub mod storage;
pub mod todo;

mod error;
mod handler;
mod model;
mod request;
mod response;
mod router;
mod server;

pub use error::{Error, StoreError};
pub use handler::Handler;
pub use model::{Todo, TodoRecord};
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::Router;
pub use server::{Server, serve_on};
