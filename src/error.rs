//! Unified error types.
//!
//! Two distinct failure surfaces live here:
//!
//! - [`Error`] — infrastructure failures of the server itself: binding the
//!   port, accepting connections. Application-level outcomes (400, 500) are
//!   expressed as HTTP [`Response`](crate::Response) values, never as errors.
//! - [`StoreError`] — failures surfaced by the storage backend, one variant
//!   per storage call so handlers can map each to its HTTP contract.

use std::fmt;

/// The error type returned by the server's fallible operations.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}

/// A failure reported by the storage backend.
///
/// Variants carry the backend's own message as a string so the trait stays
/// implementable by test doubles that never touch a real driver.
///
/// `Scan` is special: a query that succeeded but whose cursor could not be
/// materialized. The list handler treats it as fatal — see
/// [`todo`](crate::todo) for the rationale.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),
    #[error("cursor scan failed: {0}")]
    Scan(String),
    #[error("insert failed: {0}")]
    Insert(String),
    #[error("update failed: {0}")]
    Update(String),
    #[error("delete failed: {0}")]
    Delete(String),
}
