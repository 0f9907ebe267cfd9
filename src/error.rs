//! Errors raised at the storage boundary.
//!
//! A missing entity is not an error: lookups return `Ok(None)` and the page
//! layer turns that into a not-found page. Everything here is either fatal at
//! startup (`Connect`, `Probe`) or fatal for the request that hit it.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not connect to database at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not ping database: {0}")]
    Probe(#[source] sqlx::Error),

    #[error("{operation} on '{collection}' timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        collection: &'static str,
        elapsed: Duration,
    },

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("could not decode document '{id}' in '{collection}': {source}")]
    Decode {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid field path: '{0}'")]
    InvalidFieldPath(String),
}
