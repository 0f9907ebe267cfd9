//! Read-only queries against the seeded collections.
//!
//! Every operation runs under the store's per-operation timeout. Multi-record
//! scans skip documents that fail to decode (logged); single lookups surface
//! decode failures as errors since the record is the whole response.

use serde::de::DeserializeOwned;
use sqlx::Row;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::db::Storage;
use crate::error::StoreError;
use crate::models::Collection;

#[derive(Clone)]
pub struct EntityReader {
    storage: Arc<Storage>,
    timeout: Duration,
}

impl EntityReader {
    pub fn new(storage: Arc<Storage>) -> Self {
        let timeout = storage.timeout();
        Self { storage, timeout }
    }

    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        collection: Collection,
        fut: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                collection: collection.name(),
                elapsed: self.timeout,
            }),
        }
    }

    /// Exact-match lookup on `id`. `Ok(None)` when absent.
    pub async fn find_by_id<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        self.bounded("find_by_id", collection, async {
            let pool = self.storage.acquire().await?;
            let body: Option<String> = sqlx::query_scalar(&format!(
                r#"SELECT body FROM "{}" WHERE id = ?"#,
                collection.name()
            ))
            .bind(id)
            .fetch_optional(pool)
            .await?;

            body.map(|body| {
                serde_json::from_str(&body).map_err(|source| StoreError::Decode {
                    collection: collection.name(),
                    id: id.to_string(),
                    source,
                })
            })
            .transpose()
        })
        .await
    }

    /// Every document in natural storage order.
    pub async fn find_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, StoreError> {
        self.bounded("find_all", collection, async {
            let pool = self.storage.acquire().await?;
            let rows = sqlx::query(&format!(
                r#"SELECT id, body FROM "{}" ORDER BY rowid"#,
                collection.name()
            ))
            .fetch_all(pool)
            .await?;
            Ok::<_, StoreError>(decode_rows(collection, rows))
        })
        .await
    }

    /// Documents whose reference field equals `value`.
    ///
    /// `field_path` is either a top-level field (`"company"`) or
    /// `"<array>.<key>"` (`"software.id"`), matching documents whose array
    /// holds at least one element with `key == value`.
    pub async fn find_referencing<T: DeserializeOwned>(
        &self,
        collection: Collection,
        field_path: &str,
        value: &str,
    ) -> Result<Vec<T>, StoreError> {
        let filter = reference_filter(field_path)?;
        self.bounded("find_referencing", collection, async {
            let pool = self.storage.acquire().await?;
            let table = collection.name();
            let sql = match &filter {
                ReferenceFilter::Field(path) => format!(
                    r#"SELECT id, body FROM "{table}" WHERE json_extract(body, '{path}') = ? ORDER BY rowid"#
                ),
                ReferenceFilter::Element { array, key } => format!(
                    r#"SELECT id, body FROM "{table}" AS doc
                       WHERE EXISTS (
                           SELECT 1 FROM json_each(doc.body, '{array}') AS r
                           WHERE json_extract(r.value, '{key}') = ?
                       )
                       ORDER BY doc.rowid"#
                ),
            };
            let rows = sqlx::query(&sql).bind(value).fetch_all(pool).await?;
            Ok::<_, StoreError>(decode_rows(collection, rows))
        })
        .await
    }

    /// Every identifier in natural storage order.
    pub async fn list_ids(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        self.bounded("list_ids", collection, async {
            let pool = self.storage.acquire().await?;
            let ids = sqlx::query_scalar(&format!(
                r#"SELECT id FROM "{}" ORDER BY rowid"#,
                collection.name()
            ))
            .fetch_all(pool)
            .await?;
            Ok::<_, StoreError>(ids)
        })
        .await
    }
}

fn decode_rows<T: DeserializeOwned>(
    collection: Collection,
    rows: Vec<sqlx::sqlite::SqliteRow>,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id: String = row.get("id");
            let body: String = row.get("body");
            match serde_json::from_str(&body) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!(%collection, %id, error = %e, "could not decode document, skipping");
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
enum ReferenceFilter {
    Field(String),
    Element { array: String, key: String },
}

fn reference_filter(field_path: &str) -> Result<ReferenceFilter, StoreError> {
    let valid = !field_path.is_empty()
        && field_path.split('.').all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if !valid {
        return Err(StoreError::InvalidFieldPath(field_path.to_string()));
    }

    Ok(match field_path.split_once('.') {
        None => ReferenceFilter::Field(format!("$.{}", field_path)),
        Some((array, key)) => ReferenceFilter::Element {
            array: format!("$.{}", array),
            key: format!("$.{}", key),
        },
    })
}
