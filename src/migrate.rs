use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::Storage;
use crate::models::Collection;

/// DDL for a collection table. Natural scan order is rowid (insertion) order.
pub fn collection_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{}" (
            id TEXT PRIMARY KEY,
            body TEXT NOT NULL
        )
        "#,
        table
    )
}

/// Creates an empty table for every collection that does not exist yet, so
/// reads against an unseeded store return nothing rather than failing.
pub async fn ensure_collections(storage: &Storage) -> Result<()> {
    let pool = storage.acquire().await?;
    for collection in Collection::ALL {
        create_table(pool, collection.name()).await?;
    }
    Ok(())
}

pub(crate) async fn create_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&collection_table_sql(table))
        .execute(pool)
        .await?;
    Ok(())
}
