//! Seed loading.
//!
//! Each collection is replaced wholesale from its seed file. Records are
//! first written to a staging table in one transaction, then the staging
//! table is renamed over the live one in a second transaction, so a reader
//! sees either the old collection or the new one and never a mix.
//!
//! Seed problems (missing file, malformed data, a record without an `id`,
//! duplicate ids) are fatal: the site cannot start with partial seed data.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::db::Storage;
use crate::migrate::create_table;
use crate::models::Collection;

/// What happened to a leftover staging table before a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped,
    Absent,
    /// Dropping failed; the reload continued. Callers may ignore this.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    pub collection: Collection,
    pub inserted: usize,
    pub staging: DropOutcome,
    pub swap_attempts: u32,
}

const SWAP_ATTEMPTS: u32 = 2;

/// Loads all six collections from `seed_dir`.
pub async fn load_all(storage: &Storage, seed_dir: &Path) -> Result<Vec<ReloadReport>> {
    let mut reports = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        let path = source_path(seed_dir, collection)?;
        reports.push(load(storage, &path, collection).await?);
    }
    Ok(reports)
}

/// Picks `<stem>.json`, or `<stem>.csv` for projects when no JSON exists.
pub fn source_path(seed_dir: &Path, collection: Collection) -> Result<PathBuf> {
    let json = seed_dir.join(format!("{}.json", collection.source_stem()));
    if json.exists() {
        return Ok(json);
    }
    if collection == Collection::Projects {
        let csv = seed_dir.join(format!("{}.csv", collection.source_stem()));
        if csv.exists() {
            return Ok(csv);
        }
    }
    bail!(
        "no seed file for collection '{}' in {}",
        collection,
        seed_dir.display()
    )
}

/// Replaces the contents of `collection` with the records in `path`.
pub async fn load(storage: &Storage, path: &Path, collection: Collection) -> Result<ReloadReport> {
    let records = read_source(path, collection)?;
    let pool = storage.acquire().await?;

    let staging = drop_staging(pool, collection).await;
    if let DropOutcome::Failed(ref reason) = staging {
        tracing::warn!(%collection, %reason, "could not drop staging table");
    }

    fill_staging(pool, collection, &records)
        .await
        .with_context(|| format!("could not insert entries into '{}'", collection))?;

    let mut attempts = 0;
    loop {
        attempts += 1;
        match swap_live(pool, collection).await {
            Ok(()) => break,
            Err(e) if attempts < SWAP_ATTEMPTS => {
                tracing::warn!(%collection, error = %e, "swap failed, retrying");
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("could not swap staging table into '{}'", collection)
                })
            }
        }
    }

    tracing::info!(
        %collection,
        inserted = records.len(),
        "inserted entries"
    );

    Ok(ReloadReport {
        collection,
        inserted: records.len(),
        staging,
        swap_attempts: attempts,
    })
}

/// A validated seed record: its identifier and the document to store.
#[derive(Debug, Clone)]
pub struct SeedRecord {
    pub id: String,
    pub document: Value,
}

/// Reads and validates a seed file. JSON arrays for every collection; CSV
/// with a header row for projects.
pub fn read_source(path: &Path, collection: Collection) -> Result<Vec<SeedRecord>> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let documents = if is_csv {
        if collection != Collection::Projects {
            bail!(
                "CSV seed files are only supported for projects, not '{}'",
                collection
            );
        }
        read_projects_csv(path)?
    } else {
        read_json_array(path)?
    };

    documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| {
            let id = collection.validate(&document).with_context(|| {
                format!(
                    "invalid record #{} in {} for '{}'",
                    index,
                    path.display(),
                    collection
                )
            })?;
            Ok(SeedRecord { id, document })
        })
        .collect()
}

fn read_json_array(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file: {}", path.display()))?;
    let documents: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("could not parse JSON array in {}", path.display()))?;
    Ok(documents)
}

/// Projects as delimited text: `name, description, year` per row.
fn read_projects_csv(path: &Path) -> Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("could not read file: {}", path.display()))?;

    let mut documents = Vec::new();
    let mut names_by_slug: HashMap<String, String> = HashMap::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("malformed CSV row #{} in {}", index, path.display()))?;
        let (Some(name), Some(description), Some(year)) = (row.get(0), row.get(1), row.get(2))
        else {
            bail!(
                "CSV row #{} in {} needs name, description and year",
                index,
                path.display()
            );
        };

        let id = slugify(name);
        if id.is_empty() {
            bail!(
                "CSV row #{} in {}: name '{}' has no letters or digits to build an id from",
                index,
                path.display(),
                name
            );
        }
        if let Some(previous) = names_by_slug.insert(id.clone(), name.to_string()) {
            bail!(
                "CSV row #{} in {}: names '{}' and '{}' both map to id '{}'",
                index,
                path.display(),
                previous,
                name,
                id
            );
        }

        let mut doc = Map::new();
        doc.insert("id".to_string(), Value::String(id));
        doc.insert("name".to_string(), Value::String(name.to_string()));
        doc.insert("long".to_string(), Value::String(description.to_string()));
        doc.insert("short".to_string(), Value::String(description.to_string()));
        doc.insert("date".to_string(), Value::String(year.to_string()));
        documents.push(Value::Object(doc));
    }
    Ok(documents)
}

/// Lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

async fn drop_staging(pool: &SqlitePool, collection: Collection) -> DropOutcome {
    let staging = collection.staging_name();
    let exists: Result<bool, sqlx::Error> =
        sqlx::query_scalar("SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(&staging)
            .fetch_one(pool)
            .await;

    match exists {
        Ok(false) => DropOutcome::Absent,
        Ok(true) => match sqlx::query(&format!(r#"DROP TABLE "{}""#, staging))
            .execute(pool)
            .await
        {
            Ok(_) => DropOutcome::Dropped,
            Err(e) => DropOutcome::Failed(e.to_string()),
        },
        Err(e) => DropOutcome::Failed(e.to_string()),
    }
}

async fn fill_staging(
    pool: &SqlitePool,
    collection: Collection,
    records: &[SeedRecord],
) -> Result<()> {
    let staging = collection.staging_name();
    create_table(pool, &staging).await?;

    let insert = format!(r#"INSERT INTO "{}" (id, body) VALUES (?, ?)"#, staging);
    let mut tx = pool.begin().await?;
    sqlx::query(&format!(r#"DELETE FROM "{}""#, staging))
        .execute(&mut *tx)
        .await?;
    for record in records {
        sqlx::query(&insert)
            .bind(&record.id)
            .bind(serde_json::to_string(&record.document)?)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("could not insert '{}'", record.id))?;
    }
    tx.commit().await?;
    Ok(())
}

async fn swap_live(pool: &SqlitePool, collection: Collection) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query(&format!(r#"DROP TABLE IF EXISTS "{}""#, collection.name()))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        r#"ALTER TABLE "{}" RENAME TO "{}""#,
        collection.staging_name(),
        collection.name()
    ))
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> Storage {
        Storage::new(&DbConfig {
            path: tmp.path().join("seed.sqlite"),
            ..DbConfig::default()
        })
    }

    async fn count(storage: &Storage, table: &str) -> i64 {
        let pool = storage.acquire().await.unwrap();
        sqlx::query_scalar(&format!(r#"SELECT COUNT(*) FROM "{}""#, table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Line Follower Robot"), "line-follower-robot");
        assert_eq!(slugify("  C++ / Qt!  "), "c-qt");
        assert_eq!(slugify("v2.0"), "v2-0");
    }

    #[test]
    fn test_read_projects_csv() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("projects.csv");
        std::fs::write(
            &path,
            "name,description,year\nLine Robot,\"Follows, lines\",2019\nWeather Station,Logs weather,2021\n",
        )
        .unwrap();

        let records = read_source(&path, Collection::Projects).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "line-robot");
        assert_eq!(records[0].document["long"], "Follows, lines");
        assert_eq!(records[1].document["date"], "2021");
    }

    #[test]
    fn test_csv_rejected_for_tools() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("software.csv");
        std::fs::write(&path, "name,description,year\nx,y,2020\n").unwrap();
        assert!(read_source(&path, Collection::Tools).is_err());
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("education.json");
        std::fs::write(&path, "[{\"id\": \"bsc\",").unwrap();
        assert!(read_source(&path, Collection::Education).is_err());
    }

    #[test]
    fn test_record_without_id_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("language.json");
        std::fs::write(&path, r#"[{"name": "German"}]"#).unwrap();
        let err = read_source(&path, Collection::Language).unwrap_err();
        assert!(err.to_string().contains("invalid record #0"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        assert!(read_source(&tmp.path().join("nope.json"), Collection::Projects).is_err());
        assert!(source_path(tmp.path(), Collection::Projects).is_err());
    }

    #[test]
    fn test_source_path_prefers_json() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("projects.csv"), "name,description,year\n").unwrap();
        assert!(source_path(tmp.path(), Collection::Projects)
            .unwrap()
            .ends_with("projects.csv"));
        std::fs::write(tmp.path().join("projects.json"), "[]").unwrap();
        assert!(source_path(tmp.path(), Collection::Projects)
            .unwrap()
            .ends_with("projects.json"));
    }

    #[tokio::test]
    async fn test_reload_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let path = tmp.path().join("language.json");

        std::fs::write(
            &path,
            r#"[{"id": "de", "name": "German"}, {"id": "en", "name": "English"}]"#,
        )
        .unwrap();
        let first = load(&storage, &path, Collection::Language).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.staging, DropOutcome::Absent);
        assert_eq!(first.swap_attempts, 1);

        std::fs::write(&path, r#"[{"id": "fr", "name": "French"}]"#).unwrap();
        load(&storage, &path, Collection::Language).await.unwrap();

        assert_eq!(count(&storage, "language").await, 1);
        storage.close().await;
    }

    #[tokio::test]
    async fn test_leftover_staging_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let pool = storage.acquire().await.unwrap();
        create_table(pool, &Collection::Education.staging_name())
            .await
            .unwrap();

        let path = tmp.path().join("education.json");
        std::fs::write(&path, r#"[{"id": "bsc", "name": "BSc"}]"#).unwrap();
        let report = load(&storage, &path, Collection::Education).await.unwrap();
        assert_eq!(report.staging, DropOutcome::Dropped);
        storage.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_previous_state() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let path = tmp.path().join("otherskills.json");

        std::fs::write(&path, r#"[{"id": "cad", "name": "CAD"}]"#).unwrap();
        load(&storage, &path, Collection::OtherSkills).await.unwrap();

        std::fs::write(
            &path,
            r#"[{"id": "pcb", "name": "PCB"}, {"id": "pcb", "name": "PCB again"}]"#,
        )
        .unwrap();
        assert!(load(&storage, &path, Collection::OtherSkills).await.is_err());

        // The live table still holds the previous seed.
        assert_eq!(count(&storage, "otherskills").await, 1);
        storage.close().await;
    }

    #[test]
    fn test_csv_name_without_id_characters_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("projects.csv");
        std::fs::write(&path, "name,description,year
!!!,Nothing,2020
").unwrap();

        let err = read_source(&path, Collection::Projects).unwrap_err();
        assert!(format!("{:#}", err).contains("'!!!'"), "{:#}", err);
    }

    #[test]
    fn test_csv_names_with_same_id_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("projects.csv");
        std::fs::write(
            &path,
            "name,description,year
Robot!,One,2020
Robot?,Two,2021
",
        )
        .unwrap();

        let err = format!("{:#}", read_source(&path, Collection::Projects).unwrap_err());
        assert!(err.contains("'Robot!'"), "{}", err);
        assert!(err.contains("'Robot?'"), "{}", err);
        assert!(err.contains("'robot'"), "{}", err);
    }

    #[tokio::test]
    async fn test_undroppable_staging_is_reported_and_load_continues() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let pool = storage.acquire().await.unwrap();
        let staging = Collection::Projects.staging_name();

        // A deferred reference into the leftover staging table makes a
        // standalone DROP fail at commit; the refill restores the row.
        create_table(pool, &staging).await.unwrap();
        sqlx::query(&format!(
            r#"INSERT INTO "{}" (id, body) VALUES ('robot', '{{}}')"#,
            staging
        ))
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(&format!(
            r#"CREATE TABLE pins (project TEXT REFERENCES "{}"(id) DEFERRABLE INITIALLY DEFERRED)"#,
            staging
        ))
        .execute(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO pins (project) VALUES ('robot')")
            .execute(pool)
            .await
            .unwrap();

        let path = tmp.path().join("projects.json");
        std::fs::write(&path, r#"[{"id": "robot", "name": "Robot"}]"#).unwrap();
        let report = load(&storage, &path, Collection::Projects).await.unwrap();

        assert!(
            matches!(report.staging, DropOutcome::Failed(_)),
            "staging: {:?}",
            report.staging
        );
        assert_eq!(report.inserted, 1);
        assert_eq!(count(&storage, "projects").await, 1);
        storage.close().await;
    }
}
