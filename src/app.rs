//! Startup sequence shared by both run modes.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::aggregate::Aggregator;
use crate::archive;
use crate::assets::AssetResolver;
use crate::builder;
use crate::config::Config;
use crate::db::Storage;
use crate::loader;
use crate::migrate;
use crate::pages::PageAssembler;
use crate::reader::EntityReader;
use crate::server;

/// Connects the store, seeds it from `site.seed_dir`, and wires the page
/// assembler on top.
pub async fn prepare(config: &Config) -> Result<(Arc<Storage>, PageAssembler)> {
    let storage = Arc::new(Storage::new(&config.db));
    migrate::ensure_collections(&storage)
        .await
        .context("could not prepare database")?;

    let reports = loader::load_all(&storage, &config.site.seed_dir).await?;
    let records: usize = reports.iter().map(|r| r.inserted).sum();
    tracing::info!(collections = reports.len(), records, "seed data loaded");

    let reader = EntityReader::new(storage.clone());
    let assets = AssetResolver::new(&config.images, &config.site.static_dir);
    let aggregator = Aggregator::new(reader, assets);
    let pages = PageAssembler::new(aggregator, config.html_suffix());
    Ok((storage, pages))
}

/// Full run: unpack the seed archive, load the store, then build or serve.
pub async fn run(config: &Config) -> Result<()> {
    tracing::info!("starting application");

    archive::check_input_dir(&config.site.input_dir)?;
    archive::extract_seed_archive(config)?;

    let (storage, pages) = prepare(config).await?;

    let result = if config.site.static_build {
        builder::build_static_site(config, &pages).await.map(|_| ())
    } else {
        tracing::info!("dynamic start");
        server::run_server(config, Arc::new(pages)).await
    };

    storage.close().await;
    result
}
