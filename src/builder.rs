//! Static site generation.
//!
//! Renders every route into `site.build_dir`: `index.html`, `impressum.html`,
//! `project/<id>.html` and `tool/<id>.html`, next to a copy of the static
//! assets. Any filesystem error aborts the build.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::Collection;
use crate::pages::PageAssembler;
use crate::render;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub assets: usize,
}

pub async fn build_static_site(config: &Config, pages: &PageAssembler) -> Result<BuildSummary> {
    let build_dir = &config.site.build_dir;
    tracing::info!(output = %config.site.output_dir.display(), "static build");

    if build_dir.exists() {
        fs::remove_dir_all(build_dir)
            .with_context(|| format!("Error deleting build dir: {}", build_dir.display()))?;
    }
    fs::create_dir_all(build_dir)
        .with_context(|| format!("Error creating build dir: {}", build_dir.display()))?;

    let mut summary = BuildSummary::default();
    if config.site.static_dir.exists() {
        summary.assets = copy_dir(&config.site.static_dir, &build_dir.join("static"))
            .context("Error copying static files")?;
    } else {
        tracing::warn!(dir = %config.site.static_dir.display(), "no static dir to copy");
    }

    let home = pages.home().await?;
    write_page(build_dir, "index.html", &render::home(&home))?;
    write_page(build_dir, "impressum.html", &render::impressum(&pages.impressum()))?;
    summary.pages += 2;

    summary.pages += generate_product_pages(build_dir, pages, Collection::Projects)
        .await
        .context("Error generating project pages")?;
    summary.pages += generate_product_pages(build_dir, pages, Collection::Tools)
        .await
        .context("Error generating tool pages")?;

    tracing::info!(pages = summary.pages, assets = summary.assets, "static build complete");
    Ok(summary)
}

async fn generate_product_pages(
    build_dir: &Path,
    pages: &PageAssembler,
    collection: Collection,
) -> Result<usize> {
    let folder = match collection {
        Collection::Projects => "project",
        Collection::Tools => "tool",
        other => anyhow::bail!("no product pages for '{}'", other),
    };

    let ids = pages.aggregator().reader().list_ids(collection).await?;
    if ids.is_empty() {
        return Ok(0);
    }
    fs::create_dir_all(build_dir.join(folder))?;

    let mut written = 0;
    for id in &ids {
        if !is_file_stem(id) {
            tracing::warn!(%collection, %id, "id is not usable as a file name, skipping page");
            continue;
        }
        let (page, _) = match collection {
            Collection::Projects => pages.project_page(id).await?,
            _ => pages.tool_page(id).await?,
        };
        write_page(
            build_dir,
            &format!("{}/{}.html", folder, id),
            &render::product(&page),
        )?;
        written += 1;
    }
    Ok(written)
}

fn is_file_stem(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

fn write_page(build_dir: &Path, relative: &str, html: &str) -> Result<()> {
    tracing::debug!(page = relative, "generating page");
    let path = build_dir.join(relative);
    fs::write(&path, html).with_context(|| format!("Error writing page: {}", path.display()))
}

/// Recursively copies `src` into `dst`, skipping symlinks. Returns the
/// number of files copied.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Error copying {}", entry.path().display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}
