//! Seed archive handling.
//!
//! The site ships its content as a zip: `json/*.json` seed files and an
//! `images/` tree. Seed files are flattened into the seed directory, images
//! are unpacked below the static directory.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::Config;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub seed_files: usize,
    pub images: usize,
}

/// Fails if the input directory is missing; logs what it contains.
pub fn check_input_dir(dir: &Path) -> Result<Vec<String>> {
    tracing::info!(dir = %dir.display(), "input folder");
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Error reading input folder: {}", dir.display()))?
    {
        let name = entry?.file_name().to_string_lossy().into_owned();
        tracing::info!(file = %name, "input file");
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Extracts the configured archive into the seed and static directories.
pub fn extract_seed_archive(config: &Config) -> Result<ExtractSummary> {
    let path = config.archive_path();
    tracing::info!(path = %path.display(), "opening zip file");
    let file = fs::File::open(&path)
        .with_context(|| format!("Error opening zip file: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Error reading zip file: {}", path.display()))?;

    fs::create_dir_all(&config.site.seed_dir).with_context(|| {
        format!(
            "Error creating seed dir: {}",
            config.site.seed_dir.display()
        )
    })?;

    let mut summary = ExtractSummary::default();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(name) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping entry with unsafe path");
            continue;
        };

        match classify(&name) {
            Some(Target::Seed(file_name)) if !entry.is_dir() => {
                let dest = config.site.seed_dir.join(file_name);
                write_entry(&mut entry, &dest)?;
                summary.seed_files += 1;
            }
            Some(Target::Image(relative)) => {
                let dest = config.site.static_dir.join(relative);
                if entry.is_dir() {
                    fs::create_dir_all(&dest).with_context(|| {
                        format!("Error creating image dir: {}", dest.display())
                    })?;
                } else {
                    write_entry(&mut entry, &dest)?;
                    summary.images += 1;
                }
            }
            _ => {}
        }
    }

    tracing::info!(
        seed_files = summary.seed_files,
        images = summary.images,
        "extracted seed archive"
    );
    Ok(summary)
}

enum Target {
    /// File directly inside `json/`.
    Seed(PathBuf),
    /// Anything below `images/`, kept relative to the archive root.
    Image(PathBuf),
}

fn classify(name: &Path) -> Option<Target> {
    let parts: Vec<&std::ffi::OsStr> = name
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    match parts.as_slice() {
        [dir, file] if *dir == "json" => Some(Target::Seed(PathBuf::from(file))),
        [dir, _, ..] if *dir == "images" => Some(Target::Image(name.to_path_buf())),
        _ => None,
    }
}

fn write_entry<R: io::Read>(entry: &mut R, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = fs::File::create(dest)
        .with_context(|| format!("Error creating file: {}", dest.display()))?;
    io::copy(entry, &mut out)
        .with_context(|| format!("Error writing file: {}", dest.display()))?;
    Ok(())
}
