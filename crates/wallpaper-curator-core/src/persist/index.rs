//! Category index generation from sidecar files.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::Result;
use crate::types::WallpaperRecord;

/// Filename of the per-category index
pub const INDEX_FILE: &str = "index.json";

/// Index of one category directory, regenerated from its sidecars
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryIndex {
    pub category: String,
    pub count: usize,
    pub wallpapers: Vec<WallpaperRecord>,
}

/// Rebuild the index file for a category directory by scanning its sidecars.
///
/// Unreadable sidecars are skipped with a warning so a single corrupt file
/// cannot block a metadata-repair pass.
pub fn index_category(dir: &Path) -> Result<CategoryIndex> {
    let category = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let mut wallpapers: Vec<WallpaperRecord> =
        load_pool(dir)?.into_iter().map(|(_, record)| record).collect();
    wallpapers.sort_by(|a, b| a.id.cmp(&b.id));

    let index = CategoryIndex {
        category,
        count: wallpapers.len(),
        wallpapers,
    };
    fs::write(dir.join(INDEX_FILE), serde_json::to_string_pretty(&index)?)?;
    Ok(index)
}

/// Read every sidecar record under `dir`, returning each with its path.
///
/// Recurses into subdirectories so a pool split by subcategory folders also
/// loads in one call. Index files are ignored.
pub fn load_pool(dir: &Path) -> Result<Vec<(PathBuf, WallpaperRecord)>> {
    let mut records = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if path.file_name().and_then(|n| n.to_str()) == Some(INDEX_FILE) {
            continue;
        }
        match read_record(path) {
            Ok(record) => records.push((path.to_path_buf(), record)),
            Err(e) => warn!("Skipping unreadable sidecar {}: {}", path.display(), e),
        }
    }
    Ok(records)
}

fn read_record(path: &Path) -> Result<WallpaperRecord> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
