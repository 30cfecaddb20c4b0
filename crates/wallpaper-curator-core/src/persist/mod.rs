//! Writing accepted images and their metadata sidecars.

mod naming;

pub mod index;


pub use naming::SequenceCounters;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::NamingStrategy;
use crate::error::{Error, Result};
use crate::types::{ImageCandidate, WallpaperRecord};
use crate::validate::Accepted;

/// Writes accepted candidates under `<root>/<category>/`.
///
/// Safe to share across worker threads; the sequence counters are the only
/// internal mutable state and reserve numbers atomically.
pub struct Persister {
    root: PathBuf,
    naming: NamingStrategy,
    counters: SequenceCounters,
}

impl Persister {
    pub fn new(root: impl Into<PathBuf>, naming: NamingStrategy) -> Self {
        Self {
            root: root.into(),
            naming,
            counters: SequenceCounters::new(),
        }
    }

    /// Write the image bytes and JSON sidecar, returning the image path and
    /// the record that was written.
    ///
    /// The category directory is created if absent. A file already present
    /// at the computed name is a [`Error::NamingCollision`]; nothing is ever
    /// overwritten.
    pub fn persist(
        &self,
        candidate: &ImageCandidate,
        accepted: &Accepted,
        category: &str,
        subcategory: Option<&str>,
    ) -> Result<(PathBuf, WallpaperRecord)> {
        let dir = self.root.join(category);
        fs::create_dir_all(&dir)?;

        let stem = match self.naming {
            NamingStrategy::Sequential => {
                naming::sequential_stem(self.counters.reserve(category, &dir)?)
            }
            NamingStrategy::ContentHash => naming::hash_stem(&accepted.hash),
        };
        let image_path = dir.join(format!("{stem}.{}", accepted.kind.extension()));
        if image_path.exists() {
            return Err(Error::NamingCollision(image_path));
        }

        let record = WallpaperRecord {
            id: stem.clone(),
            category: category.to_string(),
            title: candidate.title.clone(),
            tags: candidate.tags.clone(),
            file_size: candidate.bytes.len() as u64,
            hash: accepted.hash,
            width: accepted.width,
            height: accepted.height,
            source_url: candidate.source_url.clone(),
            created_at: Utc::now(),
            subcategory: subcategory.map(str::to_string),
        };

        fs::write(&image_path, &candidate.bytes)?;
        write_sidecar(&dir, &stem, &record)?;

        Ok((image_path, record))
    }
}

fn write_sidecar(dir: &Path, stem: &str, record: &WallpaperRecord) -> Result<()> {
    let sidecar_path = dir.join(format!("{stem}.json"));
    fs::write(sidecar_path, serde_json::to_string_pretty(record)?)?;
    Ok(())
}
