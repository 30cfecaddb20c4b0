//! Quality scoring and diversity-aware best-N selection.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::WallpaperRecord;

/// Subcategory bucket records fall into when no finer label is present
pub const GENERIC_BUCKET: &str = "general";

/// Compute the quality score for a record.
///
/// The score only drives ranking within a fixed-size selection; it is
/// recomputed on demand and never persisted as a source of truth. Not
/// clamped to a maximum.
pub fn quality_score(record: &WallpaperRecord) -> f64 {
    let mut score = 0.0;

    // File size sweet spot for phone screens
    score += match record.file_size {
        150_000..=800_000 => 3.0,
        100_000..=149_999 => 2.0,
        size if size > 800_000 => 1.5,
        _ => 1.0,
    };

    // Keyword bonuses over title and tags
    let text = format!(
        "{} {}",
        record.title.as_deref().unwrap_or(""),
        record.tags.join(" ")
    )
    .to_lowercase();
    if text.contains("mobile") || text.contains("phone") {
        score += 2.0;
    }
    if text.contains("hd") || text.contains("wallpaper") {
        score += 1.5;
    }
    if text.contains("motivation") || text.contains("action") {
        score += 1.0;
    }

    // A finer-grained label than the generic bucket signals curation effort
    if record
        .subcategory
        .as_deref()
        .map_or(false, |s| s != GENERIC_BUCKET)
    {
        score += 1.0;
    }

    score += (0.2 * record.tags.len() as f64).min(1.0);

    score
}

/// Result of a best-N selection
#[derive(Debug)]
pub struct Selection {
    /// Chosen records, ordered by descending quality score
    pub records: Vec<WallpaperRecord>,

    /// True when the pool held fewer records than requested
    pub partial: bool,
}

/// Select up to `total` records from the pool, honoring a per-subcategory
/// target distribution.
///
/// The pool is partitioned by subcategory; each partition contributes up to
/// its target, best first. If the union falls short of `total`, the
/// remaining slots are filled with the highest-scoring leftovers across all
/// partitions, ties broken by pool order. The final list is sorted by
/// descending score and truncated to exactly `total`.
pub fn select_best(
    pool: &[WallpaperRecord],
    distribution: &HashMap<String, usize>,
    total: usize,
) -> Selection {
    // Pool position tags make tie-breaking deterministic
    let indexed: Vec<(usize, &WallpaperRecord, f64)> = pool
        .iter()
        .enumerate()
        .map(|(position, record)| (position, record, quality_score(record)))
        .collect();

    let mut partitions: HashMap<&str, Vec<(usize, &WallpaperRecord, f64)>> = HashMap::new();
    for item in indexed {
        partitions.entry(bucket_of(item.1)).or_default().push(item);
    }

    let mut chosen = Vec::new();
    let mut leftovers = Vec::new();
    for (bucket, mut items) in partitions {
        sort_by_score_desc(&mut items);
        let target = distribution.get(bucket).copied().unwrap_or(0);
        let rest = items.split_off(target.min(items.len()));
        chosen.extend(items);
        leftovers.extend(rest);
    }

    if chosen.len() < total {
        sort_by_score_desc(&mut leftovers);
        let shortfall = total - chosen.len();
        chosen.extend(leftovers.into_iter().take(shortfall));
    }

    sort_by_score_desc(&mut chosen);
    chosen.truncate(total);

    let records: Vec<WallpaperRecord> = chosen.into_iter().map(|(_, r, _)| r.clone()).collect();
    let partial = records.len() < total;
    Selection { records, partial }
}

fn bucket_of(record: &WallpaperRecord) -> &str {
    record.subcategory.as_deref().unwrap_or(GENERIC_BUCKET)
}

fn sort_by_score_desc(items: &mut [(usize, &WallpaperRecord, f64)]) {
    items.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
}

// -- Tests --
