//! Filename assignment for accepted images.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;
use crate::types::ContentHash;

/// Per-category sequence counters, seeded lazily from the filesystem.
///
/// Numbers are reserved under one lock acquisition so concurrent workers
/// never hand out the same number. Seeding scans the directory for the
/// highest number already embedded in a filename and continues from there,
/// so a directory that lost files out of order still never reuses a number
/// (`003.jpg` alone yields `0004` next, not `0001`).
pub struct SequenceCounters {
    counters: Mutex<HashMap<String, u64>>,
}

impl SequenceCounters {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the next number for a category, scanning `dir` on first use
    pub fn reserve(&self, category: &str, dir: &Path) -> Result<u64> {
        let mut counters = self.counters.lock().unwrap();
        let next = match counters.get(category) {
            Some(current) => current + 1,
            None => highest_existing(dir)? + 1,
        };
        counters.insert(category.to_string(), next);
        Ok(next)
    }
}

impl Default for SequenceCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest number found at the start of any file stem in `dir`
fn highest_existing(dir: &Path) -> Result<u64> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut highest = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let stem = match Path::new(&name).file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem,
            None => continue,
        };
        if let Some(number) = leading_number(stem) {
            highest = highest.max(number);
        }
    }
    Ok(highest)
}

fn leading_number(stem: &str) -> Option<u64> {
    let digits: String = stem.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Render a sequential filename stem, zero-padded to four digits
pub fn sequential_stem(number: u64) -> String {
    format!("{:04}", number)
}

/// Render a content-hash-derived filename stem
pub fn hash_stem(hash: &ContentHash) -> String {
    hash.short()
}
