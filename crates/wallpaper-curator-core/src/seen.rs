//! Cross-run duplicate avoidance: the persisted set of accepted hashes.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use log::info;

use crate::error::Result;
use crate::types::ContentHash;

/// Set of content hashes accepted in this or any previous run.
///
/// Loaded at startup, mutated on every accepted candidate, and rewritten in
/// full on save. Hashes are never removed during a run. Shared across worker
/// threads; membership check and insert happen under one lock acquisition so
/// two workers can never both accept byte-identical payloads.
pub struct SeenHashSet {
    inner: Mutex<HashSet<ContentHash>>,
}

impl SeenHashSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashSet::new()),
        }
    }

    /// Load the set from a JSON array of hex strings.
    ///
    /// A missing file yields an empty set; a present but unparseable file is
    /// an error, since silently starting empty would re-admit every
    /// previously collected image.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path)?;
        let hashes: Vec<ContentHash> = serde_json::from_str(&data)?;
        info!("Loaded {} known hashes from {}", hashes.len(), path.display());
        Ok(Self {
            inner: Mutex::new(hashes.into_iter().collect()),
        })
    }

    /// Atomically check membership and insert.
    ///
    /// Returns true if the hash was not previously present, i.e. the
    /// candidate is new.
    pub fn check_and_insert(&self, hash: ContentHash) -> bool {
        self.inner.lock().unwrap().insert(hash)
    }

    /// Check membership without inserting
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.inner.lock().unwrap().contains(hash)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrite the persistence file with the full set.
    ///
    /// Hashes are written sorted so the file diffs cleanly between runs.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut hashes: Vec<String> = {
            let guard = self.inner.lock().unwrap();
            guard.iter().map(ContentHash::to_hex).collect()
        };
        hashes.sort();
        fs::write(path, serde_json::to_string_pretty(&hashes)?)?;
        Ok(())
    }
}

impl Default for SeenHashSet {
    fn default() -> Self {
        Self::new()
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_and_insert_accepts_once() {
        let seen = SeenHashSet::new();
        let hash = ContentHash::of(b"some payload");

        assert!(seen.check_and_insert(hash));
        assert!(!seen.check_and_insert(hash));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_load_missing_file_yields_empty_set() {
        let dir = tempdir().unwrap();
        let seen = SeenHashSet::load(&dir.path().join("absent.json")).unwrap();
        assert!(seen.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen_hashes.json");

        let seen = SeenHashSet::new();
        let a = ContentHash::of(b"first");
        let b = ContentHash::of(b"second");
        seen.check_and_insert(a);
        seen.check_and_insert(b);
        seen.save(&path).unwrap();

        let reloaded = SeenHashSet::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains(&a));
        assert!(reloaded.contains(&b));
    }

    #[test]
    fn test_save_writes_json_array_of_hex() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen_hashes.json");

        let seen = SeenHashSet::new();
        seen.check_and_insert(ContentHash::of(b"payload"));
        seen.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].len(), 64);
    }
}
