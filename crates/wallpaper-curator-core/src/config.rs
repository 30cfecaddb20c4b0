use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validate::ValidationLimits;

/// Filename assignment for accepted images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// Per-category counter, `0001.jpg` style; numbers are never reused
    Sequential,

    /// First 16 hex characters of the content hash
    ContentHash,
}

/// Configuration for a collection run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the collection; each category is a subdirectory
    pub output_dir: PathBuf,

    /// Path of the persisted seen-hash file
    pub seen_hashes_path: PathBuf,

    /// Size and dimension thresholds for accepting candidates
    pub limits: ValidationLimits,

    /// Filename assignment strategy
    pub naming: NamingStrategy,

    /// Number of worker threads (0 = one per CPU)
    pub workers: usize,

    /// Extra attempts for fetch timeouts
    pub fetch_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("wallpapers"),
            seen_hashes_path: PathBuf::from("wallpapers/seen_hashes.json"),
            limits: ValidationLimits::default(),
            naming: NamingStrategy::Sequential,
            workers: 0, // Auto
            fetch_retries: 2,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.limits.min_bytes > self.limits.max_bytes {
            return Err(Error::Configuration(format!(
                "min_bytes ({}) exceeds max_bytes ({})",
                self.limits.min_bytes, self.limits.max_bytes
            )));
        }
        if self.limits.max_aspect_ratio < 1.0 {
            return Err(Error::Configuration(format!(
                "max_aspect_ratio must be at least 1.0, got {}",
                self.limits.max_aspect_ratio
            )));
        }
        if self.limits.min_width == 0 || self.limits.min_height == 0 {
            return Err(Error::Configuration(
                "minimum dimensions must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective worker count for the pipeline
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_size_bounds_rejected() {
        let mut config = Config::default();
        config.limits.min_bytes = 1_000_000;
        config.limits.max_bytes = 100;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_aspect_ratio_below_one_rejected() {
        let mut config = Config::default();
        config.limits.max_aspect_ratio = 0.5;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.naming = NamingStrategy::ContentHash;
        config.workers = 3;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.naming, NamingStrategy::ContentHash);
        assert_eq!(loaded.workers, 3);
        assert_eq!(loaded.limits.min_bytes, config.limits.min_bytes);
    }
}
