//! Core functionality for building a curated wallpaper collection.
//!
//! This library provides the foundational components of the pipeline:
//! - Candidate sources (local directories, URL lists)
//! - Content-hash deduplication and size/dimension validation
//! - Collision-safe persistence with JSON metadata sidecars
//! - Quality scoring and diversity-aware best-N selection

// -- External Dependencies --

use crossbeam::channel;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

// -- Standard Library --

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

// -- Internal Modules --

mod error;

// -- Public Re-exports --

pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --

pub mod config;
pub mod fetch;
pub mod hash;
pub mod persist;
pub mod rank;
pub mod report;
pub mod seen;
pub mod types;
pub mod validate;

// -- Test Modules --

#[cfg(test)]
pub mod test_utils;

use fetch::CandidateSource;
use persist::Persister;
use report::{RunCounters, RunReport};
use seen::SeenHashSet;
use validate::RejectReason;

/// Main entry point for a collection run.
///
/// Owns the shared state of the pipeline: the seen-hash set, the persister
/// with its sequence counters, and the cooperative shutdown flag.
pub struct Curator {
    config: Config,
    seen: SeenHashSet,
    persister: Persister,
    shutdown: Arc<AtomicBool>,
}

impl Curator {
    /// Create a curator, loading the persisted seen-hash set.
    ///
    /// Fails if the configuration is invalid or the output directory cannot
    /// be created; those are the only unrecoverable setup conditions.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.output_dir)?;
        let seen = SeenHashSet::load(&config.seen_hashes_path)?;
        let persister = Persister::new(config.output_dir.clone(), config.naming);

        Ok(Self {
            config,
            seen,
            persister,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag checked between candidates; lets a signal handler stop the run
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the fetch → validate → persist pipeline until the source is
    /// exhausted, `limit` images have been accepted, or shutdown is
    /// requested.
    ///
    /// A feeder thread owns the source and pushes candidates into a bounded
    /// channel; worker threads validate and persist independently, so one
    /// worker's failure never affects the others. The seen-hash set is saved
    /// once at the end; failure to write it is the run's only fatal outcome
    /// past setup.
    pub fn run(
        &self,
        source: Box<dyn CandidateSource>,
        category: &str,
        subcategory: Option<&str>,
        limit: usize,
    ) -> Result<RunReport> {
        let start = Instant::now();
        let counters = RunCounters::default();
        let workers = self.config.worker_count();

        let progress = ProgressBar::new(limit as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("##-"),
        );
        progress.set_message("collecting...");

        let (tx, rx) = channel::bounded::<ImageCandidate>(workers * 2);

        std::thread::scope(|scope| {
            let counters = &counters;
            let shutdown = self.shutdown.as_ref();
            let progress = &progress;

            scope.spawn(move || {
                let mut source = source;
                loop {
                    if shutdown.load(Ordering::Relaxed) || counters.accepted_count() >= limit {
                        break;
                    }
                    match source.next_candidate() {
                        Some(Ok(candidate)) => {
                            if tx.send(candidate).is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            warn!("Fetch failed: {e}");
                            counters.fetch_errors.fetch_add(1, Ordering::Relaxed);
                        }
                        None => break,
                    }
                }
                // tx drops here, closing the channel for the workers
            });

            for _ in 0..workers {
                let rx = rx.clone();
                scope.spawn(move || {
                    for candidate in rx.iter() {
                        // Keep draining so the feeder never blocks, but stop
                        // doing work once the run is over
                        if shutdown.load(Ordering::Relaxed)
                            || counters.accepted_count() >= limit
                        {
                            continue;
                        }
                        self.process(candidate, category, subcategory, counters, progress, limit);
                    }
                });
            }
            drop(rx);
        });

        let elapsed = start.elapsed();
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            counters.accepted_count() as f64 / secs
        } else {
            0.0
        };
        progress.finish_with_message(format!("{:.1} images/sec", rate));

        self.seen.save(&self.config.seen_hashes_path)?;

        let report = counters.snapshot(elapsed);
        info!("Run complete: {report}");
        Ok(report)
    }

    /// Decide one candidate and record the outcome.
    ///
    /// An acceptance slot is reserved atomically up front and released if
    /// the candidate rejects or fails to persist, so the accepted count can
    /// never exceed `limit` no matter how workers interleave.
    fn process(
        &self,
        candidate: ImageCandidate,
        category: &str,
        subcategory: Option<&str>,
        counters: &RunCounters,
        progress: &ProgressBar,
        limit: usize,
    ) {
        if !counters.try_reserve_accept(limit) {
            return;
        }
        match validate::validate(&candidate, &self.config.limits, &self.seen) {
            Ok(accepted) => {
                match self
                    .persister
                    .persist(&candidate, &accepted, category, subcategory)
                {
                    Ok((path, _record)) => {
                        progress.inc(1);
                        debug!("Accepted {} from {}", path.display(), candidate.source_url);
                    }
                    Err(Error::NamingCollision(path)) => {
                        counters.release_accept();
                        warn!(
                            "Filename collision at {}, skipping candidate",
                            path.display()
                        );
                        counters.collisions.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        counters.release_accept();
                        warn!(
                            "Failed to persist candidate from {}: {e}",
                            candidate.source_url
                        );
                        counters.write_errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Err(RejectReason::InvalidImageFormat) => {
                counters.release_accept();
                debug!("Rejected invalid payload from {}", candidate.source_url);
                counters.invalid.fetch_add(1, Ordering::Relaxed);
            }
            Err(RejectReason::DuplicateContent) => {
                counters.release_accept();
                debug!("Rejected duplicate payload from {}", candidate.source_url);
                counters.duplicates.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DirectorySource;
    use crate::test_utils::png_bytes;
    use crate::validate::ValidationLimits;
    use std::fs;
    use tempfile::tempdir;

    fn test_config(output_dir: &std::path::Path) -> Config {
        Config {
            output_dir: output_dir.to_path_buf(),
            seen_hashes_path: output_dir.join("seen_hashes.json"),
            limits: ValidationLimits {
                min_bytes: 0,
                max_bytes: 10_000_000,
                min_width: 1,
                min_height: 1,
                max_aspect_ratio: 100.0,
            },
            naming: NamingStrategy::Sequential,
            workers: 2,
            fetch_retries: 0,
        }
    }

    #[test]
    fn test_end_to_end_collect_from_directory() {
        let input = tempdir().unwrap();
        for i in 0..4u32 {
            fs::write(
                input.path().join(format!("img{i}.png")),
                png_bytes(10 + i, 20),
            )
            .unwrap();
        }
        // One duplicate payload under a different name and one garbage file
        fs::write(input.path().join("dupe.png"), png_bytes(10, 20)).unwrap();
        fs::write(input.path().join("junk.jpg"), vec![0u8; 512]).unwrap();

        let output = tempdir().unwrap();
        let curator = Curator::new(test_config(output.path())).unwrap();
        let source = Box::new(DirectorySource::new(input.path()).unwrap());
        let report = curator.run(source, "nature", None, 100).unwrap();

        assert_eq!(report.accepted, 4);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.invalid, 1);
        assert_eq!(report.fetch_errors, 0);

        // Images, sidecars, and the seen-hash file all landed on disk
        let entries = fs::read_dir(output.path().join("nature")).unwrap().count();
        assert_eq!(entries, 8); // 4 images + 4 sidecars
        assert!(output.path().join("seen_hashes.json").exists());
    }

    #[test]
    fn test_second_run_rejects_everything_as_duplicate() {
        let input = tempdir().unwrap();
        fs::write(input.path().join("a.png"), png_bytes(10, 20)).unwrap();
        fs::write(input.path().join("b.png"), png_bytes(11, 20)).unwrap();

        let output = tempdir().unwrap();
        let config = test_config(output.path());

        let first = Curator::new(config.clone()).unwrap();
        let report = first
            .run(
                Box::new(DirectorySource::new(input.path()).unwrap()),
                "nature",
                None,
                100,
            )
            .unwrap();
        assert_eq!(report.accepted, 2);

        // A fresh curator reloads the persisted seen set
        let second = Curator::new(config).unwrap();
        let report = second
            .run(
                Box::new(DirectorySource::new(input.path()).unwrap()),
                "nature",
                None,
                100,
            )
            .unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(report.duplicates, 2);
    }

    #[test]
    fn test_limit_stops_the_run() {
        let input = tempdir().unwrap();
        for i in 0..10u32 {
            fs::write(
                input.path().join(format!("img{i:02}.png")),
                png_bytes(10 + i, 20),
            )
            .unwrap();
        }

        let output = tempdir().unwrap();
        let mut config = test_config(output.path());
        config.workers = 1;

        let curator = Curator::new(config).unwrap();
        let source = Box::new(DirectorySource::new(input.path()).unwrap());
        let report = curator.run(source, "nature", None, 3).unwrap();

        assert_eq!(report.accepted, 3);
    }

    #[test]
    fn test_limit_is_never_exceeded_with_concurrent_workers() {
        // Plenty of distinct valid candidates racing on few acceptance slots
        let input = tempdir().unwrap();
        for i in 0..64u32 {
            fs::write(
                input.path().join(format!("img{i:03}.png")),
                png_bytes(10 + i, 20),
            )
            .unwrap();
        }

        for _ in 0..5 {
            let output = tempdir().unwrap();
            let mut config = test_config(output.path());
            config.workers = 8;

            let curator = Curator::new(config).unwrap();
            let source = Box::new(DirectorySource::new(input.path()).unwrap());
            let report = curator.run(source, "nature", None, 3).unwrap();

            assert_eq!(report.accepted, 3);

            // Exactly three images and three sidecars landed on disk
            let entries = fs::read_dir(output.path().join("nature")).unwrap().count();
            assert_eq!(entries, 6);
        }
    }
}
