//! Candidate sources.
//!
//! The remote image service is an external collaborator; these adapters only
//! turn "somewhere with images" into a stream of [`ImageCandidate`]s. Two
//! concrete sources are provided: a local directory of image files and a
//! plain URL list fetched over HTTP.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{ImageCandidate, ImageKind};

/// Network-layer failure for a single fetch attempt.
///
/// Fetch failures drop the candidate and are counted in the run report; they
/// never abort the run.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Request exceeded the client timeout; retried a fixed number of times
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other HTTP failure; never retried
    #[error("request failed: {0}")]
    Http(String),

    /// Local read failure
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A stream of image candidates.
///
/// The pipeline feeds candidates from a single thread, so implementations
/// only need `Send`, not internal synchronization.
pub trait CandidateSource: Send {
    /// Produce the next candidate, or `None` when the source is exhausted.
    fn next_candidate(&mut self) -> Option<std::result::Result<ImageCandidate, FetchError>>;
}

/// Source backed by a directory of already-downloaded image files.
///
/// Each file becomes one candidate; the file stem is carried as the title.
pub struct DirectorySource {
    files: std::vec::IntoIter<PathBuf>,
}

impl DirectorySource {
    pub fn new(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            return Err(Error::FileNotFound(dir.to_path_buf()));
        }
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| has_image_extension(p))
            .collect();
        files.sort();
        debug!("Directory source {} holds {} files", dir.display(), files.len());
        Ok(Self {
            files: files.into_iter(),
        })
    }
}

impl CandidateSource for DirectorySource {
    fn next_candidate(&mut self) -> Option<std::result::Result<ImageCandidate, FetchError>> {
        let path = self.files.next()?;
        Some(read_candidate(&path))
    }
}

fn read_candidate(path: &Path) -> std::result::Result<ImageCandidate, FetchError> {
    let bytes = fs::read(path)?;
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string);
    Ok(ImageCandidate {
        bytes,
        source_url: format!("file://{}", path.display()),
        title,
        tags: Vec::new(),
    })
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageKind::from_extension)
        .is_some()
}

/// Source backed by a list of direct image URLs.
///
/// Issues blocking GETs with a per-request timeout. Timeouts are retried up
/// to `retries` extra attempts; every other failure drops the candidate on
/// the first attempt.
pub struct UrlListSource {
    client: reqwest::blocking::Client,
    urls: std::vec::IntoIter<String>,
    retries: u32,
}

impl UrlListSource {
    /// Build a source from an explicit URL list
    pub fn new(urls: Vec<String>, retries: u32) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            urls: urls.into_iter(),
            retries,
        })
    }

    /// Read one URL per line; blank lines and `#` comments are skipped
    pub fn from_file(path: &Path, retries: u32) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let urls: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self::new(urls, retries)
    }

    fn fetch(&self, url: &str) -> std::result::Result<ImageCandidate, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url) {
                Err(FetchError::Timeout(msg)) if attempt < self.retries => {
                    attempt += 1;
                    debug!("Timeout fetching {url} ({msg}), retry {attempt}/{}", self.retries);
                }
                other => return other,
            }
        }
    }

    fn fetch_once(&self, url: &str) -> std::result::Result<ImageCandidate, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(classify)?;
        let bytes = response.bytes().map_err(classify)?;
        Ok(ImageCandidate {
            bytes: bytes.to_vec(),
            source_url: url.to_string(),
            title: None,
            tags: Vec::new(),
        })
    }
}

impl CandidateSource for UrlListSource {
    fn next_candidate(&mut self) -> Option<std::result::Result<ImageCandidate, FetchError>> {
        let url = self.urls.next()?;
        Some(self.fetch(&url))
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else {
        FetchError::Http(err.to_string())
    }
}

// -- Tests --
