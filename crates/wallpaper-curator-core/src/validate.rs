//! Accept/reject decisions for fetched candidates.

use std::io::Cursor;

use image::io::Reader as ImageReader;
use serde::{Deserialize, Serialize};

use crate::hash::content_hash;
use crate::seen::SeenHashSet;
use crate::types::{ContentHash, ImageCandidate, ImageKind};

/// Size and dimension thresholds applied to every candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationLimits {
    /// Smallest acceptable payload in bytes
    pub min_bytes: u64,

    /// Largest acceptable payload in bytes
    pub max_bytes: u64,

    /// Minimum pixel width
    pub min_width: u32,

    /// Minimum pixel height
    pub min_height: u32,

    /// Ceiling on max(width, height) / min(width, height)
    pub max_aspect_ratio: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        // Portrait phone screens: at least 720x1280, no extreme panoramas
        Self {
            min_bytes: 50_000,
            max_bytes: 10_000_000,
            min_width: 720,
            min_height: 1280,
            max_aspect_ratio: 3.0,
        }
    }
}

/// Why a candidate was dropped.
///
/// Rejections are aggregated into run counters, never raised to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Payload failed the size, decode, or dimension checks
    InvalidImageFormat,

    /// Content hash already present in the seen set
    DuplicateContent,
}

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Content hash, already inserted into the seen set
    pub hash: ContentHash,

    /// Decoded pixel width
    pub width: u32,

    /// Decoded pixel height
    pub height: u32,

    /// Decoded image kind
    pub kind: ImageKind,
}

/// Decide whether a freshly fetched candidate should be kept.
///
/// Checks run in a fixed order: payload size, header decode, dimensions,
/// aspect ratio, then duplicate detection. The content hash is only computed
/// for payloads that pass the size gate, so an undersized payload rejects as
/// `InvalidImageFormat` without ever touching the seen set. On accept the
/// hash has been inserted into `seen` under the set's lock, so concurrent
/// workers cannot both accept byte-identical payloads.
pub fn validate(
    candidate: &ImageCandidate,
    limits: &ValidationLimits,
    seen: &SeenHashSet,
) -> Result<Accepted, RejectReason> {
    let len = candidate.bytes.len() as u64;
    if len < limits.min_bytes || len > limits.max_bytes {
        return Err(RejectReason::InvalidImageFormat);
    }

    // Header-only decode: enough for format and dimensions, no pixel work
    let reader = ImageReader::new(Cursor::new(candidate.bytes.as_slice()))
        .with_guessed_format()
        .map_err(|_| RejectReason::InvalidImageFormat)?;
    let kind = reader
        .format()
        .and_then(ImageKind::from_image_format)
        .ok_or(RejectReason::InvalidImageFormat)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|_| RejectReason::InvalidImageFormat)?;

    // Zero-area dimensions are treated the same as an undecodable payload
    if width == 0 || height == 0 {
        return Err(RejectReason::InvalidImageFormat);
    }
    if width < limits.min_width || height < limits.min_height {
        return Err(RejectReason::InvalidImageFormat);
    }
    let ratio = f64::from(width.max(height)) / f64::from(width.min(height));
    if ratio > limits.max_aspect_ratio {
        return Err(RejectReason::InvalidImageFormat);
    }

    let hash = content_hash(&candidate.bytes);
    if !seen.check_and_insert(hash) {
        return Err(RejectReason::DuplicateContent);
    }

    Ok(Accepted {
        hash,
        width,
        height,
        kind,
    })
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{candidate_from, png_bytes};

    fn lenient_limits() -> ValidationLimits {
        ValidationLimits {
            min_bytes: 0,
            max_bytes: 10_000_000,
            min_width: 1,
            min_height: 1,
            max_aspect_ratio: 100.0,
        }
    }

    #[test]
    fn test_undersized_payload_rejects_before_dedup() {
        let limits = ValidationLimits {
            min_bytes: 50_000,
            ..lenient_limits()
        };
        let seen = SeenHashSet::new();
        let candidate = candidate_from(vec![0u8; 10 * 1024], "https://a.example/img");

        // Both passes reject on size; the dedup set is never reached
        assert_eq!(
            validate(&candidate, &limits, &seen),
            Err(RejectReason::InvalidImageFormat)
        );
        assert_eq!(
            validate(&candidate, &limits, &seen),
            Err(RejectReason::InvalidImageFormat)
        );
        assert!(seen.is_empty());
    }

    #[test]
    fn test_oversized_payload_rejects() {
        let limits = ValidationLimits {
            max_bytes: 10,
            ..lenient_limits()
        };
        let seen = SeenHashSet::new();
        let candidate = candidate_from(png_bytes(8, 8), "https://a.example/img");

        assert_eq!(
            validate(&candidate, &limits, &seen),
            Err(RejectReason::InvalidImageFormat)
        );
    }

    #[test]
    fn test_undecodable_payload_rejects_without_error() {
        let seen = SeenHashSet::new();
        let candidate = candidate_from(vec![0xAB; 4096], "https://a.example/garbage");

        assert_eq!(
            validate(&candidate, &lenient_limits(), &seen),
            Err(RejectReason::InvalidImageFormat)
        );
        assert!(seen.is_empty());
    }

    #[test]
    fn test_small_dimensions_reject() {
        let limits = ValidationLimits {
            min_width: 720,
            min_height: 1280,
            ..lenient_limits()
        };
        let seen = SeenHashSet::new();
        let candidate = candidate_from(png_bytes(64, 64), "https://a.example/tiny");

        assert_eq!(
            validate(&candidate, &limits, &seen),
            Err(RejectReason::InvalidImageFormat)
        );
    }

    #[test]
    fn test_extreme_aspect_ratio_rejects() {
        let limits = ValidationLimits {
            max_aspect_ratio: 3.0,
            ..lenient_limits()
        };
        let seen = SeenHashSet::new();
        let candidate = candidate_from(png_bytes(400, 20), "https://a.example/banner");

        assert_eq!(
            validate(&candidate, &limits, &seen),
            Err(RejectReason::InvalidImageFormat)
        );
    }

    #[test]
    fn test_identical_bytes_from_different_urls_deduplicate() {
        let seen = SeenHashSet::new();
        let bytes = png_bytes(32, 32);
        let first = candidate_from(bytes.clone(), "https://a.example/one.png");
        let second = candidate_from(bytes, "https://b.example/two.png");

        let accepted = validate(&first, &lenient_limits(), &seen).unwrap();
        assert!(seen.contains(&accepted.hash));

        // Dedup is hash-based, never URL-based
        assert_eq!(
            validate(&second, &lenient_limits(), &seen),
            Err(RejectReason::DuplicateContent)
        );
    }

    #[test]
    fn test_accept_reports_dimensions_and_kind() {
        let seen = SeenHashSet::new();
        let candidate = candidate_from(png_bytes(48, 96), "https://a.example/ok.png");

        let accepted = validate(&candidate, &lenient_limits(), &seen).unwrap();
        assert_eq!((accepted.width, accepted.height), (48, 96));
        assert_eq!(accepted.kind, ImageKind::Png);
        assert_eq!(accepted.hash, content_hash(&candidate.bytes));
    }
}
