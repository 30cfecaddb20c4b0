//! Shared helpers for unit tests.

use std::io::Cursor;

use crate::types::ImageCandidate;

/// Encode a real PNG of the given dimensions
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 200]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Wrap raw bytes in a candidate with no title or tags
pub fn candidate_from(bytes: Vec<u8>, source_url: &str) -> ImageCandidate {
    ImageCandidate {
        bytes,
        source_url: source_url.to_string(),
        title: None,
        tags: Vec::new(),
    }
}

/// A candidate with title and tags, for scoring and persistence tests
pub fn tagged_candidate(bytes: Vec<u8>, source_url: &str, title: &str, tags: &[&str]) -> ImageCandidate {
    ImageCandidate {
        bytes,
        source_url: source_url.to_string(),
        title: Some(title.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}
