use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Image kinds the collection stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    /// File extension used when persisting this kind
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Map a decoded format to a storable kind
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    /// Check if a file extension names a storable kind
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// A fetched image payload under consideration for the collection.
///
/// Transient: created per fetch attempt and discarded after the
/// accept/reject decision.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    /// Raw image bytes as fetched
    pub bytes: Vec<u8>,

    /// Where the payload came from
    pub source_url: String,

    /// Free-text title if the source provides one
    pub title: Option<String>,

    /// Free-text tags if the source provides them
    pub tags: Vec<String>,
}

/// Content digest used as the duplicate-detection key.
///
/// Computed deterministically over the full byte payload; identical bytes
/// always produce the same hash regardless of source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute the digest of a raw payload using the Blake3 algorithm
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Lowercase hex form, as stored in JSON files
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// Parse the hex form back into a hash
    pub fn from_hex(s: &str) -> Option<Self> {
        blake3::Hash::from_hex(s).ok().map(|h| Self(*h.as_bytes()))
    }

    /// First 16 hex characters, used for hash-derived filenames
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid content hash"))
    }
}

/// Persisted metadata for one accepted image, stored as a JSON sidecar
/// next to the image file. Immutable once written except for later
/// metadata-repair passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallpaperRecord {
    /// Filename stem the image was stored under
    pub id: String,

    /// Category directory the image belongs to
    pub category: String,

    /// Title carried over from the source, if any
    pub title: Option<String>,

    /// Tags carried over from the source
    pub tags: Vec<String>,

    /// Payload size in bytes
    pub file_size: u64,

    /// Content hash, hex encoded
    pub hash: ContentHash,

    /// Decoded pixel width
    pub width: u32,

    /// Decoded pixel height
    pub height: u32,

    /// Where the payload came from
    pub source_url: String,

    /// ISO-8601 timestamp of when the record was written
    pub created_at: DateTime<Utc>,

    /// Finer-grained label used for diversity-aware selection
    #[serde(default)]
    pub subcategory: Option<String>,
}
