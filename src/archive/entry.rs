//! Archive request items
//!
//! Clients send each file as `"<name>|<base64 payload>"`. The name ends at
//! the first pipe; no escaping exists, so names may not contain one.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::extract::ExtractedImage;

use super::error::{ArchiveError, ArchiveResult};

/// One file to place in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Parse a `name|base64` item
    ///
    /// The payload may also be a full data URI (`data:image/png;base64,...`),
    /// which is what browsers hand back from an `<img>` source.
    pub fn parse(item: &str, index: usize) -> ArchiveResult<Self> {
        let malformed = |reason: String| ArchiveError::MalformedItem { index, reason };

        let (name, payload) = item
            .split_once('|')
            .ok_or_else(|| malformed("missing '|' separator".to_string()))?;

        let payload = payload.trim();
        let payload = match payload.strip_prefix("data:") {
            Some(uri) => {
                uri.split_once(',')
                    .ok_or_else(|| malformed("data URI without payload".to_string()))?
                    .1
            }
            None => payload,
        };

        let data = BASE64
            .decode(payload)
            .map_err(|e| malformed(format!("invalid base64: {}", e)))?;

        check_name(name)?;

        Ok(Self::new(name, data))
    }
}

impl From<&ExtractedImage> for ArchiveEntry {
    fn from(image: &ExtractedImage) -> Self {
        Self::new(image.name.clone(), image.data.clone())
    }
}

/// Parse every item, failing on the first malformed one
pub fn parse_items<S: AsRef<str>>(items: &[S]) -> ArchiveResult<Vec<ArchiveEntry>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| ArchiveEntry::parse(item.as_ref(), index))
        .collect()
}

/// Reject names that are empty or could resolve outside the archive root
pub fn check_name(name: &str) -> ArchiveResult<()> {
    let unsafe_name = name.is_empty()
        || name.starts_with('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.split('/').any(|part| part == "..");

    if unsafe_name {
        return Err(ArchiveError::UnsafeName(name.to_string()));
    }
    Ok(())
}
