//! ZIP packing
//!
//! Entries are written in input order with the `Stored` method: the payloads
//! are already compressed image formats.

use std::collections::{BTreeSet, HashSet};
use std::io::{Cursor, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::extract::ExtractedImage;

use super::entry::{check_name, parse_items, ArchiveEntry};
use super::error::{ArchiveError, ArchiveResult};

/// Pack entries into an in-memory ZIP
///
/// Names are validated up front so a bad entry never yields a partial archive.
pub fn pack(entries: &[ArchiveEntry]) -> ArchiveResult<Vec<u8>> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        check_name(&entry.name)?;
        if !seen.insert(entry.name.as_str()) {
            return Err(ArchiveError::DuplicateName(entry.name.clone()));
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        writer.write_all(&entry.data)?;
    }

    let archive = writer.finish()?.into_inner();
    debug!(entries = entries.len(), bytes = archive.len(), "ZIP packed");
    Ok(archive)
}

/// Parse `name|base64` items and pack them
pub fn pack_items<S: AsRef<str>>(items: &[S]) -> ArchiveResult<Vec<u8>> {
    pack(&parse_items(items)?)
}

/// Which extracted images go into a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every image of the document
    All,
    /// Only the named images; an empty set packs nothing
    Names(BTreeSet<String>),
}

impl Selection {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Names(names) => names.contains(name),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(names: I) -> Self {
        Selection::Names(names.into_iter().map(Into::into).collect())
    }
}

/// Pack the selected images in document order
///
/// Names in the selection that match no image are ignored.
pub fn pack_selection(images: &[ExtractedImage], selection: &Selection) -> ArchiveResult<Vec<u8>> {
    let entries: Vec<ArchiveEntry> = images
        .iter()
        .filter(|image| selection.contains(&image.name))
        .map(ArchiveEntry::from)
        .collect();
    pack(&entries)
}
