//! ZIP downloads
//!
//! Packs named byte blobs into a single archive, either from `name|base64`
//! request items or from a selection of extracted images.

mod entry;
mod error;
mod packer;

pub use entry::{check_name, parse_items, ArchiveEntry};
pub use error::{ArchiveError, ArchiveResult};
pub use packer::{pack, pack_items, pack_selection, Selection};
