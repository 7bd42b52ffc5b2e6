//! PDF access via lopdf
//!
//! Opens documents from memory and exposes their embedded images through the
//! [`ImageDocument`](crate::extract::ImageDocument) interface.

mod colorspace;
mod document;

pub use document::LopdfDocument;
