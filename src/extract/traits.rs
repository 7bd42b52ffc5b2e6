//! Document engine interface
//!
//! The pipeline only needs a handful of capabilities from a PDF engine:
//! walking pages, listing image references, reading an image's stored bytes
//! and decoding it into pixels. Anything implementing [`ImageDocument`] can
//! be scanned by [`extract_from`](super::extract_from).

use super::error::ExtractResult;
use super::pixmap::Pixmap;

/// Object number and generation of an indirect object
pub type Xref = (u32, u16);

/// One embedded image on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageImageRef {
    /// 0-based page index
    pub page_index: usize,
    /// 0-based order of appearance on the page
    pub image_index: usize,
    /// Handle into the document's object table
    pub xref: Xref,
}

/// Encoding an image is stored with inside the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEncoding {
    Jpeg,
    Jpeg2000,
    Jbig2,
    CcittFax,
    /// Raw samples, possibly behind a generic compression filter
    Raw,
}

impl NativeEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            NativeEncoding::Jpeg => "jpeg",
            NativeEncoding::Jpeg2000 => "jpx",
            NativeEncoding::Jbig2 => "jbig2",
            NativeEncoding::CcittFax => "ccitt",
            NativeEncoding::Raw => "raw",
        }
    }
}

/// Image bytes exactly as stored in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeImage {
    pub encoding: NativeEncoding,
    pub data: Vec<u8>,
}

/// A PDF opened for image extraction
pub trait ImageDocument {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Image references on a page, in a stable order
    fn page_images(&self, page_index: usize) -> ExtractResult<Vec<PageImageRef>>;

    /// Stored bytes of an image plus the label of their encoding
    fn native_image(&self, image: &PageImageRef) -> ExtractResult<NativeImage>;

    /// Decode an image into a pixel buffer
    fn decode_image(&self, image: &PageImageRef) -> ExtractResult<Pixmap>;
}
