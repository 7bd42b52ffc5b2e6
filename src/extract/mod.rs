//! Image extraction
//!
//! Turns raw PDF bytes into a list of named, encoded images.
//!
//! # Pipeline
//!
//! ```text
//! PDF bytes ──► ImageDocument ──► per page ──► per image reference
//!                                                   │
//!                         stored as JPEG? ──yes──► copy bytes (.jpg)
//!                                                   │ no
//!                                                   ▼
//!                   decode ─► CMYK/alpha → RGB ─► fit 1200px ─► JPEG q85
//! ```
//!
//! A failing image is skipped and logged; the rest of the document is still
//! processed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pdf_image_extractor::extract::{extract, ExtractOptions};
//!
//! let images = extract(&pdf_bytes, &ExtractOptions::default())?;
//! for image in &images {
//!     println!("{} (page {}, {} bytes)", image.name, image.page, image.data.len());
//! }
//! ```

mod error;
mod pipeline;
mod pixmap;
mod traits;
mod types;

pub use error::{ExtractError, ExtractResult};
pub use pipeline::{extract, extract_from, extract_report};
pub use pixmap::{downscale, encode_jpeg, encode_png, fit_within, Colorspace, Pixmap};
pub use traits::{ImageDocument, NativeEncoding, NativeImage, PageImageRef, Xref};
pub use types::{
    image_name, ExtractOptions, ExtractedImage, ExtractionReport, ImageFormat, OutputPolicy,
    SkippedImage, JPEG_QUALITY, MAX_DIMENSION,
};
