//! Extraction pipeline
//!
//! Single pass over a document: every page in order, every image reference
//! on the page in order. A failure on one image only drops that image; a
//! failure anywhere else aborts the call.

use tracing::{debug, warn};

use crate::pdf::LopdfDocument;

use super::error::{ExtractError, ExtractResult};
use super::pixmap::{downscale, encode_jpeg, encode_png, Pixmap};
use super::traits::{ImageDocument, NativeEncoding, NativeImage, PageImageRef};
use super::types::{
    ExtractOptions, ExtractedImage, ExtractionReport, ImageFormat, OutputPolicy, SkippedImage,
};

/// Extract every image from raw PDF bytes
pub fn extract(pdf_bytes: &[u8], options: &ExtractOptions) -> ExtractResult<Vec<ExtractedImage>> {
    extract_report(pdf_bytes, options).map(|report| report.images)
}

/// Extract every image from raw PDF bytes, keeping track of skipped images
pub fn extract_report(
    pdf_bytes: &[u8],
    options: &ExtractOptions,
) -> ExtractResult<ExtractionReport> {
    debug!(bytes = pdf_bytes.len(), policy = ?options.policy, "Opening PDF");
    let document = LopdfDocument::from_bytes(pdf_bytes)?;
    extract_from(&document, options)
}

/// Run the extraction over an already opened document
///
/// Returns [`ExtractError::NoImagesFound`] when nothing could be extracted,
/// including the case where every image was skipped.
pub fn extract_from<D: ImageDocument + ?Sized>(
    document: &D,
    options: &ExtractOptions,
) -> ExtractResult<ExtractionReport> {
    let mut report = ExtractionReport::default();

    for page_index in 0..document.page_count() {
        let refs = document.page_images(page_index)?;
        debug!(page = page_index + 1, images = refs.len(), "Scanning page");

        for image_ref in refs {
            match extract_image(document, &image_ref, options) {
                Ok(image) => {
                    debug!(name = %image.name, bytes = image.data.len(), "Image extracted");
                    report.images.push(image);
                }
                Err(e) => {
                    // Skipped images never reach the caller, only the log
                    warn!(
                        page = image_ref.page_index + 1,
                        index = image_ref.image_index + 1,
                        error = %e,
                        "Skipping image"
                    );
                    report.skipped.push(SkippedImage {
                        page: image_ref.page_index as u32 + 1,
                        index: image_ref.image_index as u32 + 1,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    debug!(
        extracted = report.images.len(),
        skipped = report.skipped.len(),
        "Extraction finished"
    );

    if report.images.is_empty() {
        return Err(ExtractError::NoImagesFound);
    }

    Ok(report)
}

fn extract_image<D: ImageDocument + ?Sized>(
    document: &D,
    image_ref: &PageImageRef,
    options: &ExtractOptions,
) -> ExtractResult<ExtractedImage> {
    let page = image_ref.page_index as u32 + 1;
    let index = image_ref.image_index as u32 + 1;

    match options.policy {
        OutputPolicy::Jpeg => {
            if let Some(native) = native_jpeg(document, image_ref) {
                return Ok(ExtractedImage::new(page, index, ImageFormat::Jpeg, native.data));
            }

            let pixmap = normalize(document.decode_image(image_ref)?);
            let picture = downscale(pixmap.into_image()?, options.max_dimension);
            let data = encode_jpeg(&picture, options.jpeg_quality)?;
            Ok(ExtractedImage::new(page, index, ImageFormat::Jpeg, data))
        }
        OutputPolicy::Png => {
            let pixmap = normalize(document.decode_image(image_ref)?);
            let data = encode_png(&pixmap.into_image()?)?;
            Ok(ExtractedImage::new(page, index, ImageFormat::Png, data))
        }
    }
}

/// Stored bytes of the image when they are already a JPEG
fn native_jpeg<D: ImageDocument + ?Sized>(
    document: &D,
    image_ref: &PageImageRef,
) -> Option<NativeImage> {
    match document.native_image(image_ref) {
        Ok(native) if native.encoding == NativeEncoding::Jpeg => Some(native),
        Ok(native) => {
            debug!(xref = ?image_ref.xref, encoding = native.encoding.label(), "Converting image");
            None
        }
        Err(e) => {
            debug!(xref = ?image_ref.xref, error = %e, "Stored image unavailable, decoding instead");
            None
        }
    }
}

/// Bring a buffer down to gray or RGB without alpha
fn normalize(pixmap: Pixmap) -> Pixmap {
    let colour_channels = pixmap.n() - usize::from(pixmap.has_alpha());
    if colour_channels > 3 || pixmap.has_alpha() {
        pixmap.to_rgb()
    } else {
        pixmap
    }
}
