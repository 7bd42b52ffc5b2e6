//! lopdf-backed document
//!
//! Implements [`ImageDocument`] directly on top of the PDF object graph: image
//! XObjects are found through page resources and decoded from their streams.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::extract::{
    Colorspace, ExtractError, ExtractResult, ImageDocument, NativeEncoding, NativeImage,
    PageImageRef, Pixmap, Xref,
};

use super::colorspace::{self, ColorSpec};

/// Filters lopdf can undo on its own
const GENERIC_FILTERS: &[&[u8]] = &[b"FlateDecode", b"Fl", b"LZWDecode", b"LZW"];

/// Longest chain of indirect references followed before giving up
const MAX_REFERENCE_DEPTH: usize = 32;

/// A PDF held in memory for the duration of one extraction
pub struct LopdfDocument {
    document: Document,
    pages: Vec<ObjectId>,
}

impl LopdfDocument {
    /// Parse a PDF from memory
    pub fn from_bytes(data: &[u8]) -> ExtractResult<Self> {
        let document = Document::load_mem(data)
            .map_err(|e| ExtractError::MalformedDocument(e.to_string()))?;
        let pages = document.get_pages().into_values().collect::<Vec<_>>();

        debug!(pages = pages.len(), "PDF opened");

        Ok(Self { document, pages })
    }

    /// Follow indirect references until a direct object is reached
    pub fn resolve<'a>(&'a self, object: &'a Object) -> ExtractResult<&'a Object> {
        let mut current = object;
        for _ in 0..MAX_REFERENCE_DEPTH {
            match current {
                Object::Reference(id) => current = self.document.get_object(*id)?,
                direct => return Ok(direct),
            }
        }
        Err(ExtractError::Engine("reference chain too deep".to_string()))
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> ExtractResult<&'a Dictionary> {
        Ok(self.resolve(object)?.as_dict()?)
    }

    fn image_stream(&self, xref: Xref) -> ExtractResult<&Stream> {
        Ok(self.document.get_object(xref)?.as_stream()?)
    }

    /// Stream content with every filter undone
    ///
    /// Only generic compression filters are handled here; image codecs are
    /// dealt with by the caller.
    pub fn stream_bytes(&self, stream: &Stream) -> ExtractResult<Vec<u8>> {
        let filters = filter_names(&stream.dict);
        if filters.is_empty() {
            return Ok(stream.content.clone());
        }

        if let Some(unsupported) = filters.iter().find(|f| !GENERIC_FILTERS.contains(f)) {
            return Err(ExtractError::UnsupportedImage(format!(
                "filter /{}",
                String::from_utf8_lossy(unsupported)
            )));
        }

        stream
            .decompressed_content()
            .map_err(|e| ExtractError::Decode(e.to_string()))
    }

    /// `/Resources` of a page, inherited from the page tree when absent
    fn page_resources(&self, page_id: ObjectId) -> ExtractResult<Option<&Dictionary>> {
        let mut node = self.document.get_dictionary(page_id)?;
        let mut visited = HashSet::from([page_id]);

        loop {
            if let Ok(resources) = node.get(b"Resources") {
                return Ok(Some(self.resolve_dict(resources)?));
            }

            match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) if visited.insert(parent) => {
                    node = self.document.get_dictionary(parent)?;
                }
                _ => return Ok(None),
            }
        }
    }

    /// Collect image XObjects in dictionary order, descending into forms
    fn collect_images(
        &self,
        resources: &Dictionary,
        images: &mut Vec<Xref>,
        visited_forms: &mut HashSet<ObjectId>,
    ) -> ExtractResult<()> {
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(());
        };

        for (_, entry) in self.resolve_dict(xobjects)?.iter() {
            let Object::Reference(id) = entry else {
                continue;
            };
            let Ok(stream) = self.document.get_object(*id).and_then(Object::as_stream) else {
                continue;
            };

            let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name).ok();
            if subtype == Some(&b"Image"[..]) {
                images.push(*id);
            } else if subtype == Some(&b"Form"[..]) && visited_forms.insert(*id) {
                let Ok(form_resources) = stream.dict.get(b"Resources") else {
                    continue;
                };
                match self.resolve_dict(form_resources) {
                    Ok(form_resources) => {
                        self.collect_images(form_resources, images, visited_forms)?
                    }
                    Err(e) => {
                        debug!(form = ?id, error = %e, "Skipping form with unreadable resources");
                    }
                }
            }
        }

        Ok(())
    }

    /// Decode an image stream into pixels
    ///
    /// With `with_mask` the `/SMask` is decoded too, but never the mask's own
    /// `/SMask`, so a mask pointing back at its image stops after one level.
    fn decode_stream(&self, stream: &Stream, with_mask: bool) -> ExtractResult<Pixmap> {
        let dict = &stream.dict;

        if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
            return Err(ExtractError::UnsupportedImage("stencil mask".to_string()));
        }

        let filters = filter_names(dict);
        if matches!(filters.last(), Some(&f) if f == b"DCTDecode" || f == b"DCT") {
            if filters.len() > 1 {
                return Err(ExtractError::UnsupportedImage(
                    "JPEG behind additional filters".to_string(),
                ));
            }
            return decode_jpeg(&stream.content);
        }

        let width = dimension(dict, b"Width")?;
        let height = dimension(dict, b"Height")?;
        let bits = match dict.get(b"BitsPerComponent").and_then(Object::as_i64) {
            Ok(bits) => u8::try_from(bits).map_err(|_| {
                ExtractError::UnsupportedImage(format!("{} bits per component", bits))
            })?,
            Err(_) => 8,
        };

        let spec = match dict.get(b"ColorSpace") {
            Ok(object) => colorspace::resolve(self, object)?,
            Err(_) => {
                return Err(ExtractError::UnsupportedImage(
                    "image without colour space".to_string(),
                ))
            }
        };

        let data = self.stream_bytes(stream)?;

        let samples = match &spec {
            ColorSpec::Device(cs) => {
                let mut samples =
                    colorspace::unpack_samples(&data, width, height, cs.components(), bits, true)?;
                if decode_inverted(dict) {
                    samples.iter_mut().for_each(|v| *v = 255 - *v);
                }
                samples
            }
            ColorSpec::Indexed {
                base,
                hival,
                lookup,
            } => {
                let indices = colorspace::unpack_samples(
                    &data,
                    width,
                    height,
                    spec.stream_components(),
                    bits,
                    false,
                )?;
                colorspace::expand_indexed(&indices, *base, *hival, lookup)
            }
        };

        let pixmap = Pixmap::new(width, height, spec.output(), samples)?;

        if !with_mask {
            return Ok(pixmap);
        }

        match self.soft_mask(dict, width, height) {
            Some(alpha) => pixmap.with_alpha(alpha),
            None => Ok(pixmap),
        }
    }

    /// Alpha plane from `/SMask` when it matches the image size
    fn soft_mask(&self, dict: &Dictionary, width: u32, height: u32) -> Option<Vec<u8>> {
        let mask = dict.get(b"SMask").ok()?;
        let stream = self.resolve(mask).ok()?.as_stream().ok()?;

        match self.decode_stream(stream, false) {
            Ok(mask) if mask.width() == width && mask.height() == height => {
                Some(match mask.colorspace() {
                    Colorspace::Gray => mask.samples().to_vec(),
                    _ => mask.to_rgb().samples().chunks_exact(3).map(|px| px[0]).collect(),
                })
            }
            Ok(mask) => {
                debug!(
                    mask_width = mask.width(),
                    mask_height = mask.height(),
                    "Ignoring soft mask with mismatched size"
                );
                None
            }
            Err(e) => {
                debug!(error = %e, "Ignoring undecodable soft mask");
                None
            }
        }
    }
}

impl ImageDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_images(&self, page_index: usize) -> ExtractResult<Vec<PageImageRef>> {
        let page_id = *self
            .pages
            .get(page_index)
            .ok_or_else(|| ExtractError::Engine(format!("page {} out of range", page_index)))?;

        let mut xrefs = Vec::new();
        if let Some(resources) = self.page_resources(page_id)? {
            self.collect_images(resources, &mut xrefs, &mut HashSet::new())?;
        }

        Ok(xrefs
            .into_iter()
            .enumerate()
            .map(|(image_index, xref)| PageImageRef {
                page_index,
                image_index,
                xref,
            })
            .collect())
    }

    fn native_image(&self, image: &PageImageRef) -> ExtractResult<NativeImage> {
        let stream = self.image_stream(image.xref)?;
        let filters = filter_names(&stream.dict);

        let encoding = match filters.as_slice() {
            [b"DCTDecode"] | [b"DCT"] => NativeEncoding::Jpeg,
            [.., b"JPXDecode"] => NativeEncoding::Jpeg2000,
            [.., b"JBIG2Decode"] => NativeEncoding::Jbig2,
            [.., b"CCITTFaxDecode"] | [.., b"CCF"] => NativeEncoding::CcittFax,
            _ => NativeEncoding::Raw,
        };

        Ok(NativeImage {
            encoding,
            data: stream.content.clone(),
        })
    }

    fn decode_image(&self, image: &PageImageRef) -> ExtractResult<Pixmap> {
        let stream = self.image_stream(image.xref)?;
        self.decode_stream(stream, true)
    }
}

/// Names in `/Filter`, in application order
fn filter_names(dict: &Dictionary) -> Vec<&[u8]> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(filters)) => filters
            .iter()
            .filter_map(|f| f.as_name().ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> ExtractResult<u32> {
    let value = dict.get(key).and_then(Object::as_i64)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ExtractError::Decode(format!("invalid image dimension {}", value)))
}

/// Whether `/Decode` flips the first component (e.g. `[1 0]`)
fn decode_inverted(dict: &Dictionary) -> bool {
    let Ok(Object::Array(decode)) = dict.get(b"Decode") else {
        return false;
    };

    let number = |o: &Object| match o {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    };

    matches!(
        (decode.first().and_then(number), decode.get(1).and_then(number)),
        (Some(lo), Some(hi)) if lo > hi
    )
}

fn decode_jpeg(data: &[u8]) -> ExtractResult<Pixmap> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| ExtractError::Decode(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());

    match decoded {
        image::DynamicImage::ImageLuma8(gray) => {
            Pixmap::new(width, height, Colorspace::Gray, gray.into_raw())
        }
        other => Pixmap::new(width, height, Colorspace::Rgb, other.into_rgb8().into_raw()),
    }
}
