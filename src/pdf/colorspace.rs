//! Image colour spaces and sample layouts
//!
//! Resolves the `/ColorSpace` entry of an image XObject and unpacks packed
//! samples into one byte per channel.

use lopdf::Object;

use crate::extract::{Colorspace, ExtractError, ExtractResult};

use super::document::LopdfDocument;

/// Colour space of an image stream as far as decoding is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    Device(Colorspace),
    /// Palette image: each sample indexes `lookup`, which holds `hival + 1`
    /// entries in the base space.
    Indexed {
        base: Colorspace,
        hival: u8,
        lookup: Vec<u8>,
    },
}

impl ColorSpec {
    /// Values stored per pixel in the image stream
    pub fn stream_components(&self) -> usize {
        match self {
            ColorSpec::Device(cs) => cs.components(),
            ColorSpec::Indexed { .. } => 1,
        }
    }

    /// Colour space of the expanded pixels
    pub fn output(&self) -> Colorspace {
        match self {
            ColorSpec::Device(cs) => *cs,
            ColorSpec::Indexed { base, .. } => *base,
        }
    }
}

fn device_from_name(name: &[u8]) -> ExtractResult<Colorspace> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Ok(Colorspace::Gray),
        b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(Colorspace::Rgb),
        b"DeviceCMYK" | b"CMYK" => Ok(Colorspace::Cmyk),
        other => Err(ExtractError::UnsupportedImage(format!(
            "colour space /{}",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn device_from_components(n: i64) -> ExtractResult<Colorspace> {
    match n {
        1 => Ok(Colorspace::Gray),
        3 => Ok(Colorspace::Rgb),
        4 => Ok(Colorspace::Cmyk),
        other => Err(ExtractError::UnsupportedImage(format!(
            "ICC profile with {} components",
            other
        ))),
    }
}

/// Resolve a `/ColorSpace` value
pub fn resolve(doc: &LopdfDocument, object: &Object) -> ExtractResult<ColorSpec> {
    resolve_family(doc, object, true)
}

/// Palette bases are resolved with `allow_indexed` unset, so a palette that
/// names itself (directly or through another palette) ends after one step.
fn resolve_family(
    doc: &LopdfDocument,
    object: &Object,
    allow_indexed: bool,
) -> ExtractResult<ColorSpec> {
    let object = doc.resolve(object)?;

    if let Ok(name) = object.as_name() {
        return device_from_name(name).map(ColorSpec::Device);
    }

    let array = object
        .as_array()
        .map_err(|_| ExtractError::UnsupportedImage("malformed colour space".to_string()))?;
    let family = array
        .first()
        .and_then(|o| o.as_name().ok())
        .ok_or_else(|| ExtractError::UnsupportedImage("colour space without family".to_string()))?;

    match family {
        b"ICCBased" => {
            let profile = array
                .get(1)
                .ok_or_else(|| ExtractError::Decode("ICCBased without profile".to_string()))?;
            let stream = doc.resolve(profile)?.as_stream()?;
            let n = stream.dict.get(b"N").and_then(Object::as_i64)?;
            device_from_components(n).map(ColorSpec::Device)
        }
        b"CalGray" | b"CalRGB" => device_from_name(family).map(ColorSpec::Device),
        b"Indexed" | b"I" if allow_indexed => resolve_indexed(doc, array),
        b"Indexed" | b"I" => Err(ExtractError::UnsupportedImage(
            "nested Indexed colour space".to_string(),
        )),
        other => device_from_name(other).map(ColorSpec::Device),
    }
}

fn resolve_indexed(doc: &LopdfDocument, array: &[Object]) -> ExtractResult<ColorSpec> {
    if array.len() < 4 {
        return Err(ExtractError::Decode("Indexed colour space is incomplete".to_string()));
    }

    let base = match resolve_family(doc, &array[1], false)? {
        ColorSpec::Device(cs) => cs,
        ColorSpec::Indexed { .. } => {
            return Err(ExtractError::UnsupportedImage(
                "nested Indexed colour space".to_string(),
            ))
        }
    };

    let hival = doc.resolve(&array[2])?.as_i64()?.clamp(0, 255) as u8;

    let lookup = match doc.resolve(&array[3])? {
        Object::String(bytes, _) => bytes.clone(),
        Object::Stream(stream) => doc.stream_bytes(stream)?,
        _ => {
            return Err(ExtractError::Decode(
                "Indexed lookup is neither string nor stream".to_string(),
            ))
        }
    };

    Ok(ColorSpec::Indexed {
        base,
        hival,
        lookup,
    })
}

/// Unpack `bits`-deep samples into bytes
///
/// Rows start on a byte boundary. With `scale` the values are stretched to
/// 0..=255; without it they are kept as-is (palette indices). 16-bit samples
/// keep their high byte.
pub fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    components: usize,
    bits: u8,
    scale: bool,
) -> ExtractResult<Vec<u8>> {
    let overflow = || ExtractError::Decode(format!("image too large: {}x{}", width, height));

    let values_per_row = (width as usize)
        .checked_mul(components)
        .ok_or_else(overflow)?;
    let row_bytes = values_per_row
        .checked_mul(bits as usize)
        .and_then(|row_bits| row_bits.checked_add(7))
        .ok_or_else(overflow)?
        / 8;
    let needed = row_bytes
        .checked_mul(height as usize)
        .ok_or_else(overflow)?;

    if data.len() < needed {
        return Err(ExtractError::Decode(format!(
            "image stream has {} bytes, expected {}",
            data.len(),
            needed
        )));
    }

    let mut out = Vec::with_capacity(values_per_row.saturating_mul(height as usize));

    match bits {
        8 => {
            for row in data.chunks_exact(row_bytes).take(height as usize) {
                out.extend_from_slice(&row[..values_per_row]);
            }
        }
        16 => {
            for row in data.chunks_exact(row_bytes).take(height as usize) {
                out.extend(row.chunks_exact(2).map(|pair| pair[0]));
            }
        }
        1 | 2 | 4 => {
            let max = (1u16 << bits) - 1;
            let mask = max as u8;
            for row in data.chunks_exact(row_bytes).take(height as usize) {
                for i in 0..values_per_row {
                    let bit = i * bits as usize;
                    let shift = 8 - bits as usize - (bit % 8);
                    let value = (row[bit / 8] >> shift) & mask;
                    out.push(if scale {
                        (u16::from(value) * 255 / max) as u8
                    } else {
                        value
                    });
                }
            }
        }
        other => {
            return Err(ExtractError::UnsupportedImage(format!(
                "{} bits per component",
                other
            )))
        }
    }

    Ok(out)
}

/// Replace palette indices with their colours
pub fn expand_indexed(indices: &[u8], base: Colorspace, hival: u8, lookup: &[u8]) -> Vec<u8> {
    let n = base.components();
    let mut out = Vec::with_capacity(indices.len() * n);
    for &index in indices {
        let start = usize::from(index.min(hival)) * n;
        for c in 0..n {
            out.push(lookup.get(start + c).copied().unwrap_or(0));
        }
    }
    out
}
