//! Pixel buffers
//!
//! A decoded image before it is encoded for output, plus the helpers that
//! normalise, resample and encode it.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

use super::error::{ExtractError, ExtractResult};

/// Colour space of a pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Gray,
    Rgb,
    Cmyk,
}

impl Colorspace {
    /// Colour channels, alpha excluded
    pub fn components(&self) -> usize {
        match self {
            Colorspace::Gray => 1,
            Colorspace::Rgb => 3,
            Colorspace::Cmyk => 4,
        }
    }
}

/// Decoded raster with 8 bits per channel
///
/// Colour samples are interleaved; alpha, when present, is kept as a
/// separate plane since PDFs store it in its own soft-mask stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    colorspace: Colorspace,
    samples: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl Pixmap {
    pub fn new(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        samples: Vec<u8>,
    ) -> ExtractResult<Self> {
        if width == 0 || height == 0 {
            return Err(ExtractError::Decode(format!(
                "invalid image dimensions {}x{}",
                width, height
            )));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(colorspace.components()))
            .ok_or_else(|| {
                ExtractError::Decode(format!("image too large: {}x{}", width, height))
            })?;
        if samples.len() < expected {
            return Err(ExtractError::Decode(format!(
                "expected {} bytes of samples, got {}",
                expected,
                samples.len()
            )));
        }

        let mut samples = samples;
        samples.truncate(expected);

        Ok(Self {
            width,
            height,
            colorspace,
            samples,
            alpha: None,
        })
    }

    /// Attach an alpha plane (one byte per pixel)
    pub fn with_alpha(mut self, alpha: Vec<u8>) -> ExtractResult<Self> {
        let expected = self.pixel_count();
        if alpha.len() < expected {
            return Err(ExtractError::Decode(format!(
                "alpha plane has {} bytes, expected {}",
                alpha.len(),
                expected
            )));
        }
        let mut alpha = alpha;
        alpha.truncate(expected);
        self.alpha = Some(alpha);
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Channel count including alpha
    pub fn n(&self) -> usize {
        self.colorspace.components() + usize::from(self.has_alpha())
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reinterpret as alpha-free RGB
    ///
    /// Alpha is dropped rather than composited against a background.
    pub fn to_rgb(&self) -> Pixmap {
        let samples = match self.colorspace {
            Colorspace::Rgb => self.samples.clone(),
            Colorspace::Gray => self.samples.iter().flat_map(|&v| [v, v, v]).collect(),
            Colorspace::Cmyk => self
                .samples
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = u16::from(px[3]);
                    let channel = |c: u8| 255 - (u16::from(c) + k).min(255) as u8;
                    [channel(px[0]), channel(px[1]), channel(px[2])]
                })
                .collect(),
        };

        Pixmap {
            width: self.width,
            height: self.height,
            colorspace: Colorspace::Rgb,
            samples,
            alpha: None,
        }
    }

    /// Convert into an `image` buffer ready for resampling and encoding
    pub fn into_image(self) -> ExtractResult<DynamicImage> {
        let (width, height) = (self.width, self.height);
        let buffer_error =
            || ExtractError::Decode("sample buffer does not match dimensions".to_string());

        let image = match (self.colorspace, self.alpha) {
            (Colorspace::Cmyk, _) => {
                return Err(ExtractError::UnsupportedImage(
                    "CMYK buffers must be converted to RGB before encoding".to_string(),
                ))
            }
            (Colorspace::Gray, None) => DynamicImage::ImageLuma8(
                GrayImage::from_raw(width, height, self.samples).ok_or_else(buffer_error)?,
            ),
            (Colorspace::Rgb, None) => DynamicImage::ImageRgb8(
                RgbImage::from_raw(width, height, self.samples).ok_or_else(buffer_error)?,
            ),
            (Colorspace::Gray, Some(alpha)) => {
                let raw = self
                    .samples
                    .iter()
                    .zip(alpha.iter())
                    .flat_map(|(&v, &a)| [v, a])
                    .collect();
                DynamicImage::ImageLumaA8(
                    GrayAlphaImage::from_raw(width, height, raw).ok_or_else(buffer_error)?,
                )
            }
            (Colorspace::Rgb, Some(alpha)) => {
                let raw = self
                    .samples
                    .chunks_exact(3)
                    .zip(alpha.iter())
                    .flat_map(|(px, &a)| [px[0], px[1], px[2], a])
                    .collect();
                DynamicImage::ImageRgba8(
                    RgbaImage::from_raw(width, height, raw).ok_or_else(buffer_error)?,
                )
            }
        };

        Ok(image)
    }
}

/// Target size for an image whose long edge exceeds `max`
///
/// Returns `None` when the image already fits; never upscales. The long edge
/// becomes exactly `max` and the short edge is rounded to the nearest pixel.
pub fn fit_within(width: u32, height: u32, max: u32) -> Option<(u32, u32)> {
    if width <= max && height <= max {
        return None;
    }

    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (u64::from(short) * u64::from(max) + u64::from(long) / 2) / u64::from(long);
        (scaled as u32).max(1)
    };

    if width >= height {
        Some((max, scale(height, width)))
    } else {
        Some((scale(width, height), max))
    }
}

/// Shrink an image so its long edge is at most `max`
pub fn downscale(image: DynamicImage, max: u32) -> DynamicImage {
    match fit_within(image.width(), image.height(), max) {
        Some((width, height)) => image.resize_exact(width, height, FilterType::Lanczos3),
        None => image,
    }
}

pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ExtractResult<Vec<u8>> {
    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);
    image.write_with_encoder(encoder)?;
    Ok(output)
}

pub fn encode_png(image: &DynamicImage) -> ExtractResult<Vec<u8>> {
    let mut output = Vec::new();
    image.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ColorType;

    #[test]
    fn test_fit_within_boundary() {
        assert_eq!(fit_within(1200, 800, 1200), None);
        assert_eq!(fit_within(800, 1200, 1200), None);
        assert_eq!(fit_within(1201, 800, 1200), Some((1200, 799)));
        assert_eq!(fit_within(2000, 1000, 1200), Some((1200, 600)));
        assert_eq!(fit_within(1000, 3000, 1200), Some((400, 1200)));
        assert_eq!(fit_within(10, 1, 1200), None);
    }

    #[test]
    fn test_fit_within_keeps_one_pixel_minimum() {
        assert_eq!(fit_within(100_000, 1, 1200), Some((1200, 1)));
    }

    #[test]
    fn test_cmyk_to_rgb() {
        // white, black via K, pure cyan
        let samples = vec![0, 0, 0, 0, 0, 0, 0, 255, 255, 0, 0, 0];
        let pixmap = Pixmap::new(3, 1, Colorspace::Cmyk, samples).unwrap();
        assert_eq!(pixmap.n(), 4);

        let rgb = pixmap.to_rgb();
        assert_eq!(rgb.colorspace(), Colorspace::Rgb);
        assert_eq!(rgb.n(), 3);
        assert_eq!(rgb.samples(), &[255, 255, 255, 0, 0, 0, 0, 255, 255]);
    }

    #[test]
    fn test_alpha_is_dropped_by_rgb_conversion() {
        let pixmap = Pixmap::new(2, 1, Colorspace::Gray, vec![10, 200])
            .unwrap()
            .with_alpha(vec![0, 255])
            .unwrap();
        assert!(pixmap.has_alpha());
        assert_eq!(pixmap.n(), 2);

        let rgb = pixmap.to_rgb();
        assert!(!rgb.has_alpha());
        assert_eq!(rgb.samples(), &[10, 10, 10, 200, 200, 200]);
    }

    #[test]
    fn test_short_sample_buffer_is_rejected() {
        let result = Pixmap::new(4, 4, Colorspace::Rgb, vec![0; 10]);
        assert!(matches!(result, Err(ExtractError::Decode(_))));

        let result = Pixmap::new(0, 4, Colorspace::Gray, vec![]);
        assert!(matches!(result, Err(ExtractError::Decode(_))));
    }

    #[test]
    fn test_huge_dimensions_are_rejected() {
        let result = Pixmap::new(u32::MAX, u32::MAX, Colorspace::Cmyk, vec![0; 16]);
        assert!(matches!(result, Err(ExtractError::Decode(_))));
    }

    #[test]
    fn test_cmyk_cannot_be_encoded_directly() {
        let pixmap = Pixmap::new(1, 1, Colorspace::Cmyk, vec![0, 0, 0, 0]).unwrap();
        assert!(matches!(
            pixmap.into_image(),
            Err(ExtractError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_encode_jpeg_rgb() {
        let pixmap = Pixmap::new(16, 8, Colorspace::Rgb, vec![120; 16 * 8 * 3]).unwrap();
        let data = encode_jpeg(&pixmap.into_image().unwrap(), 85).unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_encode_jpeg_keeps_gray() {
        let pixmap = Pixmap::new(8, 8, Colorspace::Gray, vec![64; 64]).unwrap();
        let data = encode_jpeg(&pixmap.into_image().unwrap(), 85).unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.color(), ColorType::L8);
    }

    #[test]
    fn test_encode_png_roundtrips_pixels() {
        let samples: Vec<u8> = (0..12).collect();
        let pixmap = Pixmap::new(2, 2, Colorspace::Rgb, samples.clone()).unwrap();
        let data = encode_png(&pixmap.into_image().unwrap()).unwrap();

        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.to_rgb8().into_raw(), samples);
    }

    #[test]
    fn test_downscale() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1201, 800));
        let scaled = downscale(image, 1200);
        assert_eq!((scaled.width(), scaled.height()), (1200, 799));

        let image = DynamicImage::ImageRgb8(RgbImage::new(1200, 800));
        let untouched = downscale(image, 1200);
        assert_eq!((untouched.width(), untouched.height()), (1200, 800));
    }
}
