//! Extraction types
//!
//! Output units of the pipeline and the options that steer it.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// Longest edge, in pixels, of an image leaving the conversion path
pub const MAX_DIMENSION: u32 = 1200;

/// JPEG quality used when re-encoding
pub const JPEG_QUALITY: u8 = 85;

/// Encoded output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Which output policy the pipeline follows
///
/// The two policies produce different bytes for the same document and are
/// never combined within one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputPolicy {
    /// Pass stored JPEGs through untouched, re-encode everything else as
    /// downscaled JPEG.
    #[default]
    Jpeg,
    /// Decode every image and encode it as full-size PNG.
    Png,
}

impl OutputPolicy {
    /// Format of every image produced under this policy
    pub fn output_format(&self) -> ImageFormat {
        match self {
            OutputPolicy::Jpeg => ImageFormat::Jpeg,
            OutputPolicy::Png => ImageFormat::Png,
        }
    }
}

impl FromStr for OutputPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputPolicy::Jpeg),
            "png" => Ok(OutputPolicy::Png),
            other => Err(format!("unknown output policy '{}'", other)),
        }
    }
}

/// Options for one extraction call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub policy: OutputPolicy,
    /// Long-edge limit applied on the JPEG conversion path
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            policy: OutputPolicy::default(),
            max_dimension: MAX_DIMENSION,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl ExtractOptions {
    pub fn with_policy(policy: OutputPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

/// One image pulled out of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// `pagina_{page:03}_img_{index:02}.{ext}`, unique within one call
    pub name: String,
    /// 1-based page number
    pub page: u32,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

impl ExtractedImage {
    pub fn new(page: u32, index: u32, format: ImageFormat, data: Vec<u8>) -> Self {
        Self {
            name: image_name(page, index, format),
            page,
            format,
            data,
        }
    }

    pub fn mime(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// `data:image/<subtype>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime(), BASE64.encode(&self.data))
    }
}

/// Build the output name for an image (both numbers 1-based)
pub fn image_name(page: u32, index: u32, format: ImageFormat) -> String {
    format!("pagina_{:03}_img_{:02}.{}", page, index, format.extension())
}

/// An image that was dropped from the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    /// 1-based page number
    pub page: u32,
    /// 1-based position on the page
    pub index: u32,
    pub reason: String,
}

/// Images produced by a scan plus the ones that were skipped
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub images: Vec<ExtractedImage>,
    pub skipped: Vec<SkippedImage>,
}
