//! Parameter types for engine and encoder operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`pipeline`](super::pipeline) (which decides what
//! the conversion needs) and the [`engine`](super::engine) /
//! [`encode`](super::encode) collaborators (which do the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1-100, default 90). Clamped on construction.
//! - [`ResampleFilter`]: Interpolation used by the engine when dimensions change.
//! - [`OutputFormat`]: One of the encodable output formats.
//! - [`FormatSet`]: The configuration-time set of formats a converter accepts.
//! - [`EngineLimits`]: Per-side pixel limit the engine enforces.

use image::ImageFormat;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Resampling algorithm passed to the engine's resize operation.
///
/// The conversion pipeline always uses the configured filter, which defaults
/// to [`ResampleFilter::Lanczos3`]; it is never chosen per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResampleFilter {
    pub fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Triangle => "triangle",
            Self::CatmullRom => "catmull-rom",
            Self::Gaussian => "gaussian",
            Self::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Output formats the host encoder can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Png, Self::Jpeg, Self::Webp, Self::Tiff];

    /// Format identifier, also used as the download file extension.
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
            Self::Tiff => ImageFormat::Tiff,
        }
    }

    /// Whether an encoder for this format is compiled into the `image` crate.
    pub fn host_supported(self) -> bool {
        self.image_format().writing_enabled()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown output format: {0:?}")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "tiff" | "tif" => Ok(Self::Tiff),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Formats a converter accepts, fixed at configuration time.
///
/// Order is preserved from configuration so listings match what the user
/// wrote. Duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSet(Vec<OutputFormat>);

impl FormatSet {
    pub fn new(formats: impl IntoIterator<Item = OutputFormat>) -> Self {
        let mut out = Vec::new();
        for format in formats {
            if !out.contains(&format) {
                out.push(format);
            }
        }
        Self(out)
    }

    pub fn contains(&self, format: OutputFormat) -> bool {
        self.0.contains(&format)
    }

    pub fn iter(&self) -> impl Iterator<Item = OutputFormat> + '_ {
        self.0.iter().copied()
    }
}

impl Default for FormatSet {
    fn default() -> Self {
        Self::new([OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::Webp])
    }
}

/// Limits the engine enforces on surfaces it opens or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    /// Maximum width or height in pixels.
    pub max_dimension: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_dimension: 16_384,
        }
    }
}
