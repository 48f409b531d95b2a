//! Host encoder: serializes an exported surface into the requested format.
//!
//! | Format | Encoder | Pixel layout written |
//! |---|---|---|
//! | PNG | `image::codecs::png::PngEncoder` | RGBA8 |
//! | JPEG | `image::codecs::jpeg::JpegEncoder` (configured quality) | RGB8, alpha dropped |
//! | WebP | `image::codecs::webp::WebPEncoder` (lossless) | RGBA8 |
//! | TIFF | `image::codecs::tiff::TiffEncoder` | RGBA8 |

use super::params::{OutputFormat, Quality};
use super::surface::Surface;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("output format {0} is not enabled")]
    UnsupportedFormat(OutputFormat),
    #[error("surface buffer does not match {width}x{height}")]
    Buffer { width: u32, height: u32 },
    #[error(transparent)]
    Codec(#[from] image::ImageError),
}

/// Turns pixels into an encoded artifact.
pub trait SurfaceEncoder: Send + Sync {
    fn encode(&self, surface: Surface, format: OutputFormat) -> Result<Vec<u8>, EncodeError>;
}

/// Encoder backed by the `image` crate's codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEncoder {
    quality: Quality,
}

impl HostEncoder {
    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }
}

impl SurfaceEncoder for HostEncoder {
    fn encode(&self, surface: Surface, format: OutputFormat) -> Result<Vec<u8>, EncodeError> {
        if !format.host_supported() {
            return Err(EncodeError::UnsupportedFormat(format));
        }
        let (width, height) = (surface.width, surface.height);
        let rgba = surface
            .into_rgba()
            .ok_or(EncodeError::Buffer { width, height })?;

        let mut out = Cursor::new(Vec::new());
        match format {
            OutputFormat::Png => {
                PngEncoder::new(&mut out).write_image(
                    rgba.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                )?;
            }
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
                let quality = self.quality.value() as u8;
                JpegEncoder::new_with_quality(&mut out, quality).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )?;
            }
            OutputFormat::Webp => {
                WebPEncoder::new_lossless(&mut out).write_image(
                    rgba.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                )?;
            }
            OutputFormat::Tiff => {
                TiffEncoder::new(&mut out).write_image(
                    rgba.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                )?;
            }
        }
        Ok(out.into_inner())
    }
}
