//! Raster surface adapter.
//!
//! A [`Surface`] is the pixel format exchanged with the engine: tightly
//! packed RGBA8, row-major, `width * height * 4` bytes. The adapter moves a
//! decoded [`SourceImage`] into the engine and pulls the engine's result back
//! out as a surface ready for the host encoder.

use super::engine::{Dimensions, EngineError};
use super::handle::EngineHandle;
use super::loader::ReadyEngine;
use crate::types::SourceImage;
use image::{DynamicImage, RgbaImage};

/// RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Surface {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Wrap a pixel buffer, checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, EngineError> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(EngineError::InvalidSurface(format!(
                "{width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert any decoded image to RGBA8.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self::from_rgba(rgba)
    }

    pub fn from_rgba(rgba: RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }

    /// `None` when the buffer length does not match the dimensions.
    pub fn into_rgba(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Open the source bitmap in the engine.
pub fn to_engine_surface<'e>(
    engine: &'e ReadyEngine,
    source: &SourceImage,
) -> Result<EngineHandle<'e>, EngineError> {
    let surface = Surface::from_image(source.image());
    EngineHandle::open(engine, &surface)
}

/// Export the handle's pixels, sized to its current dimensions.
pub fn from_engine_surface(handle: &EngineHandle<'_>) -> Result<Surface, EngineError> {
    let expected = handle.dimensions()?;
    let surface = handle.export()?;
    let actual = surface.dimensions();
    if actual != expected {
        return Err(EngineError::SurfaceMismatch { expected, actual });
    }
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeEngine, ready_engine, sample_source};
    use std::sync::Arc;

    #[test]
    fn surface_rejects_wrong_buffer_length() {
        assert!(Surface::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Surface::new(2, 2, vec![0; 15]),
            Err(EngineError::InvalidSurface(_))
        ));
    }

    #[test]
    fn surface_from_rgb_image_expands_to_rgba() {
        let rgb = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let surface = Surface::from_image(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(surface.dimensions(), Dimensions::new(3, 2));
        assert_eq!(surface.data.len(), 3 * 2 * 4);
        assert_eq!(&surface.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn round_trip_through_fake_engine_keeps_dimensions() {
        let fake = Arc::new(FakeEngine::new());
        let engine = ready_engine(fake.clone());
        let source = sample_source(40, 30);

        let handle = to_engine_surface(&engine, &source).unwrap();
        let surface = from_engine_surface(&handle).unwrap();
        assert_eq!(surface.dimensions(), Dimensions::new(40, 30));
        drop(handle);

        assert_eq!(fake.open_count(), 1);
        assert_eq!(fake.release_count(), 1);
        assert_eq!(fake.live_handles(), 0);
    }

    #[test]
    fn mismatched_export_is_an_error() {
        let fake = Arc::new(FakeEngine::new().with_export_override(Dimensions::new(1, 1)));
        let engine = ready_engine(fake.clone());
        let source = sample_source(4, 4);

        let handle = to_engine_surface(&engine, &source).unwrap();
        let err = from_engine_surface(&handle).unwrap_err();
        assert!(matches!(err, EngineError::SurfaceMismatch { .. }));
    }
}
