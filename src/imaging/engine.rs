//! Image engine trait and shared types.
//!
//! The [`ImageEngine`] trait is the boundary to the component that owns
//! in-progress images. Images live inside the engine and are addressed by
//! opaque [`RawHandle`]s; the host only ever sees pixels at the edges
//! (`open` takes a [`Surface`], `export` returns one).
//!
//! The production implementation is
//! [`RasterEngine`](super::raster_engine::RasterEngine). Callers never hold a
//! `RawHandle` directly: the pipeline wraps each one in an
//! [`EngineHandle`](super::handle::EngineHandle), which releases it exactly
//! once.

use super::params::ResampleFilter;
use super::surface::Surface;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown or released handle {0}")]
    UnknownHandle(RawHandle),
    #[error("invalid surface: {0}")]
    InvalidSurface(String),
    #[error("{width}x{height} exceeds the engine limit of {max} pixels per side")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("cannot resize to {width}x{height}: dimensions must be non-zero")]
    ZeroDimensions { width: u32, height: u32 },
    #[error("exported surface is {actual} but the handle is {expected}")]
    SurfaceMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },
    #[error("engine state poisoned")]
    Poisoned,
    #[error("engine operation failed: {0}")]
    Failed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Opaque engine-side identifier for one in-progress image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operations every image engine must support.
///
/// Handle ownership rules:
/// - `open` and a successful `resize` each produce one live handle.
/// - A successful `resize` consumes its input handle; the engine frees it.
///   A failed `resize` leaves the input handle live and untouched.
/// - `release` frees a live handle. Releasing anything else is a caller bug.
pub trait ImageEngine: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    /// Copy a host surface into the engine.
    fn open(&self, surface: &Surface) -> Result<RawHandle, EngineError>;

    /// Current dimensions of a live handle.
    fn dimensions(&self, handle: RawHandle) -> Result<Dimensions, EngineError>;

    /// Resample to exactly `width`x`height`, superseding `handle`.
    fn resize(
        &self,
        handle: RawHandle,
        width: u32,
        height: u32,
        filter: ResampleFilter,
    ) -> Result<RawHandle, EngineError>;

    /// Copy the handle's pixels back out as a host surface.
    fn export(&self, handle: RawHandle) -> Result<Surface, EngineError>;

    fn release(&self, handle: RawHandle);
}
