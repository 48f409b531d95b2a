//! In-process image engine backed by the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Open | `image::RgbaImage::from_raw` |
//! | Resize | `image::imageops::resize` with the requested filter |
//! | Export | clone of the stored RGBA buffer |
//!
//! Images live in a handle table behind a `Mutex`, keyed by a monotonically
//! increasing id. Ids are never reused, so a stale [`RawHandle`] can only
//! ever miss. Pixel work runs on a shared snapshot with the table unlocked.

use super::engine::{Dimensions, EngineError, ImageEngine, RawHandle};
use super::params::{EngineLimits, ResampleFilter};
use super::surface::Surface;
use image::RgbaImage;
use image::imageops;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

pub struct RasterEngine {
    limits: EngineLimits,
    next_id: AtomicU64,
    images: Mutex<HashMap<RawHandle, Arc<RgbaImage>>>,
}

impl RasterEngine {
    pub fn new(limits: EngineLimits) -> Self {
        Self {
            limits,
            next_id: AtomicU64::new(1),
            images: Mutex::new(HashMap::new()),
        }
    }

    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    /// Number of handles currently open.
    pub fn live_handles(&self) -> usize {
        self.images.lock().map(|images| images.len()).unwrap_or(0)
    }

    fn check_limits(&self, width: u32, height: u32) -> Result<(), EngineError> {
        let max = self.limits.max_dimension;
        if width > max || height > max {
            return Err(EngineError::TooLarge { width, height, max });
        }
        Ok(())
    }

    fn insert(&self, image: RgbaImage) -> Result<RawHandle, EngineError> {
        let handle = RawHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.images
            .lock()
            .map_err(|_| EngineError::Poisoned)?
            .insert(handle, Arc::new(image));
        Ok(handle)
    }

    /// Shared view of a handle's pixels. The table lock is held only for the
    /// lookup.
    fn snapshot(&self, handle: RawHandle) -> Result<Arc<RgbaImage>, EngineError> {
        let images = self.images.lock().map_err(|_| EngineError::Poisoned)?;
        images
            .get(&handle)
            .cloned()
            .ok_or(EngineError::UnknownHandle(handle))
    }
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self::new(EngineLimits::default())
    }
}

impl ImageEngine for RasterEngine {
    fn name(&self) -> &str {
        "raster"
    }

    fn open(&self, surface: &Surface) -> Result<RawHandle, EngineError> {
        if surface.dimensions().is_empty() {
            return Err(EngineError::InvalidSurface(format!(
                "cannot open an empty {} surface",
                surface.dimensions()
            )));
        }
        self.check_limits(surface.width, surface.height)?;
        let image = surface.clone().into_rgba().ok_or_else(|| {
            EngineError::InvalidSurface(format!(
                "buffer of {} bytes does not match {}",
                surface.data.len(),
                surface.dimensions()
            ))
        })?;
        let handle = self.insert(image)?;
        debug!(%handle, dims = %surface.dimensions(), "opened image");
        Ok(handle)
    }

    fn dimensions(&self, handle: RawHandle) -> Result<Dimensions, EngineError> {
        let images = self.images.lock().map_err(|_| EngineError::Poisoned)?;
        let image = images
            .get(&handle)
            .ok_or(EngineError::UnknownHandle(handle))?;
        let (width, height) = image.dimensions();
        Ok(Dimensions::new(width, height))
    }

    fn resize(
        &self,
        handle: RawHandle,
        width: u32,
        height: u32,
        filter: ResampleFilter,
    ) -> Result<RawHandle, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::ZeroDimensions { width, height });
        }
        self.check_limits(width, height)?;

        // The source stays in the table until the resample succeeds.
        let source = self.snapshot(handle)?;
        let resized = imageops::resize(source.as_ref(), width, height, filter.into());
        drop(source);

        let next = RawHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut images = self.images.lock().map_err(|_| EngineError::Poisoned)?;
        if images.remove(&handle).is_none() {
            return Err(EngineError::UnknownHandle(handle));
        }
        images.insert(next, Arc::new(resized));
        debug!(from = %handle, to = %next, width, height, %filter, "resized image");
        Ok(next)
    }

    fn export(&self, handle: RawHandle) -> Result<Surface, EngineError> {
        let image = self.snapshot(handle)?;
        Ok(Surface::from_rgba(RgbaImage::clone(&image)))
    }

    fn release(&self, handle: RawHandle) {
        match self.images.lock() {
            Ok(mut images) => {
                if images.remove(&handle).is_none() {
                    warn!(%handle, "release of unknown engine handle");
                }
            }
            Err(_) => warn!(%handle, "engine state poisoned, handle not released"),
        }
    }
}
