//! Scoped ownership of engine handles.
//!
//! [`EngineHandle`] is the only way the pipeline touches a [`RawHandle`].
//! It borrows the engine, so it cannot outlive the conversion that created
//! it, and it releases its raw handle exactly once: either when dropped on
//! any exit path, or through the consuming [`EngineHandle::release`].
//!
//! Resizing mutates the wrapper in place. The engine supersedes the old raw
//! handle and the wrapper takes the new one, so at no point is there both a
//! live and a freed reference to the same image.

use super::engine::{Dimensions, EngineError, ImageEngine, RawHandle};
use super::loader::ReadyEngine;
use super::params::ResampleFilter;
use super::surface::Surface;
use tracing::trace;

pub struct EngineHandle<'e> {
    engine: &'e dyn ImageEngine,
    raw: RawHandle,
}

impl<'e> EngineHandle<'e> {
    /// Open `surface` in the engine and take ownership of the new handle.
    pub fn open(engine: &'e ReadyEngine, surface: &Surface) -> Result<Self, EngineError> {
        let engine = engine.engine();
        let raw = engine.open(surface)?;
        trace!(handle = %raw, engine = engine.name(), "acquired engine handle");
        Ok(Self { engine, raw })
    }

    pub fn dimensions(&self) -> Result<Dimensions, EngineError> {
        self.engine.dimensions(self.raw)
    }

    /// Resample in place. On failure the current handle is kept as is.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        filter: ResampleFilter,
    ) -> Result<(), EngineError> {
        let next = self.engine.resize(self.raw, width, height, filter)?;
        trace!(from = %self.raw, to = %next, "engine handle superseded by resize");
        self.raw = next;
        Ok(())
    }

    pub fn export(&self) -> Result<Surface, EngineError> {
        self.engine.export(self.raw)
    }

    /// Release now instead of at end of scope.
    pub fn release(self) {}
}

impl Drop for EngineHandle<'_> {
    fn drop(&mut self) {
        self.engine.release(self.raw);
        trace!(handle = %self.raw, "released engine handle");
    }
}

impl std::fmt::Debug for EngineHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine.name())
            .field("raw", &self.raw)
            .finish()
    }
}
