//! Shared test utilities for the rasterconv test suite.
//!
//! - [`FakeEngine`] records every engine call and can fail on demand.
//! - [`StaticLoader`], [`FailingLoader`], [`GatedLoader`] drive the provider
//!   into each [`EngineState`](crate::imaging::EngineState).
//! - [`FailingEncoder`], [`BlockingEncoder`] cover encoder error and
//!   re-entrancy paths.
//! - [`sample_png`], [`sample_source`] build synthetic input images.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use image::ImageEncoder;
use image::error::{EncodingError, ImageFormatHint};

use crate::imaging::{
    Dimensions, EncodeError, EngineError, EngineLoadError, EngineLoader, EngineProvider,
    HostEncoder, ImageEngine, OutputFormat, RawHandle, ReadyEngine, ResampleFilter, Surface,
    SurfaceEncoder,
};
use crate::sink::NullSink;
use crate::types::SourceImage;

// =========================================================================
// Fixtures
// =========================================================================

/// Encode a gradient RGB PNG of the given size.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

pub fn sample_source(width: u32, height: u32) -> SourceImage {
    SourceImage::decode(sample_png(width, height)).unwrap()
}

// =========================================================================
// Fake engine
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
    Open {
        width: u32,
        height: u32,
    },
    Resize {
        width: u32,
        height: u32,
        filter: ResampleFilter,
    },
    Export,
    Release(RawHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Open,
    Resize,
    Export,
}

/// Engine that tracks handles and records operations without touching pixels.
/// Exports are zero-filled surfaces of the handle's dimensions.
#[derive(Default)]
pub struct FakeEngine {
    fail_at: Option<FailPoint>,
    open_override: Option<Dimensions>,
    export_override: Option<Dimensions>,
    next_id: AtomicU64,
    live: Mutex<HashMap<RawHandle, Dimensions>>,
    operations: Mutex<Vec<EngineOp>>,
    double_releases: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    /// Record opened handles as `dims` regardless of the surface's size.
    pub fn with_open_override(mut self, dims: Dimensions) -> Self {
        self.open_override = Some(dims);
        self
    }

    /// Export surfaces of `dims` regardless of the handle's size.
    pub fn with_export_override(mut self, dims: Dimensions) -> Self {
        self.export_override = Some(dims);
        self
    }

    pub fn operations(&self) -> Vec<EngineOp> {
        self.operations.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.count(|op| matches!(op, EngineOp::Open { .. }))
    }

    pub fn resize_count(&self) -> usize {
        self.count(|op| matches!(op, EngineOp::Resize { .. }))
    }

    pub fn release_count(&self) -> usize {
        self.count(|op| matches!(op, EngineOp::Release(_)))
    }

    pub fn live_handles(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn double_releases(&self) -> usize {
        self.double_releases.load(Ordering::SeqCst)
    }

    fn count(&self, pred: impl Fn(&EngineOp) -> bool) -> usize {
        self.operations.lock().unwrap().iter().filter(|op| pred(op)).count()
    }

    fn record(&self, op: EngineOp) {
        self.operations.lock().unwrap().push(op);
    }

    fn injected(&self, point: FailPoint) -> Result<(), EngineError> {
        if self.fail_at == Some(point) {
            return Err(EngineError::Failed(format!("injected {point:?} failure")));
        }
        Ok(())
    }

    fn allocate(&self, dims: Dimensions) -> RawHandle {
        let handle = RawHandle(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.live.lock().unwrap().insert(handle, dims);
        handle
    }
}

impl ImageEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn open(&self, surface: &Surface) -> Result<RawHandle, EngineError> {
        self.record(EngineOp::Open {
            width: surface.width,
            height: surface.height,
        });
        self.injected(FailPoint::Open)?;
        Ok(self.allocate(self.open_override.unwrap_or(surface.dimensions())))
    }

    fn dimensions(&self, handle: RawHandle) -> Result<Dimensions, EngineError> {
        self.live
            .lock()
            .unwrap()
            .get(&handle)
            .copied()
            .ok_or(EngineError::UnknownHandle(handle))
    }

    fn resize(
        &self,
        handle: RawHandle,
        width: u32,
        height: u32,
        filter: ResampleFilter,
    ) -> Result<RawHandle, EngineError> {
        self.record(EngineOp::Resize {
            width,
            height,
            filter,
        });
        self.injected(FailPoint::Resize)?;
        if self.live.lock().unwrap().remove(&handle).is_none() {
            return Err(EngineError::UnknownHandle(handle));
        }
        Ok(self.allocate(Dimensions::new(width, height)))
    }

    fn export(&self, handle: RawHandle) -> Result<Surface, EngineError> {
        self.record(EngineOp::Export);
        self.injected(FailPoint::Export)?;
        let dims = match self.export_override {
            Some(dims) => dims,
            None => self.dimensions(handle)?,
        };
        Surface::new(
            dims.width,
            dims.height,
            vec![0; dims.width as usize * dims.height as usize * 4],
        )
    }

    fn release(&self, handle: RawHandle) {
        self.record(EngineOp::Release(handle));
        if self.live.lock().unwrap().remove(&handle).is_none() {
            self.double_releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// =========================================================================
// Loaders and providers
// =========================================================================

/// Hands out a fixed engine. `checked` loaders run the engine self-test.
pub struct StaticLoader {
    engine: Arc<dyn ImageEngine>,
    checked: bool,
}

impl StaticLoader {
    pub fn new(engine: Arc<dyn ImageEngine>) -> Self {
        Self {
            engine,
            checked: false,
        }
    }

    pub fn checked(engine: Arc<dyn ImageEngine>) -> Self {
        Self {
            engine,
            checked: true,
        }
    }
}

impl EngineLoader for StaticLoader {
    fn name(&self) -> &str {
        "static"
    }

    fn initialize(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        if self.checked {
            crate::imaging::loader::self_test(self.engine.as_ref())?;
        }
        Ok(self.engine.clone())
    }
}

pub struct FailingLoader;

impl EngineLoader for FailingLoader {
    fn name(&self) -> &str {
        "failing"
    }

    fn initialize(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        Err(EngineLoadError::Bootstrap(
            "engine module could not be fetched".into(),
        ))
    }
}

/// Loader whose bootstrap panics instead of returning an error.
pub struct PanickingLoader;

impl EngineLoader for PanickingLoader {
    fn name(&self) -> &str {
        "panicking"
    }

    fn initialize(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        panic!("native engine aborted during bootstrap")
    }
}

/// A provider already in state Ready, serving `engine`.
pub fn ready_provider(engine: Arc<dyn ImageEngine>) -> Arc<EngineProvider> {
    let provider = Arc::new(EngineProvider::new());
    provider
        .initialize(&StaticLoader::new(engine), &NullSink)
        .unwrap();
    provider
}

pub fn ready_engine(engine: Arc<dyn ImageEngine>) -> ReadyEngine {
    ready_provider(engine).ready().unwrap()
}

// =========================================================================
// Gates for blocking collaborators
// =========================================================================

#[derive(Default)]
struct GateFlags {
    started: bool,
    open: bool,
}

/// Holds a collaborator inside its call until the test opens the gate.
/// Once open it stays open.
#[derive(Clone, Default)]
pub struct Gate(Arc<(Mutex<GateFlags>, Condvar)>);

impl Gate {
    pub fn wait_until_started(&self) {
        let (flags, cv) = &*self.0;
        let mut flags = flags.lock().unwrap();
        while !flags.started {
            flags = cv.wait(flags).unwrap();
        }
    }

    pub fn open(&self) {
        let (flags, cv) = &*self.0;
        flags.lock().unwrap().open = true;
        cv.notify_all();
    }

    fn pass(&self) {
        let (flags, cv) = &*self.0;
        let mut flags = flags.lock().unwrap();
        flags.started = true;
        cv.notify_all();
        while !flags.open {
            flags = cv.wait(flags).unwrap();
        }
    }
}

/// Loader that stays in `initialize` until its gate opens.
pub struct GatedLoader {
    engine: Arc<dyn ImageEngine>,
    gate: Gate,
}

impl GatedLoader {
    pub fn new(engine: Arc<dyn ImageEngine>) -> (Self, Gate) {
        let gate = Gate::default();
        (
            Self {
                engine,
                gate: gate.clone(),
            },
            gate,
        )
    }
}

impl EngineLoader for GatedLoader {
    fn name(&self) -> &str {
        "gated"
    }

    fn initialize(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        self.gate.pass();
        Ok(self.engine.clone())
    }
}

// =========================================================================
// Encoders
// =========================================================================

pub struct FailingEncoder;

impl SurfaceEncoder for FailingEncoder {
    fn encode(&self, _surface: Surface, _format: OutputFormat) -> Result<Vec<u8>, EncodeError> {
        Err(EncodeError::Codec(image::ImageError::Encoding(
            EncodingError::new(ImageFormatHint::Unknown, "injected encoder failure"),
        )))
    }
}

/// Host encoder that waits on a gate before encoding.
pub struct BlockingEncoder {
    gate: Gate,
    inner: HostEncoder,
}

impl BlockingEncoder {
    pub fn new() -> (Self, Gate) {
        let gate = Gate::default();
        (
            Self {
                gate: gate.clone(),
                inner: HostEncoder::default(),
            },
            gate,
        )
    }
}

impl SurfaceEncoder for BlockingEncoder {
    fn encode(&self, surface: Surface, format: OutputFormat) -> Result<Vec<u8>, EncodeError> {
        self.gate.pass();
        self.inner.encode(surface, format)
    }
}
