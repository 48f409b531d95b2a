//! Engine bootstrap and readiness.
//!
//! An [`EngineLoader`] knows how to bring an engine up; an [`EngineProvider`]
//! runs exactly one load and owns the resulting [`EngineState`]. Conversions
//! ask the provider for a [`ReadyEngine`], which only exists once the load
//! succeeded.
//!
//! Two loader strategies are provided:
//!
//! - [`InstanceLoader`] builds a private engine instance per provider.
//! - [`SharedLoader`] hands out a process-wide engine, bootstrapped the first
//!   time any provider asks for it.
//!
//! Both verify the engine with a 1x1 open/export/release round trip before
//! reporting success.

use super::engine::{EngineError, ImageEngine};
use super::params::EngineLimits;
use super::raster_engine::RasterEngine;
use super::surface::Surface;
use crate::sink::LogSink;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineLoadError {
    #[error("engine bootstrap failed: {0}")]
    Bootstrap(String),
    #[error("engine self-test failed: {0}")]
    SelfTest(#[source] EngineError),
    #[error("engine initialization already attempted (state: {0})")]
    AlreadyAttempted(EngineState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        })
    }
}

/// A way of bringing an image engine up.
pub trait EngineLoader: Send + Sync {
    fn name(&self) -> &str;

    fn initialize(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError>;
}

/// Round-trip a single pixel through a fresh engine.
pub(crate) fn self_test(engine: &dyn ImageEngine) -> Result<(), EngineLoadError> {
    let probe = Surface::new(1, 1, vec![0, 0, 0, 255]).map_err(EngineLoadError::SelfTest)?;
    let handle = engine.open(&probe).map_err(EngineLoadError::SelfTest)?;
    let exported = engine.export(handle);
    engine.release(handle);
    let exported = exported.map_err(EngineLoadError::SelfTest)?;
    if exported != probe {
        return Err(EngineLoadError::SelfTest(EngineError::Failed(
            "probe pixel did not survive open/export".into(),
        )));
    }
    Ok(())
}

/// Builds a private [`RasterEngine`] for each initialization.
#[derive(Debug, Clone, Default)]
pub struct InstanceLoader {
    limits: EngineLimits,
}

impl InstanceLoader {
    pub fn new(limits: EngineLimits) -> Self {
        Self { limits }
    }
}

impl EngineLoader for InstanceLoader {
    fn name(&self) -> &str {
        "instance"
    }

    fn initialize(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        let engine = RasterEngine::new(self.limits);
        self_test(&engine)?;
        Ok(Arc::new(engine))
    }
}

static SHARED_ENGINE: OnceLock<Arc<RasterEngine>> = OnceLock::new();

/// Hands out the process-wide [`RasterEngine`].
///
/// The first initialization fixes the limits; later loaders with different
/// limits get the already-running engine.
#[derive(Debug, Clone, Default)]
pub struct SharedLoader {
    limits: EngineLimits,
}

impl SharedLoader {
    pub fn new(limits: EngineLimits) -> Self {
        Self { limits }
    }
}

impl EngineLoader for SharedLoader {
    fn name(&self) -> &str {
        "shared"
    }

    fn initialize(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        let engine = SHARED_ENGINE
            .get_or_init(|| Arc::new(RasterEngine::new(self.limits)))
            .clone();
        if engine.limits() != self.limits {
            info!(
                requested = self.limits.max_dimension,
                active = engine.limits().max_dimension,
                "shared engine already running with different limits"
            );
        }
        self_test(engine.as_ref())?;
        Ok(engine)
    }
}

/// Capability proving the engine finished loading.
#[derive(Clone)]
pub struct ReadyEngine {
    engine: Arc<dyn ImageEngine>,
}

impl ReadyEngine {
    pub fn engine(&self) -> &dyn ImageEngine {
        self.engine.as_ref()
    }
}

impl fmt::Debug for ReadyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadyEngine").field(&self.engine.name()).finish()
    }
}

enum Slot {
    Uninitialized,
    Loading,
    Ready(Arc<dyn ImageEngine>),
    Failed,
}

impl Slot {
    fn state(&self) -> EngineState {
        match self {
            Slot::Uninitialized => EngineState::Uninitialized,
            Slot::Loading => EngineState::Loading,
            Slot::Ready(_) => EngineState::Ready,
            Slot::Failed => EngineState::Failed,
        }
    }
}

/// Owns one engine load and its state.
///
/// State only moves forward: `Uninitialized → Loading → Ready | Failed`.
/// A failed load is final.
pub struct EngineProvider {
    slot: Mutex<Slot>,
}

impl EngineProvider {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Uninitialized),
        }
    }

    pub fn state(&self) -> EngineState {
        match self.slot.lock() {
            Ok(slot) => slot.state(),
            Err(_) => EngineState::Failed,
        }
    }

    /// The ready engine, or the state that prevents using it.
    pub fn ready(&self) -> Result<ReadyEngine, EngineState> {
        let slot = self.slot.lock().map_err(|_| EngineState::Failed)?;
        match &*slot {
            Slot::Ready(engine) => Ok(ReadyEngine {
                engine: engine.clone(),
            }),
            other => Err(other.state()),
        }
    }

    /// Run `loader` once, blocking until it finishes.
    pub fn initialize(
        &self,
        loader: &dyn EngineLoader,
        sink: &dyn LogSink,
    ) -> Result<ReadyEngine, EngineLoadError> {
        {
            let mut slot = self
                .slot
                .lock()
                .map_err(|_| EngineLoadError::AlreadyAttempted(EngineState::Failed))?;
            if !matches!(*slot, Slot::Uninitialized) {
                return Err(EngineLoadError::AlreadyAttempted(slot.state()));
            }
            *slot = Slot::Loading;
        }

        sink.line(&format!("Initializing {} image engine...", loader.name()));
        // A panicking loader still ends in Failed.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| loader.initialize()))
            .unwrap_or_else(|payload| {
                Err(EngineLoadError::Bootstrap(panic_message(payload.as_ref())))
            });

        let mut slot = self
            .slot
            .lock()
            .map_err(|_| EngineLoadError::AlreadyAttempted(EngineState::Failed))?;
        match outcome {
            Ok(engine) => {
                info!(loader = loader.name(), engine = engine.name(), "image engine ready");
                sink.line("Image engine loaded and ready.");
                *slot = Slot::Ready(engine.clone());
                Ok(ReadyEngine { engine })
            }
            Err(err) => {
                error!(loader = loader.name(), error = %err, "image engine failed to load");
                sink.line("Error loading image engine:");
                sink.line(&err.to_string());
                *slot = Slot::Failed;
                Err(err)
            }
        }
    }

    /// Run the load on a background thread. The state reads `Loading` until
    /// the thread finishes.
    pub fn spawn_initialize(
        self: &Arc<Self>,
        loader: Arc<dyn EngineLoader>,
        sink: Arc<dyn LogSink>,
    ) -> JoinHandle<Result<(), EngineLoadError>> {
        let provider = Arc::clone(self);
        std::thread::spawn(move || {
            provider
                .initialize(loader.as_ref(), sink.as_ref())
                .map(|_| ())
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".into());
    format!("loader panicked: {detail}")
}

impl Default for EngineProvider {
    fn default() -> Self {
        Self::new()
    }
}
