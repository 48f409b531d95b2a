//! The conversion pipeline.
//!
//! [`Converter::convert`] runs one conversion end to end:
//!
//! ```text
//! precondition → open → plan → resize? → export → encode → release
//! ```
//!
//! The engine handle created at `open` is owned by an
//! [`EngineHandle`](super::handle::EngineHandle) for the rest of the run, so
//! it is released exactly once whichever step fails. Release of the final
//! handle happens after encoding, whether encoding succeeded or not.
//!
//! Conversions are serialized by a single in-flight slot: a call made while
//! another is running fails with [`ConversionError::Busy`] and never touches
//! the engine.

use super::calculations::plan_resize;
use super::encode::{EncodeError, HostEncoder, SurfaceEncoder};
use super::engine::EngineError;
use super::loader::{EngineProvider, EngineState, ReadyEngine};
use super::params::{FormatSet, OutputFormat, ResampleFilter};
use super::surface::{from_engine_surface, to_engine_surface};
use crate::sink::LogSink;
use crate::types::{ConversionRequest, ConversionResult, SourceImage};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Pipeline step, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Precondition,
    Open,
    Resize,
    Export,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Precondition => "precondition",
            Self::Open => "open",
            Self::Resize => "resize",
            Self::Export => "export",
            Self::Encode => "encode",
        })
    }
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("image engine is not ready (state: {0})")]
    NotReady(EngineState),
    #[error("no image selected")]
    NoImage,
    #[error("another conversion is already running")]
    Busy,
    #[error("engine {stage} failed: {source}")]
    Engine {
        stage: Stage,
        #[source]
        source: EngineError,
    },
    #[error("encoding to {format} failed: {source}")]
    Encode {
        format: OutputFormat,
        #[source]
        source: EncodeError,
    },
}

impl ConversionError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::NotReady(_) | Self::NoImage | Self::Busy => Stage::Precondition,
            Self::Engine { stage, .. } => *stage,
            Self::Encode { .. } => Stage::Encode,
        }
    }

    fn engine(stage: Stage) -> impl FnOnce(EngineError) -> Self {
        move |source| Self::Engine { stage, source }
    }
}

/// Holds the in-flight slot for the duration of one conversion.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs conversions against the engine owned by an [`EngineProvider`].
pub struct Converter<E = HostEncoder> {
    provider: Arc<EngineProvider>,
    encoder: E,
    formats: FormatSet,
    filter: ResampleFilter,
    sink: Arc<dyn LogSink>,
    in_flight: AtomicBool,
}

impl Converter<HostEncoder> {
    pub fn new(provider: Arc<EngineProvider>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            provider,
            encoder: HostEncoder::default(),
            formats: FormatSet::default(),
            filter: ResampleFilter::default(),
            sink,
            in_flight: AtomicBool::new(false),
        }
    }
}

impl<E: SurfaceEncoder> Converter<E> {
    pub fn with_encoder<F: SurfaceEncoder>(self, encoder: F) -> Converter<F> {
        Converter {
            provider: self.provider,
            encoder,
            formats: self.formats,
            filter: self.filter,
            sink: self.sink,
            in_flight: self.in_flight,
        }
    }

    pub fn with_formats(mut self, formats: FormatSet) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn provider(&self) -> &EngineProvider {
        &self.provider
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    /// Convert `source` as described by `request`.
    ///
    /// `source` is `None` when no file has been selected.
    pub fn convert(
        &self,
        source: Option<&SourceImage>,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        let sink = self.sink.as_ref();

        let Some(_slot) = InFlight::acquire(&self.in_flight) else {
            sink.line("Convert ignored: a conversion is already running.");
            return Err(ConversionError::Busy);
        };

        sink.line("Convert requested.");
        let result = self
            .check_preconditions(source, request)
            .and_then(|(engine, source)| {
                run_pipeline(&engine, &self.encoder, source, request, self.filter, sink)
            });

        if let Err(err) = &result {
            warn!(stage = %err.stage(), error = %err, "conversion failed");
            sink.line(&format!("An error occurred during conversion ({}):", err.stage()));
            sink.line(&err.to_string());
        }
        result
    }

    fn check_preconditions<'s>(
        &self,
        source: Option<&'s SourceImage>,
        request: &ConversionRequest,
    ) -> Result<(ReadyEngine, &'s SourceImage), ConversionError> {
        let engine = self.provider.ready().map_err(ConversionError::NotReady)?;

        let source = match source {
            Some(source) if !source.dimensions().is_empty() => source,
            _ => {
                self.sink.prompt("Please select an image first.");
                return Err(ConversionError::NoImage);
            }
        };

        if !self.formats.contains(request.format) {
            return Err(ConversionError::Encode {
                format: request.format,
                source: EncodeError::UnsupportedFormat(request.format),
            });
        }

        Ok((engine, source))
    }
}

/// Open, resize, export and encode against a ready engine. Every early return drops the live
/// handle, which releases it.
fn run_pipeline<E: SurfaceEncoder + ?Sized>(
    engine: &ReadyEngine,
    encoder: &E,
    source: &SourceImage,
    request: &ConversionRequest,
    filter: ResampleFilter,
    sink: &dyn LogSink,
) -> Result<ConversionResult, ConversionError> {
    sink.line("Starting conversion process...");

    let mut handle =
        to_engine_surface(engine, source).map_err(ConversionError::engine(Stage::Open))?;
    let opened = handle
        .dimensions()
        .map_err(ConversionError::engine(Stage::Open))?;
    sink.line(&format!(
        "Image opened in {} engine ({}).",
        engine.engine().name(),
        opened
    ));

    let plan = plan_resize(opened, request.size(), filter);
    if plan.needed {
        sink.line(&format!(
            "Resizing from {} to {} ({})...",
            opened,
            plan.target,
            plan.filter
        ));
        handle
            .resize(plan.target.width, plan.target.height, plan.filter)
            .map_err(ConversionError::engine(Stage::Resize))?;
        sink.line("Resize complete.");
    } else {
        sink.line("No resizing needed.");
    }

    let surface = from_engine_surface(&handle).map_err(ConversionError::engine(Stage::Export))?;
    sink.line(&format!(
        "Exported {} surface from engine.",
        surface.dimensions()
    ));
    let dimensions = surface.dimensions();

    sink.line(&format!("Encoding image to {}...", request.format));
    let encoded = encoder.encode(surface, request.format);

    handle.release();
    sink.line("Released engine image.");

    let bytes = encoded.map_err(|source| ConversionError::Encode {
        format: request.format,
        source,
    })?;
    sink.line(&format!("Encoding complete ({} bytes).", bytes.len()));
    debug!(format = %request.format, %dimensions, bytes = bytes.len(), "conversion finished");

    Ok(ConversionResult::new(bytes, request.format, dimensions))
}
