//! Image conversion: decode, optionally resample, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **Open / export** | [`RasterEngine`] handle table over `image::RgbaImage` |
//! | **Resize** | `image::imageops::resize`, Lanczos3 by default |
//! | **Encode** | `image` PNG / JPEG / WebP / TIFF encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure resize planning (unit testable)
//! - **Parameters**: Formats, filters, quality, engine limits
//! - **Engine**: [`ImageEngine`] trait + [`RasterEngine`]
//! - **Loader**: [`EngineLoader`] strategies + [`EngineProvider`] state
//! - **Handle / Surface**: scoped handle ownership and the pixel adapter
//! - **Encode**: [`SurfaceEncoder`] trait + [`HostEncoder`]
//! - **Pipeline**: [`Converter`], which strings all of the above together

mod calculations;
pub mod encode;
pub mod engine;
pub mod handle;
pub mod loader;
mod params;
pub mod pipeline;
pub mod raster_engine;
pub mod surface;

pub use calculations::{RequestedSize, ResizePlan, parse_dimension, plan_resize};
pub use encode::{EncodeError, HostEncoder, SurfaceEncoder};
pub use engine::{Dimensions, EngineError, ImageEngine, RawHandle};
pub use handle::EngineHandle;
pub use loader::{
    EngineLoadError, EngineLoader, EngineProvider, EngineState, InstanceLoader, ReadyEngine,
    SharedLoader,
};
pub use params::{
    EngineLimits, FormatSet, OutputFormat, Quality, ResampleFilter, UnknownFormat,
};
pub use pipeline::{ConversionError, Converter, Stage};
pub use raster_engine::RasterEngine;
pub use surface::{Surface, from_engine_surface, to_engine_surface};
