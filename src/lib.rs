//! # rasterconv
//!
//! Convert raster images between formats, optionally resizing them on the
//! way, through an image engine that is loaded once and then reused.
//!
//! # Architecture: One Conversion, Six Steps
//!
//! ```text
//! select   file      →  SourceImage       (read fully, decode once)
//! open     surface   →  EngineHandle      (engine-owned pixel buffer)
//! resize   handle    →  handle            (only when the target differs)
//! export   handle    →  Surface           (RGBA8 copy back out)
//! encode   surface   →  ConversionResult  (PNG / JPEG / WebP / TIFF)
//! release  handle                          (always, on every path)
//! ```
//!
//! The engine is brought up by an [`EngineLoader`](imaging::EngineLoader)
//! exactly once; [`EngineProvider`](imaging::EngineProvider) tracks whether
//! that succeeded and gates every conversion on it. Engine-side buffers are
//! wrapped in [`EngineHandle`](imaging::EngineHandle), which releases on drop,
//! so an error at any step cannot leak them.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Engine trait and loader, handles, resize planning, encoders, the conversion pipeline |
//! | [`session`] | Select / convert / preview loop around a converter |
//! | [`types`] | `SourceImage`, `ConversionRequest`, `ConversionResult` |
//! | [`sink`] | Line-oriented log sinks for conversion checkpoints |
//! | [`config`] | `rasterconv.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Conversion at a Time
//!
//! A [`Converter`](imaging::Converter) runs a single conversion at once. A
//! second call while one is in flight returns
//! [`ConversionError::Busy`](imaging::ConversionError::Busy) instead of
//! queueing, so results can never arrive out of order.
//!
//! ## Exact Resize
//!
//! Width and height are applied as given. Aspect ratio is not preserved; a
//! missing side falls back to the source's value.

pub mod config;
pub mod imaging;
pub mod output;
pub mod session;
pub mod sink;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
