//! Converter configuration module.
//!
//! Handles loading, validating, and merging `rasterconv.toml`. Stock defaults
//! are overridden by whatever the user file specifies; everything not
//! mentioned keeps its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! formats = ["png", "jpeg", "webp"]  # Formats offered for conversion
//! default_format = "png"             # Used when no format is requested
//! quality = 90                       # JPEG quality (1-100)
//!
//! [resize]
//! filter = "lanczos3"                # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [engine]
//! bootstrap = "instance"             # instance | shared
//! max_dimension = 16384              # Largest width or height the engine accepts
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    EngineLimits, EngineLoader, FormatSet, InstanceLoader, OutputFormat, Quality, ResampleFilter,
    SharedLoader,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `rasterconv.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Output formats and encoder settings.
    pub output: OutputConfig,
    /// Resampling settings.
    pub resize: ResizeConfig,
    /// Engine bootstrap and limits.
    pub engine: EngineConfig,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.formats.is_empty() {
            return Err(ConfigError::Validation(
                "output.formats must not be empty".into(),
            ));
        }
        if let Some(format) = self.output.formats.iter().find(|f| !f.host_supported()) {
            return Err(ConfigError::Validation(format!(
                "output.formats: no encoder compiled in for {format}"
            )));
        }
        if !self.output.formats.contains(&self.output.default_format) {
            return Err(ConfigError::Validation(format!(
                "output.default_format {} is not listed in output.formats",
                self.output.default_format
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.engine.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "engine.max_dimension must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn format_set(&self) -> FormatSet {
        FormatSet::new(self.output.formats.iter().copied())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.output.quality)
    }

    pub fn limits(&self) -> EngineLimits {
        EngineLimits {
            max_dimension: self.engine.max_dimension,
        }
    }

    /// The engine loader selected by `engine.bootstrap`.
    pub fn loader(&self) -> Arc<dyn EngineLoader> {
        match self.engine.bootstrap {
            Bootstrap::Instance => Arc::new(InstanceLoader::new(self.limits())),
            Bootstrap::Shared => Arc::new(SharedLoader::new(self.limits())),
        }
    }
}

/// Output format settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Formats a conversion may request, in display order.
    pub formats: Vec<OutputFormat>,
    pub default_format: OutputFormat,
    /// Lossy encoding quality, used for JPEG.
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: vec![OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::Webp],
            default_format: OutputFormat::Png,
            quality: Quality::default().value(),
        }
    }
}

/// Resampling settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResampleFilter,
}

/// How the engine is brought up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bootstrap {
    /// A private engine per run.
    #[default]
    Instance,
    /// The process-wide engine.
    Shared,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub bootstrap: Bootstrap,
    /// Largest width or height, in pixels, the engine will open or produce.
    pub max_dimension: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bootstrap: Bootstrap::default(),
            max_dimension: EngineLimits::default().max_dimension,
        }
    }
}

/// Stock defaults as a TOML value, the base every user file is merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ConverterConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Deep-merge two TOML values. Tables merge key by key; any other value in
/// `overlay` replaces the one in `base`.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            toml::Value::Table(base)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. A missing file yields `None`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ConverterConfig, ConfigError> {
    let merged = match overlay {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<ConverterConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

pub fn stock_config_toml() -> &'static str {
    r##"# rasterconv configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Formats a conversion may request. Supported: png, jpeg, webp, tiff.
formats = ["png", "jpeg", "webp"]

# Format used when none is given on the command line.
default_format = "png"

# JPEG quality (1 = worst, 100 = best). PNG, WebP and TIFF are lossless.
quality = 90

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[resize]
# Resampling filter used whenever the target size differs from the source.
# One of: nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "lanczos3"

# ---------------------------------------------------------------------------
# Engine
# ---------------------------------------------------------------------------
[engine]
# "instance" builds a private engine for this run.
# "shared" uses the process-wide engine.
bootstrap = "instance"

# Largest width or height in pixels the engine will open or resize to.
max_dimension = 16384
"##
}
