//! Data model shared by the session, the pipeline and the CLI.
//!
//! - [`SourceImage`]: the selected file, read fully and decoded once.
//! - [`ConversionRequest`]: what the user asked for at convert time.
//! - [`ConversionResult`]: the encoded artifact handed to preview/download.

use crate::imaging::{Dimensions, OutputFormat, RequestedSize, parse_dimension};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a recognized image format")]
    UnknownFormat,
    #[error("{format:?} decoding failed: {source}")]
    Decode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
    #[error("image has no pixels ({0})")]
    Empty(Dimensions),
}

/// A decoded input image.
///
/// Cheap to clone: the raw bytes and decoded bitmap are shared.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    image: Arc<DynamicImage>,
}

impl SourceImage {
    /// Decode an in-memory file. The format is sniffed from the content.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let format = image::guess_format(&bytes).map_err(|_| DecodeError::UnknownFormat)?;
        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(|source| DecodeError::Decode { format, source })?;
        let dims = Dimensions::new(image.width(), image.height());
        if dims.is_empty() {
            return Err(DecodeError::Empty(dims));
        }
        Ok(Self {
            bytes: bytes.into(),
            format,
            image: Arc::new(image),
        })
    }

    /// Read a file fully into memory and decode it.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(bytes)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Per-conversion settings, derived from user input when the user converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: OutputFormat,
}

impl ConversionRequest {
    /// Keep the source's dimensions.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            width: None,
            height: None,
            format,
        }
    }

    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Build from raw form fields. Dimensions that are not positive integers
    /// are treated as unspecified.
    pub fn from_input(width: &str, height: &str, format: OutputFormat) -> Self {
        Self {
            width: parse_dimension(width),
            height: parse_dimension(height),
            format,
        }
    }

    pub fn size(&self) -> RequestedSize {
        RequestedSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Encoded output of one successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    bytes: Vec<u8>,
    format: OutputFormat,
    dimensions: Dimensions,
}

impl ConversionResult {
    pub fn new(bytes: Vec<u8>, format: OutputFormat, dimensions: Dimensions) -> Self {
        Self {
            bytes,
            format,
            dimensions,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Download name: `converted.<format>`.
    pub fn file_name(&self) -> String {
        format!("converted.{}", self.format.name())
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Self-contained `data:` URL for previews.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }

    /// Write the artifact into `dir` under [`file_name`](Self::file_name).
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
