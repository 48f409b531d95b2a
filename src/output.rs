//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! photo.jpg (1200x800, Jpeg)
//!     → converted.png (600x400, 184213 bytes)
//!     Saved: out/converted.png
//! ```
//!
//! ## Formats
//!
//! ```text
//! Output formats
//!     png   image/png   (default)
//!     jpeg  image/jpeg
//!     webp  image/webp
//! ```
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::{Dimensions, FormatSet, OutputFormat};
use crate::types::{ConversionResult, SourceImage};
use serde::Serialize;
use std::path::Path;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Convert
// ============================================================================

/// Machine-readable record of one conversion, printed with `--json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionSummary {
    pub input: String,
    pub source: Dimensions,
    pub output: String,
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub dimensions: Dimensions,
    pub bytes: usize,
}

impl ConversionSummary {
    pub fn new(input: &Path, source: &SourceImage, result: &ConversionResult, saved: &Path) -> Self {
        Self {
            input: input.display().to_string(),
            source: source.dimensions(),
            output: saved.display().to_string(),
            format: result.format(),
            mime_type: result.mime_type(),
            dimensions: result.dimensions(),
            bytes: result.bytes().len(),
        }
    }
}

pub fn format_convert_output(summary: &ConversionSummary, input_format: &str) -> Vec<String> {
    let file_name = Path::new(&summary.output)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| summary.output.clone());

    vec![
        format!("{} ({}, {})", summary.input, summary.source, input_format),
        format!(
            "{}→ {} ({}, {} bytes)",
            indent(1),
            file_name,
            summary.dimensions,
            summary.bytes
        ),
        format!("{}Saved: {}", indent(1), summary.output),
    ]
}

pub fn print_convert_output(summary: &ConversionSummary, input_format: &str) {
    for line in format_convert_output(summary, input_format) {
        println!("{}", line);
    }
}

// ============================================================================
// Formats
// ============================================================================

/// List the formats a converter accepts, marking the default.
pub fn format_formats(formats: &FormatSet, default: OutputFormat) -> Vec<String> {
    let mut lines = vec!["Output formats".to_string()];
    for format in formats.iter() {
        let line = format!("{}{:<5} {:<11}", indent(1), format.name(), format.mime_type());
        if format == default {
            lines.push(format!("{}(default)", line));
        } else {
            lines.push(line.trim_end().to_string());
        }
    }
    lines
}

pub fn print_formats(formats: &FormatSet, default: OutputFormat) {
    for line in format_formats(formats, default) {
        println!("{}", line);
    }
}
