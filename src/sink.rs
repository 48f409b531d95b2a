//! Log sink for conversion checkpoints.
//!
//! The pipeline reports one line per checkpoint and per error. Sinks are
//! best-effort: they cannot fail, and a sink that drops everything leaves
//! conversions unaffected.

use std::sync::Mutex;
use tracing::{info, warn};

pub trait LogSink: Send + Sync {
    fn line(&self, message: &str);

    /// A message the user has to act on, such as picking a file first.
    fn prompt(&self, message: &str) {
        self.line(message);
    }
}

/// Forwards lines to `tracing` at info level, prompts at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn line(&self, message: &str) {
        info!(target: "rasterconv::log", "{message}");
    }

    fn prompt(&self, message: &str) {
        warn!(target: "rasterconv::log", "{message}");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn line(&self, _message: &str) {}
}

/// Append-only in-memory transcript.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    /// Lines rendered as a log panel, one `> `-prefixed entry per line.
    pub fn transcript(&self) -> String {
        self.lines()
            .iter()
            .map(|line| format!("> {line}\n"))
            .collect()
    }
}

impl LogSink for MemorySink {
    fn line(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }

    fn prompt(&self, message: &str) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(message.to_string());
        }
        self.line(message);
    }
}
