//! Interactive conversion session.
//!
//! A [`Session`] models one user working through the select / convert /
//! preview loop. It holds the current selection and the last successful
//! result; a failed conversion leaves the previous preview in place.

use std::path::Path;

use crate::imaging::{ConversionError, Converter, HostEncoder, SurfaceEncoder};
use crate::types::{ConversionRequest, ConversionResult, DecodeError, SourceImage};

pub struct Session<E = HostEncoder> {
    converter: Converter<E>,
    source: Option<SourceImage>,
    preview: Option<ConversionResult>,
}

impl<E: SurfaceEncoder> Session<E> {
    pub fn new(converter: Converter<E>) -> Self {
        Self {
            converter,
            source: None,
            preview: None,
        }
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// The most recent successful conversion, if any.
    pub fn preview(&self) -> Option<&ConversionResult> {
        self.preview.as_ref()
    }

    /// Select an in-memory file. On failure nothing stays selected.
    pub fn select_bytes(&mut self, bytes: Vec<u8>) -> Result<&SourceImage, DecodeError> {
        self.select(SourceImage::decode(bytes))
    }

    pub fn select_file(&mut self, path: &Path) -> Result<&SourceImage, DecodeError> {
        self.select(SourceImage::open(path))
    }

    pub fn clear_selection(&mut self) {
        self.source = None;
        self.converter.sink().line("No file selected.");
    }

    fn select(
        &mut self,
        decoded: Result<SourceImage, DecodeError>,
    ) -> Result<&SourceImage, DecodeError> {
        let sink = self.converter.sink();
        match decoded {
            Ok(source) => {
                sink.line("Image file loaded.");
                sink.line(&format!("Image dimensions: {}", source.dimensions()));
                Ok(self.source.insert(source))
            }
            Err(err) => {
                self.source = None;
                sink.line("Error loading image file:");
                sink.line(&err.to_string());
                Err(err)
            }
        }
    }

    /// Convert the current selection. Only a successful run replaces the
    /// preview.
    pub fn convert(
        &mut self,
        request: &ConversionRequest,
    ) -> Result<&ConversionResult, ConversionError> {
        let result = self.converter.convert(self.source.as_ref(), request)?;
        Ok(self.preview.insert(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Dimensions, OutputFormat};
    use crate::sink::MemorySink;
    use crate::test_helpers::{FailPoint, FakeEngine, ready_provider, sample_png};
    use std::sync::Arc;

    fn session(fake: FakeEngine) -> (Session, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let converter = Converter::new(ready_provider(Arc::new(fake)), sink.clone());
        (Session::new(converter), sink)
    }

    #[test]
    fn selecting_a_file_logs_its_dimensions() {
        let (mut session, sink) = session(FakeEngine::new());
        let dims = session.select_bytes(sample_png(40, 30)).unwrap().dimensions();

        assert_eq!(dims, Dimensions::new(40, 30));
        assert_eq!(
            sink.lines(),
            vec!["Image file loaded.", "Image dimensions: 40x30"]
        );
    }

    #[test]
    fn failed_selection_clears_previous_source() {
        let (mut session, sink) = session(FakeEngine::new());
        session.select_bytes(sample_png(4, 4)).unwrap();

        assert!(session.select_bytes(b"nope".to_vec()).is_err());
        assert!(session.source().is_none());
        assert!(sink.contains("Error loading image file:"));
    }

    #[test]
    fn clearing_selection_is_logged() {
        let (mut session, sink) = session(FakeEngine::new());
        session.select_bytes(sample_png(4, 4)).unwrap();
        session.clear_selection();

        assert!(session.source().is_none());
        assert_eq!(sink.lines().last().unwrap(), "No file selected.");
    }

    #[test]
    fn convert_without_selection_prompts_and_keeps_no_preview() {
        let (mut session, sink) = session(FakeEngine::new());
        let err = session
            .convert(&ConversionRequest::new(OutputFormat::Png))
            .unwrap_err();

        assert!(matches!(err, ConversionError::NoImage));
        assert_eq!(sink.prompts(), vec!["Please select an image first."]);
        assert!(session.preview().is_none());
    }

    #[test]
    fn successful_convert_sets_preview() {
        let (mut session, _sink) = session(FakeEngine::new());
        session.select_bytes(sample_png(20, 10)).unwrap();

        let request = ConversionRequest::new(OutputFormat::Png).with_size(Some(10), Some(5));
        session.convert(&request).unwrap();

        let preview = session.preview().unwrap();
        assert_eq!(preview.dimensions(), Dimensions::new(10, 5));
        assert!(preview.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn failed_convert_keeps_previous_preview() {
        let (mut session, sink) = session(FakeEngine::new().failing_at(FailPoint::Resize));
        session.select_bytes(sample_png(8, 8)).unwrap();
        session
            .convert(&ConversionRequest::new(OutputFormat::Png))
            .unwrap();
        let before = session.preview().cloned().unwrap();

        let request = ConversionRequest::new(OutputFormat::Jpeg).with_size(Some(4), Some(4));
        let err = session.convert(&request).unwrap_err();

        assert!(matches!(err, ConversionError::Engine { .. }));
        assert_eq!(session.preview(), Some(&before));
        assert!(sink.contains("An error occurred during conversion"));
    }
}
