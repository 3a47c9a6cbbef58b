//! Canned text recognizer for tests and the demo CLI.

use anyhow::{bail, Result};
use async_trait::async_trait;
use copysim_core::TextRecognizer;

/// Recognizer that ignores the image bytes and returns fixed text, or a
/// fixed failure. Stands in for a real OCR engine behind the same trait.
pub struct StubRecognizer {
    text: Option<String>,
}

impl StubRecognizer {
    /// Stub that "extracts" the given text from any image.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Stub whose recognition always fails.
    #[must_use]
    pub const fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextRecognizer for StubRecognizer {
    async fn recognize_text(&self, _image: &[u8], _mime: &str) -> Result<String> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => bail!("recognizer failed to decode image"),
        }
    }
}
