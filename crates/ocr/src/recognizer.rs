use thiserror::Error;

use crate::preprocess::BinaryImage;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Recognition was cancelled")]
    Cancelled,
    #[error("Recognition timed out")]
    TimedOut,
    #[error("Tesseract not available — build with `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR backend.
/// Implementations receive the binarized card and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image: &BinaryImage) -> Result<String, OcrError>;
}

/// Any matching closure can stand in for an engine.
impl<F> OcrBackend for F
where
    F: Fn(&BinaryImage) -> Result<String, OcrError> + Send + Sync,
{
    fn recognize(&self, image: &BinaryImage) -> Result<String, OcrError> {
        self(image)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string — useful for unit testing the extraction pipeline
/// without requiring Tesseract to be installed.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image: &BinaryImage) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use crate::preprocess::BinaryImage;
    use ktp_core::RecognitionSettings;
    use leptess::{LepTess, Variable};

    pub struct TesseractRecognizer {
        settings: RecognitionSettings,
    }

    impl TesseractRecognizer {
        pub fn new(settings: RecognitionSettings) -> Self {
            Self { settings }
        }

        fn open_session(&self) -> Result<LepTess, OcrError> {
            let mut lt = LepTess::new(self.settings.tessdata_path.as_deref(), &self.settings.language)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(
                Variable::TesseditPagesegMode,
                &self.settings.page_seg_mode.to_string(),
            )
            .map_err(|e| OcrError::Engine(e.to_string()))?;
            let preserve = if self.settings.preserve_interword_spaces { "1" } else { "0" };
            lt.set_variable(Variable::PreserveInterwordSpaces, preserve)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(lt)
        }
    }

    impl OcrBackend for TesseractRecognizer {
        /// One engine session per call; it is dropped on every return path.
        fn recognize(&self, image: &BinaryImage) -> Result<String, OcrError> {
            let png = image
                .to_png()
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let mut lt = self.open_session()?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{preprocess, RawImage};

    fn blank() -> BinaryImage {
        preprocess(RawImage::new(2, 2, 3, vec![255; 12]).unwrap()).unwrap()
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("NIK : 3174012345678901\nNama : BUDI");
        assert_eq!(r.recognize(&blank()).unwrap(), "NIK : 3174012345678901\nNama : BUDI");
    }

    #[test]
    fn closure_acts_as_backend() {
        let r = |img: &BinaryImage| -> Result<String, OcrError> {
            Ok(format!("{}x{}", img.width(), img.height()))
        };
        assert_eq!(r.recognize(&blank()).unwrap(), "2x2");
    }

    #[test]
    fn closure_errors_pass_through() {
        let r = |_: &BinaryImage| -> Result<String, OcrError> { Err(OcrError::TimedOut) };
        assert!(matches!(r.recognize(&blank()), Err(OcrError::TimedOut)));
    }
}
