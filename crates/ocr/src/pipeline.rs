use std::path::Path;
use thiserror::Error;

use ktp_core::KtpDocument;

use crate::extract::Extractor;
use crate::preprocess::{self, PreprocessError, Preprocessor, RawImage};
use crate::recognizer::{OcrBackend, OcrError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid input image: {0}")]
    InvalidImage(#[from] PreprocessError),
    #[error("OCR recognition did not complete: {0}")]
    RecognitionFailed(#[from] OcrError),
}

/// The result of a single card scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Raw OCR text output, kept for debugging.
    pub raw_text: String,
    /// Structured fields extracted from the OCR text.
    pub document: KtpDocument,
}

/// Orchestrates: binarize → OCR → extract.
///
/// Holds no mutable state, so one pipeline can serve concurrent callers.
pub struct KtpPipeline<R: OcrBackend> {
    recognizer: R,
    preprocessor: Preprocessor,
}

impl<R: OcrBackend> KtpPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer, preprocessor: Preprocessor::default() }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.preprocessor = Preprocessor::new(threshold);
        self
    }

    /// Run the full pipeline on an already decoded image.
    pub fn run(&self, image: RawImage) -> Result<ScanResult, PipelineError> {
        // 1. Condition the image for recognition.
        let binary = self.preprocessor.binarize(image)?;

        // 2. Run OCR.
        let raw_text = self.recognizer.recognize(&binary).map_err(|e| {
            tracing::warn!("Recognition failed: {e}");
            PipelineError::RecognitionFailed(e)
        })?;
        drop(binary);

        // 3. Extract structured fields.
        let document = Extractor::extract(&raw_text);
        tracing::info!(
            populated = document.populated(),
            chars = raw_text.len(),
            "KTP scan complete"
        );

        Ok(ScanResult { raw_text, document })
    }

    /// Process encoded image bytes (JPEG / PNG / WEBP / …).
    pub fn process_bytes(&self, data: &[u8]) -> Result<ScanResult, PipelineError> {
        let image = preprocess::decode(data)?;
        self.run(image)
    }

    /// Process an image file on disk.
    pub async fn process_file(&self, path: &Path) -> Result<ScanResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::BinaryImage;
    use crate::recognizer::MockRecognizer;
    use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const CARD: &str = "NIK : 3174012345678901\nNama : BUDI SANTOSO\nRT/RW : 005/003\n";

    fn tiny_png() -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_fn(4, 4, |x, _| Rgb([(x * 60) as u8, 200, 10]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn rgb(width: u32, height: u32) -> RawImage {
        RawImage::new(width, height, 3, vec![90; (width * height * 3) as usize]).unwrap()
    }

    /// Counts live engine sessions; a session is released when the guard drops.
    struct SessionTracker {
        live: Arc<AtomicUsize>,
        opened: Arc<AtomicUsize>,
        fail: bool,
    }

    struct Session(Arc<AtomicUsize>);

    impl Drop for Session {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl OcrBackend for SessionTracker {
        fn recognize(&self, _image: &BinaryImage) -> Result<String, OcrError> {
            self.live.fetch_add(1, Ordering::SeqCst);
            self.opened.fetch_add(1, Ordering::SeqCst);
            let _session = Session(self.live.clone());
            if self.fail {
                return Err(OcrError::Engine("engine crashed".into()));
            }
            Ok(CARD.to_string())
        }
    }

    /// An engine handle that lives as long as whoever owns it.
    struct EngineHandle {
        _session: Session,
    }

    impl OcrBackend for EngineHandle {
        fn recognize(&self, _image: &BinaryImage) -> Result<String, OcrError> {
            Err(OcrError::TimedOut)
        }
    }

    #[test]
    fn run_extracts_and_keeps_raw_text() {
        let pipeline = KtpPipeline::new(MockRecognizer::new(CARD));
        let result = pipeline.run(rgb(3, 3)).unwrap();
        assert_eq!(result.raw_text, CARD);
        assert_eq!(result.document.nik.as_deref(), Some("3174012345678901"));
        assert_eq!(result.document.name.as_deref(), Some("BUDI SANTOSO"));
        assert_eq!(result.document.rt.as_deref(), Some("005"));
        assert_eq!(result.document.rw.as_deref(), Some("003"));
    }

    #[test]
    fn recognizer_sees_binarized_image() {
        let pipeline = KtpPipeline::new(|img: &BinaryImage| -> Result<String, OcrError> {
            let px = img.as_raw().pixel(0, 0);
            Ok(format!("Agama : {}", px[0]))
        })
        .with_threshold(80);
        let result = pipeline.run(rgb(2, 2)).unwrap();
        // 90 > 80 → background
        assert_eq!(result.document.religion.as_deref(), Some("255"));
    }

    #[test]
    fn invalid_image_is_not_sent_to_engine() {
        let opened = Arc::new(AtomicUsize::new(0));
        let pipeline = KtpPipeline::new(SessionTracker {
            live: Arc::new(AtomicUsize::new(0)),
            opened: opened.clone(),
            fail: false,
        });
        let err = pipeline.run(RawImage::new(0, 0, 3, vec![]).unwrap()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(PreprocessError::InvalidImage(_))));
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn engine_failure_is_wrapped() {
        let pipeline = KtpPipeline::new(|_: &BinaryImage| -> Result<String, OcrError> {
            Err(OcrError::Cancelled)
        });
        let err = pipeline.run(rgb(2, 2)).unwrap_err();
        assert!(matches!(err, PipelineError::RecognitionFailed(OcrError::Cancelled)));
        assert!(err.to_string().starts_with("OCR recognition did not complete"));
    }

    #[test]
    fn engine_called_once_per_run_without_retry() {
        let live = Arc::new(AtomicUsize::new(0));
        for fail in [false, true] {
            let opened = Arc::new(AtomicUsize::new(0));
            let pipeline = KtpPipeline::new(SessionTracker {
                live: live.clone(),
                opened: opened.clone(),
                fail,
            });
            let outcome = pipeline.run(rgb(2, 2));
            assert_eq!(outcome.is_err(), fail);
            assert_eq!(opened.load(Ordering::SeqCst), 1);
            // The backend's scoped session is gone once `run` returns.
            assert_eq!(live.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn pipeline_owns_the_engine_and_drops_it() {
        let live = Arc::new(AtomicUsize::new(1));
        let pipeline = KtpPipeline::new(EngineHandle { _session: Session(live.clone()) });
        pipeline.run(rgb(2, 2)).unwrap_err();
        assert_eq!(live.load(Ordering::SeqCst), 1);
        drop(pipeline);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sparse_text_is_a_normal_result() {
        let pipeline = KtpPipeline::new(MockRecognizer::new("smudged glare ###"));
        let result = pipeline.run(rgb(2, 2)).unwrap();
        assert!(result.document.is_empty());
    }

    #[test]
    fn concurrent_runs_share_one_pipeline() {
        let pipeline = Arc::new(KtpPipeline::new(MockRecognizer::new(CARD)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let p = pipeline.clone();
                std::thread::spawn(move || p.run(rgb(5, 5)).unwrap().document)
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().nik.as_deref(), Some("3174012345678901"));
        }
    }

    #[test]
    fn process_bytes_decodes_image() {
        let pipeline = KtpPipeline::new(MockRecognizer::new(CARD));
        let result = pipeline.process_bytes(&tiny_png()).unwrap();
        assert_eq!(result.document.populated(), 4);
    }

    #[test]
    fn process_bytes_rejects_non_image() {
        let pipeline = KtpPipeline::new(MockRecognizer::new(CARD));
        let err = pipeline.process_bytes(b"%PDF-1.4 not an image").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(PreprocessError::Load(_))));
    }

    #[tokio::test]
    async fn process_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ktp.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let pipeline = KtpPipeline::new(MockRecognizer::new(CARD));
        let result = pipeline.process_file(&path).await.unwrap();
        assert_eq!(result.document.nik.as_deref(), Some("3174012345678901"));
    }

    #[tokio::test]
    async fn process_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = KtpPipeline::new(MockRecognizer::new(CARD));
        let err = pipeline.process_file(&dir.path().join("nope.jpg")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
