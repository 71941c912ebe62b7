pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod rules;

pub use extract::Extractor;
pub use pipeline::{KtpPipeline, PipelineError, ScanResult};
pub use preprocess::{decode, preprocess, BinaryImage, PreprocessError, Preprocessor, RawImage};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError};
pub use rules::{FieldRule, Matcher, Normalize};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
