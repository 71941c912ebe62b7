pub mod config;
pub mod document;

pub use config::{ConfigError, RecognitionSettings, ScanConfig, DEFAULT_THRESHOLD};
pub use document::{Field, KtpDocument};
