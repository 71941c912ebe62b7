use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Global binarization threshold on the 0–255 intensity scale.
pub const DEFAULT_THRESHOLD: u8 = 120;

/// Tesseract language pack for Bahasa Indonesia.
pub const DEFAULT_LANGUAGE: &str = "ind";

/// Tesseract `PSM_AUTO`: fully automatic page segmentation, no OSD.
pub const PSM_AUTO: u8 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings handed to the recognition engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    pub language: String,
    pub page_seg_mode: u8,
    /// Keep runs of spaces between words; card fields are laid out in columns.
    pub preserve_interword_spaces: bool,
    /// Directory holding `*.traineddata`; `None` lets the engine use its default.
    pub tessdata_path: Option<String>,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            page_seg_mode: PSM_AUTO,
            preserve_interword_spaces: true,
            tessdata_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub threshold: u8,
    pub recognition: RecognitionSettings,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            recognition: RecognitionSettings::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
