use std::io::Read;
use std::path::Path;

use anyhow::Context;
use ktp_core::{KtpDocument, ScanConfig};
use ktp_ocr::{Extractor, KtpPipeline, OcrBackend, Preprocessor};

/// Resolve config: explicit path, then the platform config dir, then defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<ScanConfig> {
    if let Some(path) = explicit {
        return ScanConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    if let Some(dirs) = directories::ProjectDirs::from("id", "ktp-scan", "ktp") {
        let path = dirs.config_dir().join("config.toml");
        if path.is_file() {
            tracing::info!("Using config: {}", path.display());
            return ScanConfig::load(&path)
                .with_context(|| format!("Failed to load config {}", path.display()));
        }
    }

    Ok(ScanConfig::default())
}

#[cfg(feature = "tesseract")]
fn recognizer(config: &ScanConfig) -> impl OcrBackend {
    ktp_ocr::TesseractRecognizer::new(config.recognition.clone())
}

#[cfg(not(feature = "tesseract"))]
fn recognizer(_config: &ScanConfig) -> impl OcrBackend {
    |_: &ktp_ocr::BinaryImage| -> Result<String, ktp_ocr::OcrError> {
        Err(ktp_ocr::OcrError::NotAvailable)
    }
}

pub async fn scan(config: &ScanConfig, image: &Path, json: bool, raw: bool) -> anyhow::Result<()> {
    tracing::info!("Scanning KTP: {}", image.display());
    let pipeline = KtpPipeline::new(recognizer(config)).with_threshold(config.threshold);
    let result = pipeline
        .process_file(image)
        .await
        .with_context(|| format!("Failed to scan {}", image.display()))?;

    if raw {
        println!("── Raw OCR text ──\n{}\n", result.raw_text.trim_end());
    }
    print!("{}", render(&result.document, json)?);
    Ok(())
}

pub fn extract(input: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let text = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    print!("{}", render(&Extractor::extract(&text), json)?);
    Ok(())
}

pub fn binarize(config: &ScanConfig, image: &Path, output: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
    let raw = ktp_ocr::decode(&data).context("Invalid input image")?;
    let binary = Preprocessor::new(config.threshold).binarize(raw)?;
    std::fs::write(output, binary.to_png()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!("Binarized image written to {}", output.display());
    Ok(())
}

fn render(doc: &KtpDocument, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(doc)? + "\n");
    }
    Ok(render_table(doc))
}

fn render_table(doc: &KtpDocument) -> String {
    let rows = doc.rows();
    if rows.is_empty() {
        return "No KTP fields recognized.\n".to_string();
    }
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("{label:<width$}  {value}\n"))
        .collect()
}
