use image::{DynamicImage, ImageBuffer, Rgba};
use std::io::Cursor;
use thiserror::Error;

use ktp_core::DEFAULT_THRESHOLD;

const BACKGROUND: u8 = 255;
const FOREGROUND: u8 = 0;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// An owned bitmap with interleaved 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl RawImage {
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        samples: Vec<u8>,
    ) -> Result<Self, PreprocessError> {
        let expected = width as usize * height as usize * channels as usize;
        if samples.len() != expected {
            return Err(PreprocessError::InvalidImage(format!(
                "expected {expected} samples for {width}x{height}x{channels}, got {}",
                samples.len()
            )));
        }
        Ok(Self { width, height, channels, samples })
    }

    /// Keep the decoded channel layout: grey stays grey, colour stays colour.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let color = img.color();
        let (channels, samples) = match (color.has_color(), color.has_alpha()) {
            (true, true) => (4, img.into_rgba8().into_raw()),
            (true, false) => (3, img.into_rgb8().into_raw()),
            (false, true) => (2, img.into_luma_alpha8().into_raw()),
            (false, false) => (1, img.into_luma8().into_raw()),
        };
        Self { width, height, channels, samples }
    }

    /// Promote any decoded image to RGBA, the layout a canvas hands over.
    pub fn from_rgba(img: DynamicImage) -> Self {
        let rgba = img.into_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            channels: 4,
            samples: rgba.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.samples[start..start + c]
    }
}

/// A [`RawImage`] whose colour channels hold only 0 or 255, equal per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage(RawImage);

impl BinaryImage {
    pub fn as_raw(&self) -> &RawImage {
        &self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// Encode as PNG bytes, the form image-consuming engines accept.
    pub fn to_png(&self) -> Result<Vec<u8>, PreprocessError> {
        let raw = &self.0;
        // Expand to RGBA so every supported channel layout encodes the same way.
        let rgba: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(raw.width, raw.height, |x, y| {
                let px = raw.pixel(x, y);
                let alpha = if px.len() > 3 { px[3] } else { u8::MAX };
                Rgba([px[0], px[1], px[2], alpha])
            });
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| PreprocessError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

/// Grayscale + global threshold binarization.
///
/// Intensity is the plain mean of R, G and B (no gamma, no luma weights).
/// Pixels brighter than `threshold` become background white, the rest black.
/// A single global threshold is fast and predictable but drops text on
/// unevenly lit photos; adaptive thresholding is not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessor {
    pub threshold: u8,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl Preprocessor {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Consume `image` and rewrite its colour channels in place.
    pub fn binarize(&self, mut image: RawImage) -> Result<BinaryImage, PreprocessError> {
        if image.width == 0 || image.height == 0 {
            return Err(PreprocessError::InvalidImage(format!(
                "empty image ({}x{})",
                image.width, image.height
            )));
        }
        if image.channels < 3 {
            return Err(PreprocessError::InvalidImage(format!(
                "need at least 3 colour channels, got {}",
                image.channels
            )));
        }

        tracing::debug!(
            width = image.width,
            height = image.height,
            channels = image.channels,
            threshold = self.threshold,
            "binarizing image"
        );

        let threshold = f32::from(self.threshold);
        for px in image.samples.chunks_exact_mut(image.channels as usize) {
            let sum = u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2]);
            let level = if f32::from(sum) / 3.0 > threshold { BACKGROUND } else { FOREGROUND };
            px[..3].fill(level);
        }

        Ok(BinaryImage(image))
    }
}

/// Binarize with the default threshold.
pub fn preprocess(image: RawImage) -> Result<BinaryImage, PreprocessError> {
    Preprocessor::default().binarize(image)
}

/// Decode JPEG / PNG / WEBP / … bytes into an RGBA [`RawImage`].
pub fn decode(data: &[u8]) -> Result<RawImage, PreprocessError> {
    let img = image::load_from_memory(data)?;
    Ok(RawImage::from_rgba(img))
}
