use image::{DynamicImage, GrayImage, ImageBuffer};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

use crate::normalize::NormalizeError;

/// A decoded 8-bit raster as uploaded by the user: interleaved, row-major.
///
/// Immutable once built; each pipeline run owns its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl RawImage {
    /// Wraps an existing pixel buffer, checking that its layout is usable.
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self, NormalizeError> {
        if width == 0 || height == 0 {
            return Err(NormalizeError::ZeroArea { width, height });
        }
        if !(1..=4).contains(&channels) {
            return Err(NormalizeError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(NormalizeError::BufferSize { expected, actual: pixels.len() });
        }
        Ok(Self { width, height, channels, pixels })
    }

    /// Decode PNG / JPEG / … bytes.
    pub fn decode(data: &[u8]) -> Result<Self, NormalizeError> {
        let img = image::load_from_memory(data)?;
        Self::from_dynamic(img)
    }

    pub fn open(path: &Path) -> Result<Self, NormalizeError> {
        let img = image::open(path)?;
        Self::from_dynamic(img)
    }

    /// Converts any decoded image to 8-bit, keeping its channel layout where possible.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, NormalizeError> {
        let (width, height) = (img.width(), img.height());
        let (channels, pixels) = match img {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
            other => (3, other.to_rgb8().into_raw()),
        };
        Self::new(width, height, channels, pixels)
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

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Rebuilds an `image` buffer view of this raster.
    pub(crate) fn to_dynamic(&self) -> Result<DynamicImage, NormalizeError> {
        let (w, h, data) = (self.width, self.height, self.pixels.clone());
        let img = match self.channels {
            1 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            2 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
            3 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            4 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
            n => return Err(NormalizeError::UnsupportedChannels(n)),
        };
        img.ok_or(NormalizeError::BufferSize {
            expected: w as usize * h as usize * self.channels as usize,
            actual: self.pixels.len(),
        })
    }
}

/// Single-channel binary image: every pixel is 0 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage(GrayImage);

impl NormalizedImage {
    pub(crate) fn new(img: GrayImage) -> Self {
        Self(img)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// PNG encoding for backends that take an encoded image.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        self.0.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        Ok(buf)
    }
}

/// Raw OCR output, noise and line breaks included. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecognizedText(String);

impl RecognizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for RecognizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecognizedText {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecognizedText {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
