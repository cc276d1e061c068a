use bizcard_core::LanguageCode;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

use crate::types::{NormalizedImage, RecognizedText};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not installed: {0}")]
    NotInstalled(String),
    #[error("Language pack '{0}' is not installed")]
    LanguageMissing(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Failed to hand image to OCR engine: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode image for OCR: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Tesseract not available: build with the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR backend.
/// Implementations take a binarized image and return the raw recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        image: &NormalizedImage,
        language: &LanguageCode,
    ) -> Result<RecognizedText, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(
        &self,
        image: &NormalizedImage,
        language: &LanguageCode,
    ) -> Result<RecognizedText, OcrError> {
        (**self).recognize(image, language)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, for unit testing the extraction pipeline
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
    fn recognize(
        &self,
        _image: &NormalizedImage,
        _language: &LanguageCode,
    ) -> Result<RecognizedText, OcrError> {
        Ok(RecognizedText::new(self.text.clone()))
    }
}

// ── Tesseract executable ──────────────────────────────────────────────────────

/// Runs the `tesseract` command-line program on a temporary PNG.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into(), tessdata_dir: None }
    }

    pub fn with_tessdata_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tessdata_dir = dir;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> OcrError {
        if e.kind() == std::io::ErrorKind::NotFound {
            OcrError::NotInstalled(format!("{} ({e})", self.binary.display()))
        } else {
            OcrError::Io(e)
        }
    }

    /// Languages the installed engine can load (`tesseract --list-langs`).
    pub fn available_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = self
            .command()
            .arg("--list-langs")
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(OcrError::Engine(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        Ok(parse_language_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(
        &self,
        image: &NormalizedImage,
        language: &LanguageCode,
    ) -> Result<RecognizedText, OcrError> {
        let png = image.to_png()?;
        let mut input = tempfile::Builder::new()
            .prefix("bizcard-")
            .suffix(".png")
            .tempfile()?;
        input.write_all(&png)?;
        input.flush()?;

        let output = self
            .command()
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(language.as_str())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr), language));
        }
        Ok(RecognizedText::new(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

/// Skips the "List of available languages …" header line.
fn parse_language_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of"))
        .map(str::to_string)
        .collect()
}

fn classify_failure(stderr: &str, language: &LanguageCode) -> OcrError {
    let lower = stderr.to_lowercase();
    if lower.contains("failed loading language") || lower.contains("error opening data file") {
        OcrError::LanguageMissing(language.to_string())
    } else {
        OcrError::Engine(stderr.trim().to_string())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use crate::types::{NormalizedImage, RecognizedText};
    use bizcard_core::LanguageCode;
    use leptess::LepTess;

    /// In-process libtesseract. A fresh engine is built per call so no state
    /// leaks between invocations.
    pub struct LeptessRecognizer {
        data_path: Option<String>,
    }

    impl LeptessRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    impl OcrBackend for LeptessRecognizer {
        fn recognize(
            &self,
            image: &NormalizedImage,
            language: &LanguageCode,
        ) -> Result<RecognizedText, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), language.as_str())
                .map_err(|_| OcrError::LanguageMissing(language.to_string()))?;
            let png = image.to_png()?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.get_utf8_text()
                .map(RecognizedText::new)
                .map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::types::RawImage;

    fn blank() -> NormalizedImage {
        normalize(&RawImage::new(4, 4, 1, vec![200; 16]).unwrap()).unwrap()
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("ACME S.r.l.\n+39 02 1234567");
        let text = r.recognize(&blank(), &LanguageCode::italian()).unwrap();
        assert_eq!(text.as_str(), "ACME S.r.l.\n+39 02 1234567");
    }

    #[test]
    fn boxed_backend_delegates() {
        let r: Box<dyn OcrBackend> = Box::new(MockRecognizer::new("hello"));
        assert_eq!(r.recognize(&blank(), &LanguageCode::italian()).unwrap().as_str(), "hello");
    }

    #[test]
    fn missing_binary_reports_not_installed() {
        let r = TesseractCli::new("/nonexistent/bin/tesseract-for-bizcard-tests");
        let err = r.recognize(&blank(), &LanguageCode::italian()).unwrap_err();
        assert!(matches!(err, OcrError::NotInstalled(_)), "got {err:?}");
        assert!(matches!(r.available_languages(), Err(OcrError::NotInstalled(_))));
    }

    #[test]
    fn language_list_skips_header() {
        let out = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nita\nosd\n";
        assert_eq!(parse_language_list(out), ["eng", "ita", "osd"]);
    }

    #[test]
    fn missing_language_pack_is_detected() {
        let stderr = "Error opening data file /usr/share/tessdata/xyz.traineddata\n\
                      Failed loading language 'xyz'\nTesseract couldn't load any languages!";
        let lang = LanguageCode::new("xyz").unwrap();
        assert!(matches!(classify_failure(stderr, &lang), OcrError::LanguageMissing(l) if l == "xyz"));
        assert!(matches!(classify_failure("segfault", &lang), OcrError::Engine(_)));
    }
}
