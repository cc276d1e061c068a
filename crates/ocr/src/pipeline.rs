use bizcard_core::{ExtractedRecord, LanguageCode, Locale};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::extract::Extractor;
use crate::normalize::{normalize, NormalizeError};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{RawImage, RecognizedText};

/// The only two ways a scan can fail. Both end the run; nothing is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Text recognition unavailable: {0}")]
    RecognitionUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidImage,
    RecognitionUnavailable,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidImage(_) => ErrorKind::InvalidImage,
            PipelineError::RecognitionUnavailable(_) => ErrorKind::RecognitionUnavailable,
        }
    }

    /// Human-readable detail without the category prefix.
    pub fn diagnostic(&self) -> &str {
        match self {
            PipelineError::InvalidImage(d) | PipelineError::RecognitionUnavailable(d) => d,
        }
    }
}

impl From<NormalizeError> for PipelineError {
    fn from(e: NormalizeError) -> Self {
        PipelineError::InvalidImage(e.to_string())
    }
}

impl From<OcrError> for PipelineError {
    fn from(e: OcrError) -> Self {
        PipelineError::RecognitionUnavailable(e.to_string())
    }
}

/// The result of a single successful scan.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Raw OCR text, shown alongside the record.
    pub text: RecognizedText,
    /// Structured fields extracted from the OCR text.
    pub record: ExtractedRecord,
}

/// Orchestrates: normalize → OCR → extract, strictly in that order.
///
/// Holds no per-run state: every intermediate image and text lives only on
/// the stack of a single `run` call.
pub struct CardPipeline<R: OcrBackend> {
    recognizer: R,
    extractor: Extractor,
}

impl<R: OcrBackend> CardPipeline<R> {
    pub fn new(recognizer: R, extractor: Extractor) -> Self {
        Self { recognizer, extractor }
    }

    /// Process an already-decoded image.
    pub fn run(&self, raw: RawImage, language: &LanguageCode) -> Result<ScanOutput, PipelineError> {
        let started = Instant::now();

        // 1. Binarize.
        let normalized = normalize(&raw)?;
        drop(raw);
        debug!(
            width = normalized.width(),
            height = normalized.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image normalized"
        );

        // 2. Run OCR.
        let ocr_started = Instant::now();
        let text = self.recognizer.recognize(&normalized, language)?;
        drop(normalized);
        debug!(
            chars = text.as_str().len(),
            elapsed_ms = ocr_started.elapsed().as_millis() as u64,
            %language,
            "Text recognized"
        );
        if text.is_blank() {
            info!("OCR returned no text, every field will be reported as not found");
        }

        // 3. Extract structured fields.
        let record = self
            .extractor
            .with_locale(Locale::for_language(language))
            .extract(text.as_str());

        info!(
            fields_found = record.found_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Card processed"
        );
        Ok(ScanOutput { text, record })
    }

    /// Process encoded image bytes (PNG / JPEG / …).
    pub fn run_bytes(&self, data: &[u8], language: &LanguageCode) -> Result<ScanOutput, PipelineError> {
        let raw = RawImage::decode(data)?;
        self.run(raw, language)
    }
}

impl<R: OcrBackend + 'static> CardPipeline<R> {
    /// Runs [`CardPipeline::run`] on the blocking pool, bounded by `timeout`.
    ///
    /// An expired timeout is reported as `RecognitionUnavailable`; the OCR
    /// call itself cannot be interrupted and finishes in the background.
    pub async fn run_with_timeout(
        self: Arc<Self>,
        raw: RawImage,
        language: LanguageCode,
        timeout: Duration,
    ) -> Result<ScanOutput, PipelineError> {
        let task = tokio::task::spawn_blocking(move || self.run(raw, &language));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(PipelineError::RecognitionUnavailable(format!(
                "pipeline task aborted: {join}"
            ))),
            Err(_) => Err(PipelineError::RecognitionUnavailable(format!(
                "recognition timed out after {:.1}s",
                timeout.as_secs_f32()
            ))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
