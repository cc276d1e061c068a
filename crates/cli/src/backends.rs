use bizcard_core::config::{NerSettings, OcrSettings};
use bizcard_core::{NerBackendKind, OcrBackendKind};
use bizcard_ocr::{EntityRecognizer, HeuristicEntityRecognizer, OcrBackend, TesseractCli};
use std::sync::Arc;

/// Build the configured OCR engine.
pub fn ocr_backend(settings: &OcrSettings) -> anyhow::Result<Box<dyn OcrBackend>> {
    match settings.backend {
        OcrBackendKind::TesseractCli => Ok(Box::new(
            TesseractCli::new(&settings.tesseract_bin).with_tessdata_dir(settings.tessdata_dir.clone()),
        )),
        OcrBackendKind::Leptess => leptess_backend(settings),
    }
}

#[cfg(feature = "tesseract")]
fn leptess_backend(settings: &OcrSettings) -> anyhow::Result<Box<dyn OcrBackend>> {
    let data_path = settings.tessdata_dir.as_ref().map(|p| p.display().to_string());
    Ok(Box::new(bizcard_ocr::LeptessRecognizer::new(data_path)))
}

#[cfg(not(feature = "tesseract"))]
fn leptess_backend(_settings: &OcrSettings) -> anyhow::Result<Box<dyn OcrBackend>> {
    Err(bizcard_ocr::PipelineError::from(bizcard_ocr::OcrError::NotAvailable).into())
}

/// Load the entity recognizer once for the whole process.
///
/// A model that fails to load is not fatal: the heuristic recognizer takes
/// its place and a warning is logged.
pub fn entity_recognizer(settings: &NerSettings) -> Arc<dyn EntityRecognizer> {
    match settings.backend {
        NerBackendKind::Heuristic => Arc::new(HeuristicEntityRecognizer),
        NerBackendKind::Onnx => match onnx_recognizer(settings) {
            Ok(ner) => ner,
            Err(e) => {
                tracing::warn!("Falling back to heuristic entity recognition: {e:#}");
                Arc::new(HeuristicEntityRecognizer)
            }
        },
    }
}

#[cfg(feature = "onnx")]
fn onnx_recognizer(settings: &NerSettings) -> anyhow::Result<Arc<dyn EntityRecognizer>> {
    use anyhow::Context;

    let model = settings.model_path.as_deref().context("ner.model_path is not set")?;
    let tokenizer = settings.tokenizer_path.as_deref().context("ner.tokenizer_path is not set")?;
    let labels = settings.labels_path.as_deref().context("ner.labels_path is not set")?;
    Ok(Arc::new(bizcard_ocr::OnnxEntityRecognizer::load(model, tokenizer, labels)?))
}

#[cfg(not(feature = "onnx"))]
fn onnx_recognizer(_settings: &NerSettings) -> anyhow::Result<Arc<dyn EntityRecognizer>> {
    anyhow::bail!("ONNX entity recognition not available: build with the `onnx` feature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onnx_without_paths_falls_back() {
        let settings = NerSettings { backend: NerBackendKind::Onnx, ..Default::default() };
        let ner = entity_recognizer(&settings);
        let found = ner.entities("Acme S.r.l.").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn default_ocr_backend_is_cli() {
        assert!(ocr_backend(&OcrSettings::default()).is_ok());
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn leptess_without_feature_is_recognition_unavailable() {
        let settings = OcrSettings { backend: OcrBackendKind::Leptess, ..Default::default() };
        let err = ocr_backend(&settings).err().unwrap();
        assert!(err.to_string().starts_with("Text recognition unavailable"));
    }
}
