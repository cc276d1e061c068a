#[macro_use]
mod macros;

pub mod extract;
pub mod hash;
pub mod logo;
pub mod ner;
#[cfg(feature = "onnx")]
pub mod ner_onnx;
pub mod normalize;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use extract::Extractor;
pub use hash::{image_fingerprint, sha256_bytes, to_hex};
pub use logo::crop_logo_region;
pub use ner::{
    Entity, EntityKind, EntityRecognizer, HeuristicEntityRecognizer, MockEntityRecognizer, NerError,
};
#[cfg(feature = "onnx")]
pub use ner_onnx::OnnxEntityRecognizer;
pub use normalize::{normalize, NormalizeError};
pub use pipeline::{CardPipeline, ErrorKind, PipelineError, ScanOutput};
#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::LeptessRecognizer;
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, TesseractCli};
pub use types::{NormalizedImage, RawImage, RecognizedText};
