use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::language::LanguageCode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OcrBackendKind {
    /// Shells out to the `tesseract` executable.
    #[default]
    TesseractCli,
    /// In-process libtesseract (requires the `tesseract` feature).
    Leptess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NerBackendKind {
    #[default]
    Heuristic,
    /// Token-classification ONNX model (requires the `onnx` feature).
    Onnx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub backend: OcrBackendKind,
    pub tesseract_bin: PathBuf,
    pub tessdata_dir: Option<PathBuf>,
    /// Upper bound on a single recognition run.
    pub timeout_secs: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::default(),
            tesseract_bin: PathBuf::from("tesseract"),
            tessdata_dir: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NerSettings {
    pub backend: NerBackendKind,
    pub model_path: Option<PathBuf>,
    pub tokenizer_path: Option<PathBuf>,
    /// HuggingFace `config.json` carrying the `id2label` table.
    pub labels_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite file; `None` means the platform data directory.
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self { width: 100, height: 100 }
    }
}

/// Top-level application configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub language: LanguageCode,
    pub ocr: OcrSettings,
    pub ner: NerSettings,
    pub storage: StorageSettings,
    /// Email delivery is disabled when absent.
    pub smtp: Option<SmtpSettings>,
    pub logo: LogoSettings,
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.language.as_str(), "ita");
        assert_eq!(cfg.ocr.backend, OcrBackendKind::TesseractCli);
        assert_eq!(cfg.ocr.timeout_secs, 60);
        assert_eq!(cfg.logo, LogoSettings { width: 100, height: 100 });
        assert!(cfg.smtp.is_none());
    }

    #[test]
    fn parses_full_document() {
        let cfg = AppConfig::from_toml(
            r#"
            language = "eng"

            [ocr]
            backend = "leptess"
            tessdata_dir = "/opt/tessdata"
            timeout_secs = 5

            [ner]
            backend = "onnx"
            model_path = "/models/ner/model.onnx"

            [storage]
            database = "/tmp/cards.db"

            [smtp]
            host = "smtp.example.com"
            username = "me"
            password = "secret"
            from = "me@example.com"
            to = "you@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.language.as_str(), "eng");
        assert_eq!(cfg.ocr.backend, OcrBackendKind::Leptess);
        assert_eq!(cfg.ocr.tessdata_dir, Some(PathBuf::from("/opt/tessdata")));
        assert_eq!(cfg.ocr.tesseract_bin, PathBuf::from("tesseract"));
        assert_eq!(cfg.ner.backend, NerBackendKind::Onnx);
        assert_eq!(cfg.storage.database, Some(PathBuf::from("/tmp/cards.db")));
        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.host, "smtp.example.com");
    }

    #[test]
    fn rejects_multi_language_code() {
        assert!(matches!(
            AppConfig::from_toml("language = \"ita+eng\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bizcard.toml");
        std::fs::write(&path, "[logo]\nwidth = 64\n").unwrap();
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.logo.width, 64);
        assert_eq!(cfg.logo.height, 100);
    }
}
