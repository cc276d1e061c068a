pub mod config;
pub mod field;
pub mod language;
pub mod record;

pub use config::{AppConfig, ConfigError, NerBackendKind, OcrBackendKind, SmtpSettings};
pub use field::{Field, Locale};
pub use language::{InvalidLanguage, LanguageCode};
pub use record::{ExtractedRecord, FieldValue, Matches, JOIN_SEPARATOR};
