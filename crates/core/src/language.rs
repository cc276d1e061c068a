use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid language code '{0}': expected a single Tesseract code such as `ita` or `chi_sim`")]
pub struct InvalidLanguage(pub String);

/// A single Tesseract language code (`ita`, `eng`, `chi_sim`, …).
///
/// Combined codes like `ita+eng` are rejected: recognition runs in exactly one
/// configured language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: &str) -> Result<Self, InvalidLanguage> {
        let code = code.trim();
        let (base, suffix) = match code.split_once('_') {
            Some((b, s)) => (b, Some(s)),
            None => (code, None),
        };
        let base_ok = base.len() == 3 && base.chars().all(|c| c.is_ascii_lowercase());
        let suffix_ok = suffix.map_or(true, |s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        });
        if base_ok && suffix_ok {
            Ok(LanguageCode(code.to_string()))
        } else {
            Err(InvalidLanguage(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn italian() -> Self {
        LanguageCode("ita".to_string())
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self::italian()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = InvalidLanguage;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::new(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = InvalidLanguage;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        LanguageCode::new(&s)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}
