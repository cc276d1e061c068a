use bizcard_core::{ExtractedRecord, FieldValue, Locale};
use std::sync::Arc;

use crate::ner::{EntityKind, EntityRecognizer};

// ── Compiled regex cache ─────────────────────────────────────────────────────

// Loose candidate finders.
re!(re_email_candidate, r"\S+@\S+\.\S+");
re!(re_phone_candidate, r"\+?\d[\d\s\-]{7,}");
re!(re_tax_id, r"(?:P\.?IVA\s?:?\s?)?(\d{11})");

// Strict re-checks, anchored at the start of the candidate only.
re!(re_email_shape, r"^[^@]+@[^@]+\.[^@]+");
re!(re_phone_shape, r"^\+?\d[\d\s\-]{7,}");

// ── Public extraction API ─────────────────────────────────────────────────────

/// Turns raw OCR text into a fully populated [`ExtractedRecord`].
///
/// Every field is extracted on its own; a field with no surviving match is
/// `NotFound`. Extraction never fails: an entity-recognizer error is logged
/// and only the name fields fall back to `NotFound`.
#[derive(Clone)]
pub struct Extractor {
    ner: Arc<dyn EntityRecognizer>,
    locale: Locale,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").field("locale", &self.locale).finish_non_exhaustive()
    }
}

impl Extractor {
    pub fn new(ner: Arc<dyn EntityRecognizer>, locale: Locale) -> Self {
        Self { ner, locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Same recognizer, different sentinel language.
    pub fn with_locale(&self, locale: Locale) -> Self {
        Self { ner: Arc::clone(&self.ner), locale }
    }

    pub fn extract(&self, text: &str) -> ExtractedRecord {
        let (owner_name, company_name) = self.extract_names(text);
        ExtractedRecord {
            company_name: FieldValue::from_matches(company_name),
            tax_id: FieldValue::from_matches(extract_tax_ids(text)),
            owner_name: FieldValue::from_matches(owner_name),
            email: FieldValue::from_matches(extract_emails(text)),
            phone: FieldValue::from_matches(extract_phones(text)),
            locale: self.locale,
        }
    }

    // ── Names ─────────────────────────────────────────────────────────────────

    fn extract_names(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let entities = match self.ner.entities(text) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Entity recognition failed, name fields left empty: {e}");
                return (Vec::new(), Vec::new());
            }
        };

        let mut persons = Vec::new();
        let mut organizations = Vec::new();
        for entity in entities {
            let span = entity.text.trim();
            if span.is_empty() {
                continue;
            }
            match entity.kind {
                EntityKind::Person => persons.push(span.to_string()),
                EntityKind::Organization => organizations.push(span.to_string()),
                EntityKind::Location | EntityKind::Miscellaneous => {}
            }
        }
        (persons, organizations)
    }
}

// ── Pattern fields ────────────────────────────────────────────────────────────

/// Candidates containing `@` and a dot, kept only if they have a non-empty
/// local part, domain and suffix.
pub fn extract_emails(text: &str) -> Vec<String> {
    re_email_candidate()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|c| re_email_shape().is_match(c))
        .map(str::to_string)
        .collect()
}

/// Optional `+`, a digit, then at least seven digits, spaces or hyphens.
///
/// The re-check repeats the finder pattern, so it never rejects anything;
/// overlapping-looking duplicates are left in place. Surrounding whitespace
/// (the pattern happily swallows trailing line breaks) is trimmed.
pub fn extract_phones(text: &str) -> Vec<String> {
    re_phone_candidate()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|c| re_phone_shape().is_match(c))
        .map(|c| c.trim().to_string())
        .collect()
}

/// Eleven consecutive digits, optionally preceded by a "P.IVA" label.
pub fn extract_tax_ids(text: &str) -> Vec<String> {
    re_tax_id()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
