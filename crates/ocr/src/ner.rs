use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NerError {
    #[error("NER model could not be loaded: {0}")]
    Model(String),
    #[error("NER inference failed: {0}")]
    Inference(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Miscellaneous,
}

impl EntityKind {
    /// Parse a tagger label: `PER`, `PERSON`, `B-ORG`, `I-LOC`, `GPE`, …
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_uppercase();
        let bare = ["B-", "I-", "E-", "S-", "L-", "U-"]
            .iter()
            .find_map(|p| label.strip_prefix(p))
            .unwrap_or(&label);
        match bare {
            "PER" | "PERSON" => Some(EntityKind::Person),
            "ORG" | "ORGANIZATION" | "ORGANISATION" => Some(EntityKind::Organization),
            "LOC" | "LOCATION" | "GPE" => Some(EntityKind::Location),
            "MISC" => Some(EntityKind::Miscellaneous),
            _ => None,
        }
    }
}

/// A span of text classified by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(text: impl Into<String>, kind: EntityKind) -> Self {
        Self { text: text.into(), kind }
    }
}

/// Named-entity recognition capability: text in, classified spans out.
///
/// Implementations are loaded once and shared read-only across runs.
pub trait EntityRecognizer: Send + Sync {
    fn entities(&self, text: &str) -> Result<Vec<Entity>, NerError>;
}

// ── Mock ──────────────────────────────────────────────────────────────────────

/// Returns a fixed entity list regardless of input.
#[derive(Debug, Clone, Default)]
pub struct MockEntityRecognizer {
    pub entities: Vec<Entity>,
}

impl MockEntityRecognizer {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }
}

impl EntityRecognizer for MockEntityRecognizer {
    fn entities(&self, _text: &str) -> Result<Vec<Entity>, NerError> {
        Ok(self.entities.clone())
    }
}

// ── Line heuristics ───────────────────────────────────────────────────────────

// Italian and common international legal forms.
re!(re_legal_form,
    r"(?i)(?:^|[\s,])(?:s\.?\s?r\.?\s?l\.?s?|s\.?\s?p\.?\s?a\.?|s\.?\s?n\.?\s?c\.?|s\.?\s?a\.?\s?s\.?|soc\.?\s+coop\.?|ltd\.?|limited|inc\.?|llc|llp|gmbh|corp\.?|plc)(?:$|[\s,.])");
re!(re_org_keyword,
    r"(?i)\b(?:studio|gruppo|group|azienda|agenzia|consulting|solutions|technologies|holding)\b");
re!(re_phone_like, r"\+?\d[\d\s\-]{7,}");
re!(re_name_word,
    r"^\p{Lu}(?:['’]\p{Lu})?\p{Ll}+(?:['’-]\p{Lu}?\p{Ll}+)*$");

const NAME_PARTICLES: &[&str] = &["de", "di", "da", "del", "della", "dei", "van", "von", "la", "le"];

const NOT_A_NAME: &[&str] = &[
    "via", "viale", "piazza", "corso", "largo", "strada", "tel", "telefono", "fax", "cell",
    "email", "mail", "www", "sito", "street", "road", "avenue", "direttore", "amministratore",
    "responsabile", "ufficio", "sede", "titolare", "manager", "director", "sales", "marketing",
    "partita", "codice",
];

/// Rule-based recognizer used when no model is configured.
///
/// Organizations: lines carrying a legal form (S.r.l., S.p.A., Ltd, GmbH, …)
/// or an organization keyword. Persons: lines of two or three capitalized
/// words, optionally joined by particles such as "di" or "van".
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEntityRecognizer;

impl HeuristicEntityRecognizer {
    /// Email, web address or phone number lines are never names.
    fn is_contact_line(line: &str) -> bool {
        let lower = line.to_lowercase();
        line.contains('@') || lower.contains("www.") || lower.contains("http") || re_phone_like().is_match(line)
    }

    fn is_organization(line: &str) -> bool {
        re_legal_form().is_match(line) || re_org_keyword().is_match(line)
    }

    fn is_person(line: &str) -> bool {
        if line.chars().any(|c| c.is_ascii_digit() || c == '@' || c == ':' || c == '/') {
            return false;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let names = words
            .iter()
            .filter(|w| !NAME_PARTICLES.contains(&w.to_lowercase().as_str()))
            .count();
        if !(2..=3).contains(&names) {
            return false;
        }
        if words.first().map_or(true, |w| NAME_PARTICLES.contains(&w.to_lowercase().as_str())) {
            return false;
        }
        words.iter().all(|w| {
            let lower = w.to_lowercase();
            if NAME_PARTICLES.contains(&lower.as_str()) {
                return true;
            }
            !NOT_A_NAME.contains(&lower.trim_end_matches('.')) && re_name_word().is_match(w)
        })
    }
}

impl EntityRecognizer for HeuristicEntityRecognizer {
    fn entities(&self, text: &str) -> Result<Vec<Entity>, NerError> {
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !Self::is_contact_line(l))
            .filter_map(|line| {
                if Self::is_organization(line) {
                    Some(Entity::new(line, EntityKind::Organization))
                } else if Self::is_person(line) {
                    Some(Entity::new(line, EntityKind::Person))
                } else {
                    None
                }
            })
            .collect())
    }
}

// ── Token-label grouping (shared by model-backed recognizers) ─────────────────

/// Merge per-token labels into entity spans.
///
/// `offsets` are byte ranges into `text`; `(0, 0)` marks special tokens.
/// A token continues the open span when it carries an `I-` label of the same
/// kind, or when it starts exactly where the span ends (sub-word pieces).
pub(crate) fn group_token_labels(text: &str, offsets: &[(usize, usize)], labels: &[&str]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut open: Option<(EntityKind, usize, usize)> = None;

    let mut flush = |open: &mut Option<(EntityKind, usize, usize)>| {
        if let Some((kind, start, end)) = open.take() {
            if let Some(span) = text.get(start..end) {
                let span = span.trim();
                if !span.is_empty() {
                    entities.push(Entity::new(span, kind));
                }
            }
        }
    };

    for (&(start, end), label) in offsets.iter().zip(labels) {
        if start == end {
            continue;
        }
        let Some(kind) = EntityKind::from_label(label) else {
            flush(&mut open);
            continue;
        };
        let inside = label.trim().to_ascii_uppercase().starts_with("I-");
        match open {
            Some((open_kind, _, open_end)) if open_kind == kind && (inside || start == open_end) => {
                if let Some(span) = open.as_mut() {
                    span.2 = end;
                }
            }
            _ => {
                flush(&mut open);
                open = Some((kind, start, end));
            }
        }
    }
    flush(&mut open);
    entities
}
