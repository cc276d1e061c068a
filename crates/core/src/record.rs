use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::field::{Field, Locale};

/// Separator between multiple matches of the same field.
pub const JOIN_SEPARATOR: &str = ", ";

/// At least one match for a field. Only [`Matches::new`] builds one.
///
/// ```compile_fail
/// let empty = bizcard_core::Matches(Vec::new());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches(Vec<String>);

impl Matches {
    /// `None` for an empty list.
    pub fn new(matches: Vec<String>) -> Option<Self> {
        (!matches.is_empty()).then_some(Self(matches))
    }

    pub fn joined(&self) -> String {
        self.0.join(JOIN_SEPARATOR)
    }
}

/// The matches found for one field, or none at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    Found(Matches),
    #[default]
    NotFound,
}

impl FieldValue {
    /// Builds a value from extracted matches; an empty list is `NotFound`.
    pub fn from_matches(matches: Vec<String>) -> Self {
        Matches::new(matches).map_or(FieldValue::NotFound, FieldValue::Found)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FieldValue::Found(_))
    }

    pub fn joined(&self) -> Option<String> {
        match self {
            FieldValue::Found(m) => Some(m.joined()),
            FieldValue::NotFound => None,
        }
    }
}

/// Structured contact data pulled out of one business card.
///
/// All five fields are always present; an unmatched field is `NotFound` and
/// renders as the locale's sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub company_name: FieldValue,
    pub tax_id: FieldValue,
    pub owner_name: FieldValue,
    pub email: FieldValue,
    pub phone: FieldValue,
    pub locale: Locale,
}

impl ExtractedRecord {
    /// A record with every field set to `NotFound`.
    pub fn empty(locale: Locale) -> Self {
        Self {
            company_name: FieldValue::NotFound,
            tax_id: FieldValue::NotFound,
            owner_name: FieldValue::NotFound,
            email: FieldValue::NotFound,
            phone: FieldValue::NotFound,
            locale,
        }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        match field {
            Field::CompanyName => &self.company_name,
            Field::TaxId => &self.tax_id,
            Field::OwnerName => &self.owner_name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
        }
    }

    /// Comma-joined matches, or the sentinel for this record's locale.
    pub fn display(&self, field: Field) -> String {
        self.get(field)
            .joined()
            .unwrap_or_else(|| self.locale.sentinel(field).to_string())
    }

    /// Display strings in `Field::ALL` order.
    pub fn to_row(&self) -> [String; 5] {
        Field::ALL.map(|f| self.display(f))
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| !self.get(*f).is_found())
    }

    pub fn found_count(&self) -> usize {
        Field::ALL.iter().filter(|f| self.get(**f).is_found()).count()
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Field::ALL.len()))?;
        for field in Field::ALL {
            map.serialize_entry(field.key(), &self.display(field))?;
        }
        map.end()
    }
}
