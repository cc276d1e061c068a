use serde::{Deserialize, Serialize};
use std::fmt;

use crate::language::LanguageCode;

/// The five fields every extracted record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CompanyName,
    TaxId,
    OwnerName,
    Email,
    Phone,
}

impl Field {
    /// Display order used for tables, CSV columns and database inserts.
    pub const ALL: [Field; 5] = [
        Field::CompanyName,
        Field::TaxId,
        Field::OwnerName,
        Field::Email,
        Field::Phone,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::CompanyName => "company_name",
            Field::TaxId => "tax_id",
            Field::OwnerName => "owner_name",
            Field::Email => "email",
            Field::Phone => "phone",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Presentation language for field labels and "not found" sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Italian,
    English,
}

impl Locale {
    pub fn for_language(language: &LanguageCode) -> Self {
        match language.as_str() {
            "ita" => Locale::Italian,
            _ => Locale::English,
        }
    }

    pub fn label(self, field: Field) -> &'static str {
        match (self, field) {
            (Locale::Italian, Field::CompanyName) => "Ragione Sociale",
            (Locale::Italian, Field::TaxId) => "Partita IVA",
            (Locale::Italian, Field::OwnerName) => "Nome Proprietario",
            (Locale::Italian, Field::Email) => "Email",
            (Locale::Italian, Field::Phone) => "Telefono",
            (Locale::English, Field::CompanyName) => "Company name",
            (Locale::English, Field::TaxId) => "Tax ID",
            (Locale::English, Field::OwnerName) => "Owner name",
            (Locale::English, Field::Email) => "Email",
            (Locale::English, Field::Phone) => "Phone",
        }
    }

    /// Placeholder shown when a field has no valid match. Italian agrees in
    /// gender with the field's noun.
    pub fn sentinel(self, field: Field) -> &'static str {
        match (self, field) {
            (Locale::Italian, Field::OwnerName | Field::Phone) => "Non trovato",
            (Locale::Italian, _) => "Non trovata",
            (Locale::English, _) => "not found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_snake_case_and_unique() {
        let keys: Vec<_> = Field::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(keys, ["company_name", "tax_id", "owner_name", "email", "phone"]);
    }

    #[test]
    fn locale_follows_language() {
        assert_eq!(Locale::for_language(&LanguageCode::italian()), Locale::Italian);
        assert_eq!(
            Locale::for_language(&LanguageCode::new("eng").unwrap()),
            Locale::English
        );
    }

    #[test]
    fn italian_sentinels_agree_in_gender() {
        assert_eq!(Locale::Italian.sentinel(Field::CompanyName), "Non trovata");
        assert_eq!(Locale::Italian.sentinel(Field::TaxId), "Non trovata");
        assert_eq!(Locale::Italian.sentinel(Field::OwnerName), "Non trovato");
        assert_eq!(Locale::Italian.sentinel(Field::Email), "Non trovata");
        assert_eq!(Locale::Italian.sentinel(Field::Phone), "Non trovato");
        assert_eq!(Locale::English.sentinel(Field::Phone), "not found");
    }
}
