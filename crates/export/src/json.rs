use bizcard_core::{Field, Locale};
use serde_json::{Map, Value};

use crate::ExportError;

fn labelled(row: &[String; 5], locale: Locale) -> Value {
    let mut obj = Map::new();
    for (field, value) in Field::ALL.iter().zip(row) {
        obj.insert(locale.label(*field).to_string(), Value::String(value.clone()));
    }
    Value::Object(obj)
}

/// Pretty-printed object keyed by localized labels. Non-ASCII text is kept
/// as-is rather than escaped.
pub fn to_json(row: &[String; 5], locale: Locale) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&labelled(row, locale))?)
}

pub fn to_json_array<I>(rows: I, locale: Locale) -> Result<String, ExportError>
where
    I: IntoIterator<Item = [String; 5]>,
{
    let items: Vec<Value> = rows.into_iter().map(|r| labelled(&r, locale)).collect();
    Ok(serde_json::to_string_pretty(&items)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> [String; 5] {
        [
            "Caffè Società S.r.l.".into(),
            "12345678901".into(),
            "Non trovato".into(),
            "info@caffe.it".into(),
            "+39 02 1234567".into(),
        ]
    }

    #[test]
    fn object_uses_localized_labels() {
        let json = to_json(&row(), Locale::Italian).unwrap();
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["Ragione Sociale"], "Caffè Società S.r.l.");
        assert_eq!(v["Partita IVA"], "12345678901");
        assert_eq!(v["Telefono"], "+39 02 1234567");
        assert_eq!(v.as_object().unwrap().len(), 5);
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let json = to_json(&row(), Locale::Italian).unwrap();
        assert!(json.contains("Caffè Società"));
    }

    #[test]
    fn array_of_cards() {
        let json = to_json_array([row(), row()], Locale::English).unwrap();
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
        assert_eq!(v[1]["Owner name"], "Non trovato");
    }
}
