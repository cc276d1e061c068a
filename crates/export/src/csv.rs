use bizcard_core::{Field, Locale};

use crate::ExportError;

/// Header of localized field labels, then one line per card.
///
/// Rows are display strings in `Field::ALL` order (see
/// `ExtractedRecord::to_row`).
pub fn to_csv<I>(rows: I, locale: Locale) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = [String; 5]>,
{
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(Field::ALL.map(|f| locale.label(f)))?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))
}
