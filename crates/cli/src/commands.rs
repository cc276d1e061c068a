use anyhow::{Context, Result};
use bizcard_core::{AppConfig, ExtractedRecord, Field, Locale};
use bizcard_export::ExportFormat;
use bizcard_ocr::{CardPipeline, Extractor, RawImage, ScanOutput, TesseractCli};
use bizcard_storage::DbPool;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::backends;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Photo of the business card (PNG / JPEG)
    pub image: PathBuf,

    /// Also print the raw recognized text
    #[arg(long)]
    pub text: bool,

    /// Print the record as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Write the record as CSV
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Write the record as JSON
    #[arg(long, value_name = "PATH")]
    pub json_out: Option<PathBuf>,

    /// Store the record in the local database
    #[arg(long)]
    pub save: bool,

    /// Send the record through the configured SMTP account
    #[arg(long)]
    pub email: bool,

    /// Save the top-left corner crop (presumed logo) as PNG
    #[arg(long, value_name = "PATH")]
    pub logo: Option<PathBuf>,
}

pub async fn scan(config: &AppConfig, database: &Path, args: ScanArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let fingerprint = bizcard_ocr::image_fingerprint(&bytes);
    let raw = RawImage::decode(&bytes).map_err(bizcard_ocr::PipelineError::from)?;
    drop(bytes);

    if let Some(path) = &args.logo {
        report("Logo crop", save_logo(config, &raw, path));
    }

    let extractor = Extractor::new(
        backends::entity_recognizer(&config.ner),
        Locale::for_language(&config.language),
    );
    let pipeline = Arc::new(CardPipeline::new(backends::ocr_backend(&config.ocr)?, extractor));
    let timeout = Duration::from_secs(config.ocr.timeout_secs);
    let ScanOutput { text, record } = pipeline
        .run_with_timeout(raw, config.language.clone(), timeout)
        .await?;

    if args.text {
        println!("── Recognized text ──\n{text}");
    }
    if args.json {
        println!("{}", bizcard_export::to_json(&record.to_row(), record.locale)?);
    } else {
        print_record(&record);
    }

    // Downstream actions are independent: a failure is reported and the rest
    // still run.
    if let Some(path) = &args.csv {
        report("CSV export", write_export(path, ExportFormat::Csv, &record));
    }
    if let Some(path) = &args.json_out {
        report("JSON export", write_export(path, ExportFormat::Json, &record));
    }
    if args.save {
        report("Database save", save_record(database, &record, text.as_str(), &fingerprint).await);
    }
    if args.email {
        report("Email", send_email(config, &record).await);
    }

    Ok(())
}

fn report(action: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::error!("{action} failed: {e:#}");
        eprintln!("✗ {action} failed: {e:#}");
    }
}

fn print_record(record: &ExtractedRecord) {
    let width = Field::ALL
        .iter()
        .map(|f| record.locale.label(*f).chars().count())
        .max()
        .unwrap_or(0);
    for field in Field::ALL {
        let label = record.locale.label(field);
        println!("{label:<width$}  {}", record.display(field));
    }
}

fn save_logo(config: &AppConfig, raw: &RawImage, path: &Path) -> Result<()> {
    let logo = bizcard_ocr::crop_logo_region(raw, config.logo.width, config.logo.height)?;
    logo.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ Logo crop written to {}", path.display());
    Ok(())
}

fn write_export(path: &Path, format: ExportFormat, record: &ExtractedRecord) -> Result<()> {
    let bytes = match format {
        ExportFormat::Csv => bizcard_export::to_csv([record.to_row()], record.locale)?,
        ExportFormat::Json => bizcard_export::to_json(&record.to_row(), record.locale)?.into_bytes(),
    };
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ {} written to {}", format.extension().to_uppercase(), path.display());
    Ok(())
}

async fn open_db(database: &Path) -> Result<DbPool> {
    if let Some(parent) = database.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    bizcard_storage::create_db(database)
        .await
        .with_context(|| format!("Failed to open database {}", database.display()))
}

async fn save_record(database: &Path, record: &ExtractedRecord, raw_text: &str, fingerprint: &str) -> Result<()> {
    let pool = open_db(database).await?;
    if let Some(existing) = bizcard_storage::find_card_by_hash(&pool, fingerprint).await? {
        tracing::warn!(id = existing.id, "Same image was already stored on {}", existing.created_at);
    }
    let id = bizcard_storage::insert_card(&pool, record, Some(raw_text), Some(fingerprint)).await?;
    println!("✓ Saved to {} (id {id})", database.display());
    Ok(())
}

async fn send_email(config: &AppConfig, record: &ExtractedRecord) -> Result<()> {
    let smtp = config
        .smtp
        .as_ref()
        .context("No [smtp] section in the configuration")?;
    bizcard_email::send_record(smtp, record).await?;
    println!("✓ Email sent to {}", smtp.to);
    Ok(())
}

pub async fn list(config: &AppConfig, database: &Path, json: bool) -> Result<()> {
    let pool = open_db(database).await?;
    let cards = bizcard_storage::get_all_cards(&pool).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }
    if cards.is_empty() {
        println!("No cards stored in {}", database.display());
        return Ok(());
    }
    let locale = Locale::for_language(&config.language);
    for card in &cards {
        println!("#{} ({})", card.id, card.created_at);
        for (field, value) in Field::ALL.iter().zip(card.fields()) {
            println!("  {}: {value}", locale.label(*field));
        }
    }
    Ok(())
}

pub async fn export(config: &AppConfig, database: &Path, format: ExportFormat, out: &Path) -> Result<()> {
    let pool = open_db(database).await?;
    let cards = bizcard_storage::get_all_cards(&pool).await?;
    let locale = Locale::for_language(&config.language);
    let rows = cards.iter().map(|c| c.fields());

    let bytes = match format {
        ExportFormat::Csv => bizcard_export::to_csv(rows, locale)?,
        ExportFormat::Json => bizcard_export::to_json_array(rows, locale)?.into_bytes(),
    };
    std::fs::write(out, bytes).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("✓ {} cards exported to {}", cards.len(), out.display());
    Ok(())
}

pub fn langs(config: &AppConfig) -> Result<()> {
    let tesseract =
        TesseractCli::new(&config.ocr.tesseract_bin).with_tessdata_dir(config.ocr.tessdata_dir.clone());
    let languages = tesseract
        .available_languages()
        .map_err(bizcard_ocr::PipelineError::from)?;
    for lang in languages {
        let marker = if lang == config.language.as_str() { " (configured)" } else { "" };
        println!("{lang}{marker}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizcard_core::FieldValue;

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            email: FieldValue::from_matches(vec!["info@acme.it".into()]),
            ..ExtractedRecord::empty(Locale::Italian)
        }
    }

    #[test]
    fn write_export_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("card.csv");
        let json = dir.path().join("card.json");

        write_export(&csv, ExportFormat::Csv, &record()).unwrap();
        write_export(&json, ExportFormat::Json, &record()).unwrap();

        let csv = std::fs::read_to_string(csv).unwrap();
        assert!(csv.starts_with("Ragione Sociale,"));
        assert!(csv.contains("info@acme.it"));
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(json["Email"], "info@acme.it");
    }

    #[test]
    fn write_export_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("card.csv");
        assert!(write_export(&path, ExportFormat::Csv, &record()).is_err());
    }

    #[tokio::test]
    async fn save_then_export_round() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("data").join("cards.db");
        save_record(&db, &record(), "raw text", "abc").await.unwrap();
        save_record(&db, &record(), "raw text", "abc").await.unwrap();

        let out = dir.path().join("all.json");
        export(&AppConfig::default(), &db, ExportFormat::Json, &out).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["Email"], "info@acme.it");
    }

    #[tokio::test]
    async fn email_without_smtp_section_fails_cleanly() {
        let err = send_email(&AppConfig::default(), &record()).await.unwrap_err();
        assert!(err.to_string().contains("smtp"));
    }
}
