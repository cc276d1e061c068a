use bizcard_core::{ExtractedRecord, Field};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

/// One stored business card. Field columns hold display strings, sentinels
/// included, exactly as they were shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardRow {
    pub id: i64,
    pub company_name: String,
    pub tax_id: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub raw_text: Option<String>,
    pub image_sha256: Option<String>,
    pub created_at: String,
}

impl CardRow {
    /// Field values in `Field::ALL` order.
    pub fn fields(&self) -> [String; 5] {
        [
            self.company_name.clone(),
            self.tax_id.clone(),
            self.owner_name.clone(),
            self.email.clone(),
            self.phone.clone(),
        ]
    }
}

type CardTuple = (i64, String, String, String, String, String, Option<String>, Option<String>, String);

const CARD_COLUMNS: &str =
    "id, company_name, tax_id, owner_name, email, phone, raw_text, image_sha256, created_at";

fn row_from_tuple(r: CardTuple) -> CardRow {
    CardRow {
        id: r.0,
        company_name: r.1,
        tax_id: r.2,
        owner_name: r.3,
        email: r.4,
        phone: r.5,
        raw_text: r.6,
        image_sha256: r.7,
        created_at: r.8,
    }
}

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS business_cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_name TEXT NOT NULL,
            tax_id TEXT NOT NULL,
            owner_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            raw_text TEXT,
            image_sha256 TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_business_cards_sha ON business_cards(image_sha256)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_card(
    pool: &DbPool,
    record: &ExtractedRecord,
    raw_text: Option<&str>,
    image_sha256: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO business_cards (company_name, tax_id, owner_name, email, phone, raw_text, image_sha256) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.display(Field::CompanyName))
    .bind(record.display(Field::TaxId))
    .bind(record.display(Field::OwnerName))
    .bind(record.display(Field::Email))
    .bind(record.display(Field::Phone))
    .bind(raw_text)
    .bind(image_sha256)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(id, "Business card stored");
    Ok(id)
}

pub async fn get_all_cards(pool: &DbPool) -> Result<Vec<CardRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CardTuple>(&format!(
        "SELECT {CARD_COLUMNS} FROM business_cards ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_from_tuple).collect())
}

/// Most recent card scanned from an identical image file, if any.
pub async fn find_card_by_hash(pool: &DbPool, image_sha256: &str) -> Result<Option<CardRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, CardTuple>(&format!(
        "SELECT {CARD_COLUMNS} FROM business_cards WHERE image_sha256 = ? ORDER BY id DESC LIMIT 1"
    ))
    .bind(image_sha256)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_from_tuple))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizcard_core::{FieldValue, Locale};

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            company_name: FieldValue::from_matches(vec!["Acme S.p.A.".into()]),
            tax_id: FieldValue::from_matches(vec!["12345678901".into()]),
            owner_name: FieldValue::NotFound,
            email: FieldValue::from_matches(vec!["info@acme.it".into(), "sales@acme.it".into()]),
            phone: FieldValue::NotFound,
            locale: Locale::Italian,
        }
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("cards.db")).await.unwrap();

        let id = insert_card(&pool, &record(), Some("raw"), Some("abc")).await.unwrap();
        let cards = get_all_cards(&pool).await.unwrap();

        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.id, id);
        assert_eq!(card.company_name, "Acme S.p.A.");
        assert_eq!(card.email, "info@acme.it, sales@acme.it");
        assert_eq!(card.owner_name, "Non trovato");
        assert_eq!(card.raw_text.as_deref(), Some("raw"));
        assert!(!card.created_at.is_empty());
        assert_eq!(card.fields(), record().to_row());
    }

    #[tokio::test]
    async fn lookup_by_hash_returns_latest() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("cards.db")).await.unwrap();

        insert_card(&pool, &record(), None, Some("aaaa")).await.unwrap();
        let second = insert_card(&pool, &record(), None, Some("aaaa")).await.unwrap();
        insert_card(&pool, &record(), None, None).await.unwrap();

        assert_eq!(find_card_by_hash(&pool, "aaaa").await.unwrap().unwrap().id, second);
        assert!(find_card_by_hash(&pool, "bbbb").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.db");
        {
            let pool = create_db(&path).await.unwrap();
            insert_card(&pool, &record(), None, None).await.unwrap();
            pool.close().await;
        }
        let pool = create_db(&path).await.unwrap();
        assert_eq!(get_all_cards(&pool).await.unwrap().len(), 1);
    }
}
