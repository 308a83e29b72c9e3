use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DbConfig;
use crate::normalize::DocumentRecord;
use crate::{Result, TABLE_NAME};

/// Display format the portal uses for `data_atuacao`.
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Outcome of one bulk insert: how many rows landed, and which records
/// were skipped because their date text doesn't parse. A bad date never
/// aborts the rest of the batch.
#[derive(Debug)]
pub struct BatchReport {
    pub inserted: usize,
    pub skipped: Vec<RowFailure>,
}

/// One record the batch could not persist, with enough context to diagnose
/// without re-running the scrape.
#[derive(Debug)]
pub struct RowFailure {
    pub index: usize,
    pub value: String,
    pub reason: String,
}

/// The pipeline is strictly sequential, so a single connection is enough.
pub async fn connect(db: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(db.connect_options())
        .await?;
    Ok(pool)
}

/// Creates the destination table and its indexes if absent. Safe to call
/// every run.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in schema_statements() {
        sqlx::query(&statement).execute(pool).await?;
    }
    Ok(())
}

/// Every statement guards with IF NOT EXISTS, which is what makes
/// [`ensure_schema`] safe to repeat.
fn schema_statements() -> [String; 4] {
    [
        format!(
            r#"
        CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
            id SERIAL PRIMARY KEY,
            doc VARCHAR(100),
            n_processo VARCHAR(50),
            data_atuacao DATE,
            partes TEXT,
            materia VARCHAR(100),
            url TEXT
        )
        "#
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_data ON {TABLE_NAME} (data_atuacao)"),
        format!("CREATE INDEX IF NOT EXISTS idx_materia ON {TABLE_NAME} (materia)"),
        format!("CREATE INDEX IF NOT EXISTS idx_doc ON {TABLE_NAME} (doc)"),
    ]
}

/// Inserts every record with a parseable date inside one transaction,
/// committing once at the end. Insert and connection errors abort the
/// batch; unparseable dates only cost their own row.
pub async fn bulk_insert(pool: &PgPool, records: &[DocumentRecord]) -> Result<BatchReport> {
    let (parsed, skipped) = partition_by_date(records);

    let mut tx = pool.begin().await?;
    for (record, action_date) in &parsed {
        sqlx::query(&format!(
            "INSERT INTO {TABLE_NAME} (doc, n_processo, data_atuacao, partes, materia, url) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(&record.doc)
        .bind(&record.process_number)
        .bind(*action_date)
        .bind(record.parties.join(" | "))
        .bind(&record.subject)
        .bind(&record.url)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(BatchReport {
        inserted: parsed.len(),
        skipped,
    })
}

type ParsedBatch<'a> = (Vec<(&'a DocumentRecord, NaiveDate)>, Vec<RowFailure>);

/// Splits the batch into rows whose date text parses and rows to report.
fn partition_by_date(records: &[DocumentRecord]) -> ParsedBatch<'_> {
    let mut parsed = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match parse_action_date(&record.action_date) {
            Ok(date) => parsed.push((record, date)),
            Err(reason) => skipped.push(RowFailure {
                index,
                value: record.action_date.clone(),
                reason,
            }),
        }
    }
    (parsed, skipped)
}

fn parse_action_date(text: &str) -> core::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|e| e.to_string())
}
