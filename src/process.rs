use chrono::Local;
use tokio::task::spawn_blocking;

use crate::browse::Session;
use crate::config::Config;
use crate::extract::{extract_rows, RawRow};
use crate::normalize::{normalize, DocumentRecord};
use crate::store::BatchReport;
use crate::{export, info_time, store, warn_time, Result, TABLE_NAME};

/// Runs the whole pipeline: drive the portal's search, extract and
/// normalize the result rows, then write the JSON export and load the
/// database.
///
/// A navigation or export failure aborts the run; a database failure is
/// only warned about, since the export file already exists by then.
pub async fn run(config: &Config) -> Result<()> {
    let start_time = Local::now();
    let rows = fetch_rows(config).await?;
    if rows.is_empty() {
        info_time!("Search returned no result rows.");
    }
    info_time!(start_time, "Extracted {} result rows.", rows.len());

    let records = normalize(rows);

    export::write_export(&records, &config.export_path).await?;
    info_time!("Wrote {} records to {}", records.len(), config.export_path);

    match persist(config, &records).await {
        Ok(report) => report_batch(&report),
        Err(e) => warn_time!("Database step failed, export file kept: {}", e),
    }
    Ok(())
}

/// Scrapes the results page. The browser session is released on every
/// exit path: the rendered HTML is pulled out before parsing starts, so
/// nothing past this function needs the browser.
async fn fetch_rows(config: &Config) -> Result<Vec<RawRow>> {
    let session = Session::launch(config).await?;
    let html = match results_html(&session, config).await {
        Ok(html) => {
            session.close().await;
            html
        }
        Err(e) => {
            session.close().await;
            return Err(e);
        }
    };

    // Html parsing isn't Send and is CPU-bound; park it on a blocking
    // thread.
    spawn_blocking(move || extract_rows(&html)).await?
}

async fn results_html(session: &Session, config: &Config) -> Result<String> {
    session
        .open_and_search(&config.base_url, &config.query)
        .await?;
    session.results_html().await
}

async fn persist(config: &Config, records: &[DocumentRecord]) -> Result<BatchReport> {
    let pool = store::connect(&config.db).await?;
    let result = async {
        store::ensure_schema(&pool).await?;
        store::bulk_insert(&pool, records).await
    }
    .await;
    pool.close().await;
    result
}

fn report_batch(report: &BatchReport) {
    info_time!("Inserted {} rows into {}.", report.inserted, TABLE_NAME);
    for failure in &report.skipped {
        warn_time!(
            "Row {} skipped: `{}` is not a valid date ({}).",
            failure.index,
            failure.value,
            failure.reason
        );
    }
    if !report.skipped.is_empty() {
        warn_time!(
            "{} of {} rows skipped on date parsing.",
            report.skipped.len(),
            report.inserted + report.skipped.len()
        );
    }
}
