//! Scraper for a public jurisprudence portal: drives a headless browser
//! through the portal's search form, extracts the rendered result rows,
//! and writes the records to a JSON export and a PostgreSQL table.

mod error;
mod macros;

pub mod browse;
pub mod config;
pub mod export;
pub mod extract;
pub mod normalize;
pub mod process;
pub mod store;

pub use error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://www.tce.sp.gov.br/jurisprudencia/";
const DEFAULT_QUERY: &str = "fraude em escolas";
const DEFAULT_EXPORT_PATH: &str = "documentos_tce.json";

/// How long to wait for the search form / results table to render.
const READY_TIMEOUT_MS: u64 = 30_000;
const READY_POLL_INTERVAL_MS: u64 = 250;

const TABLE_NAME: &str = "documentos";
