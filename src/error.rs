use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing environment variable: {0}")]
    ConfigMissingVar(&'static str),

    #[error("Couldn't set up a browser session: {0}")]
    Session(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {timeout_ms} ms waiting for `{selector}` to render.")]
    ReadyTimeout { selector: String, timeout_ms: u64 },

    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    ParseInvalidSelector(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database Error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}
