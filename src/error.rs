use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Market data API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    DataShape(String),

    #[error("Cannot analyze snapshot: {0}")]
    Compute(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Transport and response-shape failures. These are absorbed where the
    /// snapshot is fetched: the cycle is skipped instead of backing off.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::Http(_) | AppError::Status { .. } | AppError::Json(_) | AppError::DataShape(_)
        )
    }
}
