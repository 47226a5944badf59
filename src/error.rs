use thiserror::Error;

/// Failures at the I/O edges. The parsing and aggregation core never fails.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Source file not found: {path}")]
    SourceNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Region config error: {0}")]
    RegionConfig(String),
}
