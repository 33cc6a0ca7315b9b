use thiserror::Error;

/// Everything that can abort a load, render or export pass.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: cannot parse Timestamp {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}: column {column} has non-numeric value {value:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: expected {expected} fields, found {found}")]
    TooManyFields {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("pdf generation failed: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
