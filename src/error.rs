use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesAnalyticsError {
    #[error("Input table has no header row; expected delimited text with named columns")]
    EmptyTable,

    #[error("Required sheet '{sheet}' was not found in the spreadsheet")]
    MissingSheet { sheet: String },

    #[error("Invalid sparsity threshold {0}: must be between 0.0 and 1.0")]
    InvalidSparsityThreshold(f64),

    #[error("Failed to read input table: {0}")]
    TableRead(#[from] csv::Error),

    #[cfg(feature = "gemini")]
    #[error("Could not reach the analysis service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Analysis service returned an unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SalesAnalyticsError>;
