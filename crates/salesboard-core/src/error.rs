//! Error types for salesboard-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for salesboard-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in salesboard-core.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-text parse error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet parse error.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// File extension is not a supported upload format.
    #[error("unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The input had no header row.
    #[error("input is empty")]
    EmptyInput,

    /// A field was not valid in the configured text encoding.
    #[error("invalid text encoding at row {row}")]
    Encoding { row: usize },

    /// A required column is absent from the uploaded schema.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A numeric field could not be parsed.
    #[error("invalid {column} value {value:?} at row {row}")]
    InvalidValue {
        /// 1-based data row (header excluded).
        row: usize,
        column: String,
        value: String,
    },

    /// Unknown dashboard table name.
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

impl Error {
    /// Whether this error was caused by the uploaded data rather than the environment.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Error::Io(_))
    }
}

impl From<calamine::Error> for Error {
    fn from(e: calamine::Error) -> Self {
        Self::Spreadsheet(e.to_string())
    }
}
