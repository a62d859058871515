//! Error types for spreadsheet ingestion

use thiserror::Error;

/// Errors raised while reading and joining the sheet exports
#[derive(Error, Debug)]
pub enum IngestError {
    /// CSV reader failure (bad quoting, wrong column count)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A field could not be parsed
    #[error("Invalid {field} {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A required field is empty
    #[error("Missing {0}")]
    MissingField(&'static str),
}

pub type IngestResult<T> = Result<T, IngestError>;
