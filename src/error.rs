//! Error types for CSV parsing and writing

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, CsvError>;

/// Structural parse error with position information
///
/// Produced when the parser hits malformed input (a quote in the middle of
/// an unquoted cell, a stray character after a closing quote, a carriage
/// return not followed by a line feed). The parser stays in its failed state
/// afterwards and returns a clone of this error for every further call.
///
/// `row` is the 1-based physical line number, `column` the 1-based byte
/// offset within that line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("CSV parse error at row {row}, column {column}: {message}")]
pub struct ParseError {
    /// Fixed description of what went wrong
    pub message: &'static str,
    /// 1-based physical line number
    pub row: u64,
    /// 1-based byte offset within the line
    pub column: u64,
}

/// Errors that can occur during CSV processing
#[derive(Debug, Error)]
pub enum CsvError {
    /// Malformed CSV input
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Writing to the output sink failed
    #[error("Failed to write CSV output: {0}")]
    Write(#[from] std::io::Error),
}
