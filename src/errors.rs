//! # Error Types Module
//!
//! Error types shared by the conversation flow, the number generator,
//! the TXT to CSV converter and document delivery.

use thiserror::Error;

/// A conversation answer that does not have the expected shape.
///
/// The conversation stays on the same step and the user is prompted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Not exactly `expected` ASCII letters
    #[error("expected exactly {expected} letters")]
    Letters { expected: usize },
    /// Not exactly `expected` ASCII digits
    #[error("expected exactly {expected} digits")]
    Digits { expected: usize },
    /// A batch series list without a single valid entry
    #[error("no valid series letters found")]
    NoSeries,
    /// A batch series list above the configured limit
    #[error("too many series: {count} > {max}")]
    TooManySeries { count: usize, max: usize },
}

/// Errors raised while building a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    /// The start number is greater than the end number
    #[error("start {start:04} is greater than end {end:04}")]
    Range { start: u32, end: u32 },
}

/// Errors raised by the TXT to CSV conversion flow.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("the text file is empty")]
    EmptyInput,
    #[error("no valid records found")]
    NoRecords,
    #[error("the text file is not valid UTF-8")]
    InvalidEncoding,
    #[error("file must have a .txt extension")]
    NotText,
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConversionError {
    /// Whether the user can simply upload another file
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConversionError::EmptyInput
                | ConversionError::NoRecords
                | ConversionError::InvalidEncoding
                | ConversionError::NotText
                | ConversionError::TooLarge { .. }
        )
    }
}

/// Document delivery failure after all retry attempts.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: teloxide::RequestError,
    },
}
