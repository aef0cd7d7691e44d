//! Error types for bin-range-tree.
//!
//! Lookup misses and rejected mutations (invalid key, duplicate key, absent
//! key, non-leaf delete) are reported through `bool`/`Option` returns. Only
//! malformed input ranges, record parse failures and stream I/O failures
//! surface as [`Error`].

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Range boundaries that cannot describe a numeric interval
    #[error("malformed range [{low}, {high}]: {reason}")]
    MalformedRange {
        low: String,
        high: String,
        reason: &'static str,
    },

    /// Sampling stride that is not a power of ten
    #[error("sampling stride must be a power of ten")]
    InvalidStride,

    /// A detail line that could not be parsed into a record
    #[error("failed to parse record on line {line}: {source}")]
    Parse {
        /// 1-based line number in the input stream
        line: usize,
        #[source]
        source: ParseError,
    },

    /// Reading the record stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(low: &str, high: &str, reason: &'static str) -> Self {
        Error::MalformedRange {
            low: low.to_owned(),
            high: high.to_owned(),
            reason,
        }
    }
}

/// Failure to turn one fixed-width line into a range record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("record is empty")]
    Empty,

    #[error("expected a detail record, found record type {0:?}")]
    NotDetail(char),

    #[error("{field} is truncated: expected {expected} characters at offset {offset}")]
    Truncated {
        field: &'static str,
        offset: usize,
        expected: usize,
    },

    #[error("{field} is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("low BIN {low:?} and high BIN {high:?} differ in length")]
    LengthMismatch { low: String, high: String },

    #[error("low BIN {low:?} sorts after high BIN {high:?}")]
    Inverted { low: String, high: String },
}
