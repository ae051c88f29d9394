//! Typed errors for the library layer. The CLI wraps these in `anyhow`.

use thiserror::Error;

/// Text that the strict duration parser refuses.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unparseable duration {text:?}: {reason}")]
pub struct ParseError {
    pub text: String,
    pub reason: String,
}

/// Input outside the domain of the compliance rules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("negative {field} hours: {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("non-finite {field} hours")]
    NonFinite { field: &'static str },

    #[error("no {0} dataset loaded")]
    NoDataset(&'static str),

    #[error("unknown worker: {0}")]
    UnknownWorker(String),
}

/// A file that could not be turned into a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    #[error("input is neither valid {legacy} nor valid UTF-8")]
    Undecodable { legacy: String },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("delimiter {0:?} is not a single ASCII character")]
    Delimiter(char),

    #[error("input has no header row")]
    Empty,

    #[error("invalid sector code pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("no {0} column could be resolved")]
    MissingColumn(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
