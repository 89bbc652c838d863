//! Error types raised while reading a CSV source and inferring column types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferError {
    /// The input path could not be opened.
    #[error("Unable to read input {path:?}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV parser or the text decoder rejected a record.
    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },

    /// The input did not contain a header record.
    #[error("Input has no header row")]
    EmptyInput,

    /// A data row has a different number of fields than the header.
    #[error("Record {record} has {found} field(s) but the header declares {expected}")]
    RowWidthMismatch {
        record: usize,
        expected: usize,
        found: usize,
    },
}
