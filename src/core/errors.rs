/// Error types for signature loading and file classification

use std::io;
use std::path::PathBuf;

/// Why a signature line was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("expected 3 ';'-separated fields, found {0}")]
    FieldCount(usize),
    #[error("pattern field is empty")]
    EmptyPattern,
}

/// A line of the signature database could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid signature on line {line_number} ({line:?}): {reason}")]
pub struct SignatureParseError {
    /// 1-based line number within the signature file
    pub line_number: usize,
    /// Line content after quote stripping
    pub line: String,
    pub reason: ParseFailure,
}

/// The signature database could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum SignatureLoadError {
    #[error("failed to read signature file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] SignatureParseError),
}

/// A file could not be opened or fully read for classification
#[derive(Debug, thiserror::Error)]
#[error("failed to read {path}: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}
