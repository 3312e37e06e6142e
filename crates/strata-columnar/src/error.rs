use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("index {index} out of bounds for length {len}")]
    Index { index: i64, len: usize },

    #[error("unknown column: {0}")]
    Key(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("temporal value {0} is outside the supported calendar range")]
    TemporalOutOfRange(i64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("csv parse error at row {row}: {reason}")]
    Csv { row: u64, reason: String },

    #[error("corrupt input: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Parquet(#[from] ParquetError),
}

/// Coarse classification of an [`Error`], for callers that only care about
/// which family of failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Index,
    Key,
    TypeMismatch,
    LengthMismatch,
    InvalidArgument,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Index { .. } | Error::TemporalOutOfRange(_) => ErrorKind::Index,
            Error::Key(_) => ErrorKind::Key,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Csv { .. }
            | Error::Corrupt(_)
            | Error::Io(_)
            | Error::Arrow(_)
            | Error::Parquet(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn type_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn index(index: impl TryInto<i64>, len: usize) -> Self {
        Error::Index {
            index: index.try_into().unwrap_or(i64::MAX),
            len,
        }
    }
}
