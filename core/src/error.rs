use thiserror::Error;

/// The error hierarchy for every fallible core operation.
///
/// Unlike the plain `Result<T, String>` convention used by the graph-analysis
/// corpus this crate is otherwise patterned on, results here need to be
/// matched on *kind* by the dispatcher (to decide whether a failure aborts a
/// command stream or is merely logged and skipped), so a `thiserror`-derived
/// enum replaces the bare string.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no edge from {from} to {to}")]
    NoSuchEdge { from: u32, to: u32 },

    #[error("edge from {from} to {to} already exists")]
    EdgeExists { from: u32, to: u32 },

    #[error("decoration index {index} out of range (have {count})")]
    DecorationOutOfRange { index: usize, count: usize },

    #[error("expected a square matrix, got {rows} rows and {cols} columns")]
    NonSquare { rows: usize, cols: usize },

    #[error("failed to parse {what} at line {line}: {reason}")]
    ParseError {
        what: String,
        line: usize,
        reason: String,
    },

    #[error("failed to open file {path}: {source}")]
    FileOpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("logic error: {0}")]
    LogicError(String),

    #[error("not yet implemented: {0}")]
    NotImplemented(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<sparse::SparseError> for CoreError {
    fn from(e: sparse::SparseError) -> Self {
        match e {
            sparse::SparseError::NonSquare { rows, cols } => CoreError::NonSquare { rows, cols },
        }
    }
}
