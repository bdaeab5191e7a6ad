use std::fmt;

/// Errors raised by the sparse matrix layer.
///
/// Kept deliberately small: the matrix itself only ever fails on the
/// square/non-square distinction required by `subtract_identity`. Everything
/// else (out-of-range rows/columns) is a caller bug and is checked with a
/// debug assertion rather than threaded through `Result`, mirroring the
/// unchecked/checked split used throughout the corpus this crate grew out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseError {
    NonSquare { rows: usize, cols: usize },
}

impl fmt::Display for SparseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparseError::NonSquare { rows, cols } => write!(
                f,
                "expected a square matrix, got {} rows and {} columns",
                rows, cols
            ),
        }
    }
}

impl std::error::Error for SparseError {}
