use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by mark load functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while loading or addressing marks.
#[derive(Debug, Error)]
pub enum MarksError {
    /// `get_mark` was asked for a column the mark file does not describe.
    #[error("column index {column_index} out of range, marks describe {columns_num} columns")]
    ColumnOutOfRange {
        /// Requested column.
        column_index: usize,
        /// Columns per mark row.
        columns_num: usize,
    },
    /// The load function, direct or through the cache, produced no marks.
    #[error("failed to load marks: {}", path.display())]
    LoadFailed {
        /// Mark file that could not be loaded.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// Loaded marks describe a different number of columns than requested.
    #[error("marks in {} describe {actual} columns, expected {expected}", path.display())]
    ColumnsMismatch {
        /// Mark file.
        path: PathBuf,
        /// Columns the loader was configured with.
        expected: usize,
        /// Columns in the loaded array.
        actual: usize,
    },
    /// A flat mark array whose length is not a multiple of the column count.
    #[error("mark array of {len} entries is not a multiple of {columns_num} columns")]
    InvalidMarkArray {
        /// Number of marks.
        len: usize,
        /// Columns per mark row.
        columns_num: usize,
    },
    /// A mark file whose size is not a whole number of marks.
    #[error("mark file {} has {len} bytes, not a whole number of marks", path.display())]
    TruncatedFile {
        /// Mark file.
        path: PathBuf,
        /// File size.
        len: u64,
    },
    /// I/O failure reading or writing a mark file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
