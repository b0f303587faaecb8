use arrow::error::ArrowError;
use thiserror::Error;

/// Errors raised while resolving or applying a sort description.
#[derive(Debug, Error)]
pub enum SortError {
    /// A key names a field that the batch schema does not have.
    #[error("sort column `{name}` not found in block")]
    UnknownColumn {
        /// Requested field name.
        name: String,
    },
    /// A key addresses a column position past the end of the batch.
    #[error("sort column index {0} out of bounds for block with {1} columns")]
    ColumnOutOfBounds(usize, usize),
    /// The operation compares without collation and refuses collated keys.
    #[error("collations are not supported by {operation}")]
    CollationUnsupported {
        /// Operation that rejected the description.
        operation: &'static str,
    },
    /// A collation was attached to a column that cannot honour it.
    #[error("collations can be specified only for string columns, got `{column}`")]
    CollationOnNonString {
        /// Offending column.
        column: String,
    },
    /// A permutation does not match the row count of the batch it reorders.
    #[error("permutation has {actual} rows, block has {expected}")]
    PermutationLength {
        /// Rows in the batch.
        expected: usize,
        /// Entries in the permutation.
        actual: usize,
    },
    /// The block has more rows than a `u32` permutation can address.
    #[error("block has {rows} rows, more than a u32 permutation can address")]
    TooManyRows {
        /// Rows in the block.
        rows: usize,
    },
    /// Arrow kernel failure.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}
