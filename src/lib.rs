#![deny(missing_docs)]
//! Block sorting and mark loading for a columnar table format.
//!
//! Two primitives sit on the read and write paths of the table format:
//!
//! * [`sort`] orders Arrow record batches by a multi-key sort description,
//!   with full, partial, stable and permutation-only variants plus a cheap
//!   "already sorted" check.
//! * [`marks`] loads the marks of an index file lazily, sharing loads across
//!   readers through a process-wide [`MarkCache`].

mod logging;

/// Options for mark loading.
pub mod option;

/// Sorting of in-memory blocks.
pub mod sort;

/// Mark arrays, the shared mark cache and the per-file loader.
pub mod marks;


pub use arrow;

pub use crate::{
    marks::{MarkCache, MarkInCompressedFile, MarksError, MarksInCompressedFile, MarksLoader},
    option::MarksLoaderOptions,
    sort::{
        is_already_sorted, sort_batch, stable_get_permutation, stable_sort_batch,
        SortColumnDescription, SortDescription, SortError,
    },
};
