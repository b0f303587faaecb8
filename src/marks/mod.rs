//! Lazy, cache-coordinated loading of marks.
//!
//! Marks record where each granule of a column starts inside its compressed
//! file. [`MarksLoader`] resolves the marks of one file on first lookup,
//! optionally through a process-wide [`MarkCache`] that guarantees a single
//! load per file even when many readers open it at once.

pub mod cache;
/// Mark loading errors.
pub mod error;
pub mod file;
/// Per-file marks loader.
pub mod loader;
/// Mark and mark array types.
pub mod mark;
pub mod metrics;

pub use self::{
    cache::{MarkCache, MarkCacheKey},
    error::{BoxError, MarksError},
    file::{read_marks_file, write_marks_file},
    loader::{LoadFunc, MarksLoader},
    mark::{MarkInCompressedFile, MarksInCompressedFile},
    metrics::MarkCacheMetrics,
};
