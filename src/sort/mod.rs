//! Ordering of in-memory blocks by a multi-key sort description.
//!
//! A block is an Arrow [`RecordBatch`]. Every operation first resolves the
//! description against the block once ([`resolve_sort_columns`]) and then
//! compares rows through [`SortingLess`], so no name lookup happens per
//! comparison.
//!
//! * [`sort_batch`] sorts fully, or partially when given a `limit`; it is not
//!   stable.
//! * [`stable_sort_batch`] and [`stable_get_permutation`] keep rows with equal
//!   keys in insertion order. Collapsing merges rely on that order to decide
//!   which rows of a duplicate-key group survive.
//! * [`is_already_sorted`] lets writers skip sorting work altogether.
//!
//! The permutation builders ([`sort_permutation`], [`stable_permutation`],
//! [`is_sorted_by`]) are generic over [`CompareAt`] and work for any column
//! representation.

pub mod column;
/// Row comparator over resolved sort keys.
pub mod comparator;
/// Sort key descriptors.
pub mod description;
/// Sort errors.
pub mod error;

use arrow::{
    array::UInt32Array,
    compute::{sort_to_indices, take_record_batch, SortOptions},
    record_batch::RecordBatch,
};
use log::Level;

pub use self::{
    column::{ArrowSortColumn, CaseInsensitiveCollator, Collator, CompareAt},
    comparator::{ResolvedSortColumn, ResolvedSortColumns, SortingLess},
    description::{
        NullsDirection, NullsOrder, SortColumnDescription, SortColumnRef, SortDescription,
        SortDirection,
    },
    error::SortError,
};
use self::description::has_collation;
use crate::logging::granule_log;

/// Row reordering: entry `i` is the source position of output row `i`.
pub type Permutation = Vec<u32>;

/// Rows sampled by [`is_sorted_by`] before the full scan.
const NUM_ROWS_TO_TRY: usize = 10;

/// Resolve every key of `description` against `batch`.
pub fn resolve_sort_columns(
    batch: &RecordBatch,
    description: &[SortColumnDescription],
) -> Result<ResolvedSortColumns<ArrowSortColumn>, SortError> {
    description
        .iter()
        .map(|desc| {
            let position = column_position(batch, &desc.column)?;
            let column = ArrowSortColumn::try_new(batch.column(position).clone())?;
            ResolvedSortColumn::new(column, desc, &desc.column.to_string())
        })
        .collect()
}

fn column_position(batch: &RecordBatch, column: &SortColumnRef) -> Result<usize, SortError> {
    match column {
        SortColumnRef::Name(name) => {
            batch
                .schema()
                .index_of(name)
                .map_err(|_| SortError::UnknownColumn { name: name.clone() })
        }
        SortColumnRef::Index(idx) => {
            if *idx < batch.num_columns() {
                Ok(*idx)
            } else {
                Err(SortError::ColumnOutOfBounds(*idx, batch.num_columns()))
            }
        }
    }
}

fn reject_collation(
    description: &[SortColumnDescription],
    operation: &'static str,
) -> Result<(), SortError> {
    if has_collation(description) {
        return Err(SortError::CollationUnsupported { operation });
    }
    Ok(())
}

/// Sort `batch` in place.
///
/// With `limit == 0` (or `limit >= rows`) the whole block is sorted. Otherwise
/// only the first `limit` rows are guaranteed to be the smallest rows in
/// order; the remaining rows are all kept, in unspecified order. Rows with
/// equal keys may be reordered.
pub fn sort_batch(
    batch: &mut RecordBatch,
    description: &[SortColumnDescription],
    limit: usize,
) -> Result<(), SortError> {
    let rows = batch.num_rows();
    if description.is_empty() || rows <= 1 {
        return Ok(());
    }

    check_row_count(rows)?;
    let full = limit == 0 || limit >= rows;
    let indices = match description {
        [single] if full && single.collator.is_none() => {
            let position = column_position(batch, &single.column)?;
            granule_log!(
                Level::Trace,
                "sort_fast_path",
                "rows={} column={}",
                rows,
                single.column
            );
            let options = SortOptions {
                descending: single.direction == SortDirection::Descending,
                nulls_first: single.nulls_order == NullsOrder::First,
            };
            sort_to_indices(batch.column(position), Some(options), None)?
        }
        _ => {
            let columns = resolve_sort_columns(batch, description)?;
            UInt32Array::from(sort_permutation(&columns, rows, limit)?)
        }
    };
    *batch = take_record_batch(batch, &indices)?;
    Ok(())
}

/// Stable full sort of `batch` in place.
///
/// Rows with equal keys keep their relative order. Collated descriptions are
/// rejected before any comparison.
pub fn stable_sort_batch(
    batch: &mut RecordBatch,
    description: &[SortColumnDescription],
) -> Result<(), SortError> {
    reject_collation(description, "stable_sort_batch")?;
    if description.is_empty() || batch.num_rows() <= 1 {
        return Ok(());
    }
    let permutation = stable_get_permutation(batch, description)?;
    *batch = apply_permutation(batch, &permutation)?;
    Ok(())
}

/// Permutation that [`stable_sort_batch`] would apply, leaving `batch` as is.
pub fn stable_get_permutation(
    batch: &RecordBatch,
    description: &[SortColumnDescription],
) -> Result<Permutation, SortError> {
    reject_collation(description, "stable_get_permutation")?;
    let columns = resolve_sort_columns(batch, description)?;
    stable_permutation(&columns, batch.num_rows())
}

/// Whether `batch` is already ordered by `description`.
///
/// Returns `false` as soon as an inversion is seen. Collations are not
/// supported.
pub fn is_already_sorted(
    batch: &RecordBatch,
    description: &[SortColumnDescription],
) -> Result<bool, SortError> {
    reject_collation(description, "is_already_sorted")?;
    if description.is_empty() || batch.num_rows() <= 1 {
        return Ok(true);
    }
    let columns = resolve_sort_columns(batch, description)?;
    Ok(is_sorted_by(&columns, batch.num_rows()))
}

/// Reorder every column of `batch` by `permutation`.
///
/// Used to move several related blocks in lockstep with one computed order.
pub fn apply_permutation(
    batch: &RecordBatch,
    permutation: &[u32],
) -> Result<RecordBatch, SortError> {
    check_row_count(batch.num_rows())?;
    if permutation.len() != batch.num_rows() {
        return Err(SortError::PermutationLength {
            expected: batch.num_rows(),
            actual: permutation.len(),
        });
    }
    let indices = UInt32Array::from(permutation.to_vec());
    Ok(take_record_batch(batch, &indices)?)
}

fn check_row_count(rows: usize) -> Result<u32, SortError> {
    u32::try_from(rows).map_err(|_| SortError::TooManyRows { rows })
}

fn identity(rows: usize) -> Result<Permutation, SortError> {
    Ok((0..check_row_count(rows)?).collect())
}

/// Unstable ordering of `rows` rows under `columns`.
///
/// With `0 < limit < rows` only the first `limit` positions are ordered; the
/// rest hold the other rows in unspecified order. Fails with
/// [`SortError::TooManyRows`] when `rows` does not fit a `u32` index.
pub fn sort_permutation<C: CompareAt>(
    columns: &ResolvedSortColumns<C>,
    rows: usize,
    limit: usize,
) -> Result<Permutation, SortError> {
    let mut permutation = identity(rows)?;
    if columns.is_empty() || rows <= 1 {
        return Ok(permutation);
    }

    let less = columns.less();
    let cmp = |a: &u32, b: &u32| less.compare(*a as usize, *b as usize);
    if limit == 0 || limit >= rows {
        permutation.sort_unstable_by(cmp);
    } else {
        permutation.select_nth_unstable_by(limit - 1, cmp);
        permutation[..limit].sort_unstable_by(cmp);
    }
    Ok(permutation)
}

/// Stable ordering of `rows` rows under `columns`.
pub fn stable_permutation<C: CompareAt>(
    columns: &ResolvedSortColumns<C>,
    rows: usize,
) -> Result<Permutation, SortError> {
    let mut permutation = identity(rows)?;
    if columns.is_empty() {
        return Ok(permutation);
    }
    let less = columns.less();
    permutation.sort_by(|a, b| less.compare(*a as usize, *b as usize));
    Ok(permutation)
}

/// Whether rows `0..rows` are non-decreasing under `columns`.
///
/// Large inputs are first probed at a few evenly spaced positions, which
/// catches most unsorted blocks without a full scan.
pub fn is_sorted_by<C: CompareAt>(columns: &ResolvedSortColumns<C>, rows: usize) -> bool {
    if columns.is_empty() || rows <= 1 {
        return true;
    }
    let less = columns.less();

    if rows > NUM_ROWS_TO_TRY * 5 {
        for i in 1..NUM_ROWS_TO_TRY {
            let prev_position = rows * (i - 1) / NUM_ROWS_TO_TRY;
            let curr_position = rows * i / NUM_ROWS_TO_TRY;
            if less.less(curr_position, prev_position) {
                return false;
            }
        }
    }

    (1..rows).all(|i| !less.less(i, i - 1))
}
