//! Per-column comparison primitive used by the block comparator.
//!
//! The sort engine never looks at column values itself; it asks a
//! [`CompareAt`] implementation to order two row positions of one column.
//! [`ArrowSortColumn`] is the implementation for Arrow arrays, and plain
//! `[Option<T>]` slices implement it for in-memory callers and tests.

use std::{cmp::Ordering, fmt};

use arrow::{
    array::{make_comparator, Array, ArrayRef, AsArray, DynComparator},
    compute::SortOptions,
    datatypes::DataType,
};

use super::{description::NullsDirection, error::SortError};

/// Locale-aware string ordering attached to a sort key.
pub trait Collator: Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &str;

    /// Compare two strings under this collation.
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

/// Case-insensitive collation: compares Unicode lowercase forms and breaks
/// ties with the raw byte order so the result stays a total order.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseInsensitiveCollator;

impl Collator for CaseInsensitiveCollator {
    fn name(&self) -> &str {
        "case_insensitive"
    }

    fn compare(&self, left: &str, right: &str) -> Ordering {
        let folded_left = left.chars().flat_map(char::to_lowercase);
        let folded_right = right.chars().flat_map(char::to_lowercase);
        folded_left.cmp(folded_right).then_with(|| left.cmp(right))
    }
}

/// Compare-at capability supplied by the column storage layer.
///
/// Implementations must define a total order over the rows of the column and
/// must not have side effects observable between calls.
pub trait CompareAt {
    /// Number of rows in the column.
    fn len(&self) -> usize;

    /// Whether the column has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Order row `a` relative to row `b`, ranking nulls according to `nulls`.
    fn compare_at(&self, a: usize, b: usize, nulls: NullsDirection) -> Ordering;

    /// Whether [`CompareAt::compare_at_with_collation`] honours the collator.
    fn supports_collation(&self) -> bool {
        false
    }

    /// Collated comparison. Only called when [`CompareAt::supports_collation`]
    /// returned `true` during column resolution.
    fn compare_at_with_collation(
        &self,
        a: usize,
        b: usize,
        nulls: NullsDirection,
        _collator: &dyn Collator,
    ) -> Ordering {
        self.compare_at(a, b, nulls)
    }
}

impl<C: CompareAt + ?Sized> CompareAt for &C {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn compare_at(&self, a: usize, b: usize, nulls: NullsDirection) -> Ordering {
        (**self).compare_at(a, b, nulls)
    }

    fn supports_collation(&self) -> bool {
        (**self).supports_collation()
    }

    fn compare_at_with_collation(
        &self,
        a: usize,
        b: usize,
        nulls: NullsDirection,
        collator: &dyn Collator,
    ) -> Ordering {
        (**self).compare_at_with_collation(a, b, nulls, collator)
    }
}

impl<T: Ord> CompareAt for [Option<T>] {
    fn len(&self) -> usize {
        <[Option<T>]>::len(self)
    }

    fn compare_at(&self, a: usize, b: usize, nulls: NullsDirection) -> Ordering {
        match (&self[a], &self[b]) {
            (Some(left), Some(right)) => left.cmp(right),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => null_rank(nulls),
            (Some(_), None) => null_rank(nulls).reverse(),
        }
    }
}

fn null_rank(nulls: NullsDirection) -> Ordering {
    match nulls {
        NullsDirection::Less => Ordering::Less,
        NullsDirection::Greater => Ordering::Greater,
    }
}

/// [`CompareAt`] over an Arrow array.
///
/// Both null rankings are prepared up front so that comparisons never
/// dispatch on the data type.
pub struct ArrowSortColumn {
    array: ArrayRef,
    nulls_less: DynComparator,
    nulls_greater: DynComparator,
}

impl ArrowSortColumn {
    /// Prepare comparators for `array`.
    ///
    /// Fails when Arrow cannot order values of the array's data type.
    pub fn try_new(array: ArrayRef) -> Result<Self, SortError> {
        let nulls_less = ascending_comparator(&array, true)?;
        let nulls_greater = ascending_comparator(&array, false)?;
        Ok(Self {
            array,
            nulls_less,
            nulls_greater,
        })
    }

    /// Underlying array.
    pub fn array(&self) -> &ArrayRef {
        &self.array
    }

    fn collated_strings(
        &self,
        a: usize,
        b: usize,
        collator: &dyn Collator,
    ) -> Option<Ordering> {
        match self.array.data_type() {
            DataType::Utf8 => {
                let strings = self.array.as_string::<i32>();
                Some(collator.compare(strings.value(a), strings.value(b)))
            }
            DataType::LargeUtf8 => {
                let strings = self.array.as_string::<i64>();
                Some(collator.compare(strings.value(a), strings.value(b)))
            }
            _ => None,
        }
    }
}

fn ascending_comparator(array: &ArrayRef, nulls_first: bool) -> Result<DynComparator, SortError> {
    let options = SortOptions {
        descending: false,
        nulls_first,
    };
    Ok(make_comparator(array.as_ref(), array.as_ref(), options)?)
}

impl fmt::Debug for ArrowSortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrowSortColumn")
            .field("data_type", self.array.data_type())
            .field("len", &self.array.len())
            .finish()
    }
}

impl CompareAt for ArrowSortColumn {
    fn len(&self) -> usize {
        self.array.len()
    }

    fn compare_at(&self, a: usize, b: usize, nulls: NullsDirection) -> Ordering {
        match nulls {
            NullsDirection::Less => (self.nulls_less)(a, b),
            NullsDirection::Greater => (self.nulls_greater)(a, b),
        }
    }

    fn supports_collation(&self) -> bool {
        matches!(self.array.data_type(), DataType::Utf8 | DataType::LargeUtf8)
    }

    fn compare_at_with_collation(
        &self,
        a: usize,
        b: usize,
        nulls: NullsDirection,
        collator: &dyn Collator,
    ) -> Ordering {
        match (self.array.is_null(a), self.array.is_null(b)) {
            (true, true) => Ordering::Equal,
            (true, false) => null_rank(nulls),
            (false, true) => null_rank(nulls).reverse(),
            (false, false) => self
                .collated_strings(a, b, collator)
                .unwrap_or_else(|| self.compare_at(a, b, nulls)),
        }
    }
}
