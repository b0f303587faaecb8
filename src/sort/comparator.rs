use std::{cmp::Ordering, sync::Arc};

use super::{
    column::{Collator, CompareAt},
    description::{NullsDirection, SortColumnDescription, SortDirection},
    error::SortError,
};

/// A sort key bound to the column it reads.
pub struct ResolvedSortColumn<C> {
    column: C,
    direction: SortDirection,
    nulls: NullsDirection,
    collator: Option<Arc<dyn Collator>>,
}

impl<C: CompareAt> ResolvedSortColumn<C> {
    /// Bind `description` to `column`.
    ///
    /// `name` is only used to report a collation on a column that cannot
    /// honour one.
    pub fn new(
        column: C,
        description: &SortColumnDescription,
        name: &str,
    ) -> Result<Self, SortError> {
        if description.collator.is_some() && !column.supports_collation() {
            return Err(SortError::CollationOnNonString {
                column: name.to_string(),
            });
        }
        Ok(Self {
            column,
            direction: description.direction,
            nulls: description.nulls_direction(),
            collator: description.collator.clone(),
        })
    }

    /// The bound column.
    pub fn column(&self) -> &C {
        &self.column
    }

    /// Key direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Null ranking handed to the column primitive.
    pub fn nulls_direction(&self) -> NullsDirection {
        self.nulls
    }

    /// Attached collator, if any.
    pub fn collator(&self) -> Option<&dyn Collator> {
        self.collator.as_deref()
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let res = match &self.collator {
            Some(collator) => {
                self.column
                    .compare_at_with_collation(a, b, self.nulls, collator.as_ref())
            }
            None => self.column.compare_at(a, b, self.nulls),
        };
        match self.direction {
            SortDirection::Ascending => res,
            SortDirection::Descending => res.reverse(),
        }
    }
}

/// Sort keys resolved against one block, computed once per sort call.
pub struct ResolvedSortColumns<C> {
    columns: Vec<ResolvedSortColumn<C>>,
}

impl<C> Default for ResolvedSortColumns<C> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
        }
    }
}

impl<C: CompareAt> ResolvedSortColumns<C> {
    /// Empty key list; every row compares equal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lower-priority key.
    pub fn push(&mut self, column: ResolvedSortColumn<C>) {
        self.columns.push(column);
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether any key compares through a collator.
    pub fn has_collation(&self) -> bool {
        self.columns.iter().any(|c| c.collator.is_some())
    }

    /// Keys in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedSortColumn<C>> {
        self.columns.iter()
    }

    /// Comparator over these keys.
    pub fn less(&self) -> SortingLess<'_, C> {
        SortingLess {
            columns: &self.columns,
        }
    }
}

impl<C: CompareAt> FromIterator<ResolvedSortColumn<C>> for ResolvedSortColumns<C> {
    fn from_iter<I: IntoIterator<Item = ResolvedSortColumn<C>>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Lexicographic row comparator over resolved sort keys.
///
/// Keys are consulted in priority order; the first non-equal key decides.
pub struct SortingLess<'a, C> {
    columns: &'a [ResolvedSortColumn<C>],
}

impl<C> Clone for SortingLess<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for SortingLess<'_, C> {}

impl<C: CompareAt> SortingLess<'_, C> {
    /// Three-way comparison of rows `a` and `b`.
    pub fn compare(&self, a: usize, b: usize) -> Ordering {
        for column in self.columns {
            match column.compare(a, b) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }
        Ordering::Equal
    }

    /// Whether row `a` must precede row `b`.
    pub fn less(&self, a: usize, b: usize) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}
