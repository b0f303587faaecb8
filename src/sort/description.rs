use std::{fmt, sync::Arc};

use super::column::Collator;

/// Direction of a single sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest values first.
    #[default]
    Ascending,
    /// Largest values first.
    Descending,
}

impl SortDirection {
    /// Sign applied to the column comparison result.
    pub fn sign(self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Where nulls land in the sorted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullsOrder {
    /// Nulls precede every value.
    First,
    /// Nulls follow every value.
    #[default]
    Last,
}

/// How the column primitive ranks nulls before the direction sign is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsDirection {
    /// Nulls compare less than every value.
    Less,
    /// Nulls compare greater than every value.
    Greater,
}

impl NullsDirection {
    /// Primitive-level null ranking that puts nulls at `order` once the
    /// comparison is multiplied by `direction`.
    pub fn for_output(direction: SortDirection, order: NullsOrder) -> Self {
        match (direction, order) {
            (SortDirection::Ascending, NullsOrder::Last)
            | (SortDirection::Descending, NullsOrder::First) => NullsDirection::Greater,
            (SortDirection::Ascending, NullsOrder::First)
            | (SortDirection::Descending, NullsOrder::Last) => NullsDirection::Less,
        }
    }
}

/// Column a sort key refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortColumnRef {
    /// Field name in the batch schema.
    Name(String),
    /// Zero-based column position.
    Index(usize),
}

impl fmt::Display for SortColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortColumnRef::Name(name) => f.write_str(name),
            SortColumnRef::Index(idx) => write!(f, "#{idx}"),
        }
    }
}

impl From<&str> for SortColumnRef {
    fn from(name: &str) -> Self {
        SortColumnRef::Name(name.to_string())
    }
}

impl From<String> for SortColumnRef {
    fn from(name: String) -> Self {
        SortColumnRef::Name(name)
    }
}

impl From<usize> for SortColumnRef {
    fn from(idx: usize) -> Self {
        SortColumnRef::Index(idx)
    }
}

/// One sort key: column, direction, null placement and an optional collation.
#[derive(Clone)]
pub struct SortColumnDescription {
    /// Column the key reads.
    pub column: SortColumnRef,
    /// Key direction.
    pub direction: SortDirection,
    /// Placement of nulls in the output.
    pub nulls_order: NullsOrder,
    /// Locale-aware comparison for string keys.
    pub collator: Option<Arc<dyn Collator>>,
}

impl SortColumnDescription {
    /// Ascending key with nulls last.
    pub fn asc(column: impl Into<SortColumnRef>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
            nulls_order: NullsOrder::Last,
            collator: None,
        }
    }

    /// Descending key with nulls last.
    pub fn desc(column: impl Into<SortColumnRef>) -> Self {
        Self {
            direction: SortDirection::Descending,
            ..Self::asc(column)
        }
    }

    /// Override the null placement.
    pub fn nulls(self, nulls_order: NullsOrder) -> Self {
        Self {
            nulls_order,
            ..self
        }
    }

    /// Attach a collator; only string columns accept one.
    pub fn with_collator(self, collator: Arc<dyn Collator>) -> Self {
        Self {
            collator: Some(collator),
            ..self
        }
    }

    /// Null ranking to hand to the column primitive.
    pub fn nulls_direction(&self) -> NullsDirection {
        NullsDirection::for_output(self.direction, self.nulls_order)
    }
}

impl fmt::Debug for SortColumnDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortColumnDescription")
            .field("column", &self.column)
            .field("direction", &self.direction)
            .field("nulls_order", &self.nulls_order)
            .field("collator", &self.collator.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// Ordered list of sort keys; the first entry is the primary key.
pub type SortDescription = Vec<SortColumnDescription>;

/// Whether any key in `description` requests a collation.
pub(crate) fn has_collation(description: &[SortColumnDescription]) -> bool {
    description.iter().any(|d| d.collator.is_some())
}
