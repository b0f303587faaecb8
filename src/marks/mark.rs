use super::error::MarksError;

/// Position of a granule inside a compressed column file.
///
/// `offset_in_compressed_file` locates the compressed block, and
/// `offset_in_decompressed_block` the first row of the granule once that
/// block is decompressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MarkInCompressedFile {
    /// Byte offset of the compressed block in the column file.
    pub offset_in_compressed_file: u64,
    /// Byte offset of the granule inside the decompressed block.
    pub offset_in_decompressed_block: u64,
}

impl MarkInCompressedFile {
    /// Build a mark from its two offsets.
    pub const fn new(offset_in_compressed_file: u64, offset_in_decompressed_block: u64) -> Self {
        Self {
            offset_in_compressed_file,
            offset_in_decompressed_block,
        }
    }
}

/// All marks of one index file.
///
/// Marks are stored row-major: the entry for `(mark_index, column_index)`
/// lives at `mark_index * columns_num + column_index`, and the length is
/// always a multiple of `columns_num`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarksInCompressedFile {
    marks: Vec<MarkInCompressedFile>,
    columns_num: usize,
}

impl MarksInCompressedFile {
    /// Wrap a flat mark vector describing `columns_num` columns per mark row.
    pub fn new(marks: Vec<MarkInCompressedFile>, columns_num: usize) -> Result<Self, MarksError> {
        if columns_num == 0 || marks.len() % columns_num != 0 {
            return Err(MarksError::InvalidMarkArray {
                len: marks.len(),
                columns_num,
            });
        }
        Ok(Self { marks, columns_num })
    }

    /// Columns described by each mark row.
    pub fn columns_num(&self) -> usize {
        self.columns_num
    }

    /// Number of mark rows (granule boundaries).
    pub fn marks_count(&self) -> usize {
        self.marks.len() / self.columns_num
    }

    /// Total number of stored marks.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Whether the file has no marks.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Mark for `column_index` at mark row `mark_index`.
    ///
    /// `column_index` must be below [`columns_num`](Self::columns_num) and
    /// `mark_index` below [`marks_count`](Self::marks_count); both are caller
    /// contracts and out-of-range positions panic.
    pub fn get(&self, mark_index: usize, column_index: usize) -> MarkInCompressedFile {
        debug_assert!(column_index < self.columns_num);
        self.marks[mark_index * self.columns_num + column_index]
    }

    /// Flat view of every mark.
    pub fn as_slice(&self) -> &[MarkInCompressedFile] {
        &self.marks
    }

    /// Approximate heap footprint, for callers doing cache accounting.
    pub fn size_in_bytes(&self) -> usize {
        self.marks.capacity() * std::mem::size_of::<MarkInCompressedFile>()
    }
}
