//! Fixed-width mark files.
//!
//! A mark file is a sequence of 16-byte records, one per `(mark, column)`
//! pair in row-major order. Each record holds two little-endian `u64`s: the
//! offset of the compressed block and the offset inside the decompressed
//! block.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use super::{
    error::MarksError,
    mark::{MarkInCompressedFile, MarksInCompressedFile},
};

/// Bytes per encoded mark.
pub const MARK_SIZE: usize = 16;

/// Read every mark of the file at `path`.
pub fn read_marks_file(
    path: impl AsRef<Path>,
    columns_num: usize,
) -> Result<MarksInCompressedFile, MarksError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len % MARK_SIZE as u64 != 0 {
        return Err(MarksError::TruncatedFile {
            path: path.to_path_buf(),
            len,
        });
    }

    let count = (len / MARK_SIZE as u64) as usize;
    let mut reader = BufReader::new(file);
    let mut marks = Vec::with_capacity(count);
    let mut record = [0u8; MARK_SIZE];
    for _ in 0..count {
        reader.read_exact(&mut record)?;
        marks.push(decode_mark(&record));
    }
    MarksInCompressedFile::new(marks, columns_num)
}

/// Write `marks` to `path` in the layout [`read_marks_file`] expects.
pub fn write_marks_file(
    path: impl AsRef<Path>,
    marks: &MarksInCompressedFile,
) -> Result<(), MarksError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for mark in marks.as_slice() {
        writer.write_all(&encode_mark(mark))?;
    }
    writer.flush()?;
    Ok(())
}

fn encode_mark(mark: &MarkInCompressedFile) -> [u8; MARK_SIZE] {
    let mut record = [0u8; MARK_SIZE];
    record[..8].copy_from_slice(&mark.offset_in_compressed_file.to_le_bytes());
    record[8..].copy_from_slice(&mark.offset_in_decompressed_block.to_le_bytes());
    record
}

fn decode_mark(record: &[u8; MARK_SIZE]) -> MarkInCompressedFile {
    let mut compressed = [0u8; 8];
    let mut decompressed = [0u8; 8];
    compressed.copy_from_slice(&record[..8]);
    decompressed.copy_from_slice(&record[8..]);
    MarkInCompressedFile::new(
        u64::from_le_bytes(compressed),
        u64::from_le_bytes(decompressed),
    )
}
