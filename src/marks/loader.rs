use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::Level;

use super::{
    cache::MarkCache,
    error::{BoxError, MarksError},
    file::read_marks_file,
    mark::{MarkInCompressedFile, MarksInCompressedFile},
};
use crate::{logging::granule_log, option::MarksLoaderOptions};

/// Reads and parses one mark file.
pub type LoadFunc = Box<dyn FnMut() -> Result<MarksInCompressedFile, BoxError> + Send>;

/// Lazily loads the marks of one index file and serves point lookups.
///
/// The first lookup resolves the marks, either directly through the load
/// function or through the shared [`MarkCache`], and the loader keeps the
/// array for the rest of its life. A loader belongs to a single reading
/// context; readers of the same file each own a loader and rely on the cache
/// to share the underlying load.
pub struct MarksLoader {
    mark_cache: Option<Arc<MarkCache>>,
    mrk_path: PathBuf,
    load_func: LoadFunc,
    options: MarksLoaderOptions,
    marks: Option<Arc<MarksInCompressedFile>>,
}

impl MarksLoader {
    /// Loader for `mrk_path` that reads through `load_func`.
    ///
    /// Passing `None` for `mark_cache` disables caching entirely.
    pub fn new(
        mark_cache: Option<Arc<MarkCache>>,
        mrk_path: impl Into<PathBuf>,
        load_func: LoadFunc,
        options: MarksLoaderOptions,
    ) -> Self {
        Self {
            mark_cache,
            mrk_path: mrk_path.into(),
            load_func,
            options,
            marks: None,
        }
    }

    /// Loader that reads the fixed-width mark file at `mrk_path`.
    pub fn from_file(
        mark_cache: Option<Arc<MarkCache>>,
        mrk_path: impl Into<PathBuf>,
        options: MarksLoaderOptions,
    ) -> Self {
        let mrk_path = mrk_path.into();
        let file_path = mrk_path.clone();
        let columns_num = options.columns_num;
        let load_func: LoadFunc =
            Box::new(move || read_marks_file(&file_path, columns_num).map_err(BoxError::from));
        Self::new(mark_cache, mrk_path, load_func, options)
    }

    /// Mark of `column_index` at mark row `mark_index`.
    ///
    /// Loads the marks on first use. `mark_index` is not range checked beyond
    /// the array bounds; reading past the last mark row is a caller bug.
    pub fn get_mark(
        &mut self,
        mark_index: usize,
        column_index: usize,
    ) -> Result<MarkInCompressedFile, MarksError> {
        let columns_num = self.options.columns_num;
        let marks = self.load_marks()?;
        if column_index >= columns_num {
            return Err(MarksError::ColumnOutOfRange {
                column_index,
                columns_num,
            });
        }
        Ok(marks.get(mark_index, column_index))
    }

    /// Number of mark rows, loading the marks if needed.
    pub fn marks_count(&mut self) -> Result<usize, MarksError> {
        Ok(self.load_marks()?.marks_count())
    }

    /// Whether the marks have been resolved yet.
    pub fn is_loaded(&self) -> bool {
        self.marks.is_some()
    }

    /// Mark file this loader serves.
    pub fn path(&self) -> &Path {
        &self.mrk_path
    }

    /// Loader options.
    pub fn options(&self) -> &MarksLoaderOptions {
        &self.options
    }

    fn load_marks(&mut self) -> Result<&MarksInCompressedFile, MarksError> {
        let marks = match self.marks.take() {
            Some(marks) => marks,
            None => self.load()?,
        };
        Ok(self.marks.insert(marks))
    }

    fn load(&mut self) -> Result<Arc<MarksInCompressedFile>, MarksError> {
        let path = self.mrk_path.as_path();
        let load_func = &mut self.load_func;

        let (marks, source) = match &self.mark_cache {
            None => (Arc::new(load_direct(load_func, path)?), "direct"),
            Some(cache) => {
                let key = cache.hash(path);
                if self.options.save_marks_in_cache {
                    let marks =
                        cache.get_or_set(key, || load_direct(load_func, path).map(Arc::new))?;
                    (marks, "cache")
                } else {
                    match cache.get(&key) {
                        Some(marks) => (marks, "cache"),
                        None => (
                            Arc::new(load_direct(load_func, path)?),
                            "cache_read_through",
                        ),
                    }
                }
            }
        };

        if marks.columns_num() != self.options.columns_num {
            return Err(MarksError::ColumnsMismatch {
                path: self.mrk_path.clone(),
                expected: self.options.columns_num,
                actual: marks.columns_num(),
            });
        }

        granule_log!(
            Level::Debug,
            "marks_load",
            "path={} source={} marks={}",
            self.mrk_path.display(),
            source,
            marks.marks_count()
        );
        Ok(marks)
    }
}

fn load_direct(load_func: &mut LoadFunc, path: &Path) -> Result<MarksInCompressedFile, MarksError> {
    (*load_func)().map_err(|source| MarksError::LoadFailed {
        path: path.to_path_buf(),
        source,
    })
}

impl fmt::Debug for MarksLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarksLoader")
            .field("mrk_path", &self.mrk_path)
            .field("cached", &self.mark_cache.is_some())
            .field("options", &self.options)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
