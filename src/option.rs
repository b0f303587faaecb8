/// Options controlling how a [`MarksLoader`](crate::marks::MarksLoader) resolves its marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarksLoaderOptions {
    pub(crate) save_marks_in_cache: bool,
    pub(crate) columns_num: usize,
}

impl Default for MarksLoaderOptions {
    fn default() -> Self {
        MarksLoaderOptions {
            save_marks_in_cache: true,
            columns_num: 1,
        }
    }
}

impl MarksLoaderOptions {
    /// Whether a load performed on a cache miss is published to the shared cache.
    ///
    /// Turning this off keeps one-off scans from displacing entries that other
    /// readers depend on; cached entries are still used when present.
    pub fn save_marks_in_cache(self, save_marks_in_cache: bool) -> Self {
        MarksLoaderOptions {
            save_marks_in_cache,
            ..self
        }
    }

    /// Number of columns described by every mark row in the file.
    pub fn columns_num(self, columns_num: usize) -> Self {
        MarksLoaderOptions {
            columns_num,
            ..self
        }
    }

    /// Whether cache misses are published to the shared cache.
    pub fn is_save_marks_in_cache(&self) -> bool {
        self.save_marks_in_cache
    }

    /// Columns per mark row.
    pub fn get_columns_num(&self) -> usize {
        self.columns_num
    }
}
