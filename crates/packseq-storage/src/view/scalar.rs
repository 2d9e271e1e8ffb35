//! Scalar strategy: one byte read per symbol, nothing cached
//!
//! The slowest strategy and the simplest to trust; the others are checked
//! against it.

use super::{RandomAccess, collect_indices};
use crate::cache::CacheStats;
use crate::packed_file::PackedFile;
use crate::slice::{SliceArgs, resolve_index};
use crate::store::PackedStore;
use crate::{Result, StorageError};
use std::borrow::Cow;
use std::path::Path;

/// Uncached per-symbol view.
#[derive(Debug)]
pub struct ScalarView {
    file: PackedFile,
    stats: CacheStats,
}

impl ScalarView {
    /// Open `path` holding `element_count` symbols.
    pub fn open(store: &dyn PackedStore, path: impl AsRef<Path>, element_count: usize) -> Result<Self> {
        Ok(Self {
            file: PackedFile::open_readonly(store, path, element_count)?,
            stats: CacheStats::default(),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.file.is_closed() {
            return Err(StorageError::ClosedHandle);
        }
        Ok(())
    }

    fn read(&mut self, index: usize) -> Result<u8> {
        let symbol = self.file.symbol_at(index)?;
        self.stats.record_miss();
        self.stats.record_unpacked(1);
        Ok(symbol)
    }
}

impl RandomAccess for ScalarView {
    fn get(&mut self, index: i64) -> Result<u8> {
        self.ensure_open()?;
        let index = resolve_index(index, self.file.element_count())?;
        self.read(index)
    }

    fn get_range(&mut self, slice: SliceArgs) -> Result<Cow<'_, [u8]>> {
        self.ensure_open()?;
        let resolved = slice.resolve(self.file.element_count())?;
        collect_indices(&resolved, |index| self.read(index)).map(Cow::Owned)
    }

    fn len(&self) -> usize {
        self.file.element_count()
    }

    fn close(&mut self) {
        self.file.close();
    }

    fn is_closed(&self) -> bool {
        self.file.is_closed()
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}
