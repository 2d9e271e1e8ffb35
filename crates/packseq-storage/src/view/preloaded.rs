//! Preloaded strategy: unpack everything at open

use super::{RandomAccess, collect_indices};
use crate::cache::CacheStats;
use crate::packed_file::PackedFile;
use crate::slice::{SliceArgs, resolve_index};
use crate::store::PackedStore;
use crate::{Result, StorageError};
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Fully unpacked in-memory view.
///
/// Holds one byte per symbol, four times the packed size. The backing file
/// is released as soon as the sequence has been unpacked.
#[derive(Debug)]
pub struct PreloadedView {
    symbols: Vec<u8>,
    element_count: usize,
    closed: bool,
    stats: CacheStats,
}

impl PreloadedView {
    /// Open `path` and unpack all `element_count` symbols.
    pub fn open(store: &dyn PackedStore, path: impl AsRef<Path>, element_count: usize) -> Result<Self> {
        let mut file = PackedFile::open_readonly(store, path.as_ref(), element_count)?;
        let symbols = file.read_all()?;
        file.close();

        info!(
            "Preloaded {} symbols from {}",
            element_count,
            path.as_ref().display()
        );
        Ok(Self::from_symbols(symbols))
    }

    /// View over symbols that are already unpacked.
    pub fn from_symbols(symbols: Vec<u8>) -> Self {
        let mut stats = CacheStats::default();
        stats.record_refill(symbols.len());
        Self {
            element_count: symbols.len(),
            symbols,
            closed: false,
            stats,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StorageError::ClosedHandle);
        }
        Ok(())
    }
}

impl RandomAccess for PreloadedView {
    fn get(&mut self, index: i64) -> Result<u8> {
        self.ensure_open()?;
        let index = resolve_index(index, self.element_count)?;
        self.stats.record_hit();
        Ok(self.symbols[index])
    }

    fn get_range(&mut self, slice: SliceArgs) -> Result<Cow<'_, [u8]>> {
        self.ensure_open()?;
        let resolved = slice.resolve(self.element_count)?;
        self.stats.record_hit();

        if resolved.is_contiguous() {
            return Ok(Cow::Borrowed(&self.symbols[resolved.bounds()]));
        }

        let symbols = &self.symbols;
        collect_indices(&resolved, |index| Ok(symbols[index])).map(Cow::Owned)
    }

    fn len(&self) -> usize {
        self.element_count
    }

    fn close(&mut self) {
        self.closed = true;
        self.symbols = Vec::new();
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}
