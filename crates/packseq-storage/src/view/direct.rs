//! Direct strategy: unpack exactly what was asked for
//!
//! Opening only maps the file. A contiguous range that is not already
//! inside the cache window is unpacked from its byte-aligned span and
//! becomes the new window. Single-symbol reads use the window when it holds
//! the index and otherwise extract one symbol from one byte without
//! touching the window.

use super::{RandomAccess, collect_indices};
use crate::cache::{CacheStats, CacheWindow};
use crate::packed_file::PackedFile;
use crate::slice::{SliceArgs, resolve_index};
use crate::store::PackedStore;
use crate::{Result, StorageError};
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

/// Memory-mapped view that unpacks on demand.
#[derive(Debug)]
pub struct DirectView {
    file: PackedFile,
    window: CacheWindow,
    stats: CacheStats,
}

impl DirectView {
    /// Open `path` holding `element_count` symbols.
    pub fn open(store: &dyn PackedStore, path: impl AsRef<Path>, element_count: usize) -> Result<Self> {
        Ok(Self::new(PackedFile::open_readonly(store, path, element_count)?))
    }

    /// Wrap an already opened file.
    pub fn new(file: PackedFile) -> Self {
        Self {
            file,
            window: CacheWindow::default(),
            stats: CacheStats::default(),
        }
    }

    /// Current cache window.
    pub const fn window(&self) -> &CacheWindow {
        &self.window
    }

    fn ensure_open(&self) -> Result<()> {
        if self.file.is_closed() {
            return Err(StorageError::ClosedHandle);
        }
        Ok(())
    }

    fn get_resolved(&mut self, index: usize) -> Result<u8> {
        if let Some(symbol) = self.window.get(index) {
            self.stats.record_hit();
            return Ok(symbol);
        }

        let symbol = self.file.symbol_at(index)?;
        self.stats.record_miss();
        self.stats.record_unpacked(1);
        Ok(symbol)
    }

    fn refill(&mut self, start: usize, stop: usize) -> Result<()> {
        let symbols = self.file.unpack_range(start, stop)?;
        debug!("Direct refill {}..{}", start, stop);
        self.stats.record_refill(symbols.len());
        self.window = CacheWindow::new(start, symbols);
        Ok(())
    }
}

impl RandomAccess for DirectView {
    fn get(&mut self, index: i64) -> Result<u8> {
        self.ensure_open()?;
        let index = resolve_index(index, self.file.element_count())?;
        self.get_resolved(index)
    }

    fn get_range(&mut self, slice: SliceArgs) -> Result<Cow<'_, [u8]>> {
        self.ensure_open()?;
        let resolved = slice.resolve(self.file.element_count())?;

        if !resolved.is_contiguous() {
            return collect_indices(&resolved, |index| self.get_resolved(index)).map(Cow::Owned);
        }

        let bounds = resolved.bounds();
        if bounds.is_empty() {
            return Ok(Cow::Borrowed(&[]));
        }

        if self.window.covers(bounds.start, bounds.end) {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
            self.refill(bounds.start, bounds.end)?;
        }

        Ok(Cow::Borrowed(self.window.slice(bounds.start, bounds.end)))
    }

    fn len(&self) -> usize {
        self.file.element_count()
    }

    fn close(&mut self) {
        self.file.close();
        self.window.clear();
    }

    fn is_closed(&self) -> bool {
        self.file.is_closed()
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn open(symbols: &[u8]) -> DirectView {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", symbols).expect("write");
        DirectView::open(&store, "seq", symbols.len()).expect("open")
    }

    #[test]
    fn test_open_does_no_unpacking() {
        let view = open(&[0, 1, 2, 3, 1, 2, 3, 0]);
        assert!(view.window().is_empty());
        assert_eq!(view.stats(), CacheStats::default());
    }

    #[test]
    fn test_range_becomes_window() {
        let mut view = open(&[0, 1, 2, 3, 1, 2, 3, 0, 2]);

        assert_eq!(&*view.get_range(SliceArgs::range(3, 7)).expect("range"), &[3, 1, 2, 3]);
        assert_eq!(view.window().start(), 3);
        assert_eq!(view.window().stop(), 7);
        assert_eq!(view.stats().refills, 1);

        // Sub-ranges and single symbols inside the window are hits
        assert_eq!(&*view.get_range(SliceArgs::range(4, 6)).expect("range"), &[1, 2]);
        assert_eq!(view.get(6).expect("index"), 3);
        assert_eq!(view.stats().refills, 1);
        assert_eq!(view.stats().hits, 2);
    }

    #[test]
    fn test_single_get_outside_window_keeps_window() {
        let mut view = open(&[0, 1, 2, 3, 1, 2, 3, 0]);
        view.get_range(SliceArgs::range(0, 4)).expect("range");

        assert_eq!(view.get(5).expect("index"), 2);
        assert_eq!(view.window().start(), 0);
        assert_eq!(view.window().stop(), 4);
        assert_eq!(view.stats().misses, 2);
        assert_eq!(view.stats().refills, 1);
    }

    #[test]
    fn test_window_is_replaced_not_merged() {
        let mut view = open(&[0, 1, 2, 3, 1, 2, 3, 0]);

        view.get_range(SliceArgs::range(0, 4)).expect("first window");
        view.get_range(SliceArgs::range(4, 8)).expect("second window");
        assert_eq!(view.window().start(), 4);
        assert_eq!(view.stats().refills, 2);

        // Previously cached range needs another unpack
        assert_eq!(&*view.get_range(SliceArgs::range(1, 3)).expect("range"), &[1, 2]);
        assert_eq!(view.stats().refills, 3);
        assert_eq!(view.window().start(), 1);
        assert_eq!(view.window().stop(), 3);
    }

    #[test]
    fn test_range_straddling_window_end_refills() {
        let mut view = open(&[0, 1, 2, 3, 1, 2, 3, 0]);
        view.get_range(SliceArgs::range(0, 4)).expect("window");

        assert_eq!(&*view.get_range(SliceArgs::range(2, 6)).expect("range"), &[2, 3, 1, 2]);
        assert_eq!(view.stats().refills, 2);
    }

    #[test]
    fn test_strided_does_not_move_window() {
        let mut view = open(&[0, 1, 2, 3, 1, 2, 3, 0]);
        view.get_range(SliceArgs::range(0, 2)).expect("window");

        let strided = view
            .get_range(SliceArgs::full().with_step(2))
            .expect("strided")
            .into_owned();
        assert_eq!(strided, vec![0, 2, 1, 3]);
        assert_eq!(view.window().stop(), 2);
        assert_eq!(view.stats().refills, 1);
    }

    #[test]
    fn test_failed_read_not_counted() {
        let mut view = open(&[1, 2, 3]);
        view.file.close();

        assert!(matches!(view.get_resolved(1), Err(StorageError::ClosedHandle)));
        assert_eq!(view.stats(), CacheStats::default());
    }

    #[test]
    fn test_close_discards_window() {
        let mut view = open(&[3, 3, 3]);
        view.get_range(SliceArgs::full()).expect("window");

        view.close();
        assert!(view.window().is_empty());
        assert!(matches!(view.get(0), Err(StorageError::ClosedHandle)));
    }
}
