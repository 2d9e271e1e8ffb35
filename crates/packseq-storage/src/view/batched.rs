//! Batched strategy: refill the cache one aligned batch at a time
//!
//! A miss on index `key` unpacks the batch `[key / b * b, min(key / b * b + b, N))`
//! and replaces the cache window with it. A contiguous range is served from
//! the window when the window holds all of it. Otherwise the window moves to
//! the batch holding `start`, and [`OversizedRange`] decides what happens
//! when the range runs past that batch.

use super::{RandomAccess, collect_indices};
use crate::cache::{CacheStats, CacheWindow};
use crate::config::OversizedRange;
use crate::packed_file::PackedFile;
use crate::slice::{SliceArgs, resolve_index};
use crate::store::PackedStore;
use crate::{Result, StorageError};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

/// View that unpacks batch-aligned windows on demand.
#[derive(Debug)]
pub struct BatchedView {
    file: PackedFile,
    batch_size: usize,
    oversized_range: OversizedRange,
    window: CacheWindow,
    stats: CacheStats,
}

impl BatchedView {
    /// Open `path` holding `element_count` symbols.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if `batch_size` is zero.
    pub fn open(
        store: &dyn PackedStore,
        path: impl AsRef<Path>,
        element_count: usize,
        batch_size: usize,
        oversized_range: OversizedRange,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(StorageError::Config("batch_size must be at least 1".into()));
        }
        let file = PackedFile::open_readonly(store, path, element_count)?;
        Ok(Self {
            file,
            batch_size,
            oversized_range,
            window: CacheWindow::default(),
            stats: CacheStats::default(),
        })
    }

    /// Batch granularity.
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Policy for ranges that outgrow one batch.
    pub const fn oversized_range(&self) -> OversizedRange {
        self.oversized_range
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

    const fn batch_start(&self, index: usize) -> usize {
        (index / self.batch_size) * self.batch_size
    }

    fn batch_end(&self, index: usize) -> usize {
        (self.batch_start(index) + self.batch_size).min(self.file.element_count())
    }

    /// Replace the window with the batches spanning `first..=last`.
    fn refill(&mut self, first: usize, last: usize) -> Result<()> {
        let start = self.batch_start(first);
        let stop = self.batch_end(last);
        let symbols = self.file.unpack_range(start, stop)?;
        debug!("Batched refill {}..{}", start, stop);
        self.stats.record_refill(symbols.len());
        self.window = CacheWindow::new(start, symbols);
        Ok(())
    }

    fn get_resolved(&mut self, index: usize) -> Result<u8> {
        if let Some(symbol) = self.window.get(index) {
            self.stats.record_hit();
            return Ok(symbol);
        }

        self.stats.record_miss();
        self.refill(index, index)?;
        self.window
            .get(index)
            .ok_or_else(|| StorageError::InvalidRange(format!("index {index} missing after refill")))
    }
}

impl RandomAccess for BatchedView {
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
            match self.oversized_range {
                OversizedRange::Expand => self.refill(bounds.start, bounds.end - 1)?,
                OversizedRange::Truncate => {
                    self.refill(bounds.start, bounds.start)?;
                    if bounds.end > self.window.stop() {
                        warn!(
                            "Range {}..{} truncated at batch end {}",
                            bounds.start,
                            bounds.end,
                            self.window.stop()
                        );
                    }
                }
            }
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
