//! Random access views over packed sequences
//!
//! Every strategy exposes the same [`RandomAccess`] contract; they differ
//! only in how much they unpack and keep:
//!
//! | Strategy | Open cost | Memory | Per-access cost |
//! |----------|-----------|--------|-----------------|
//! | [`DirectView`] | O(1) | last requested range | unpack on miss |
//! | [`PreloadedView`] | O(N) | 1 byte per symbol | indexing |
//! | [`BatchedView`] | O(1) | one batch | unpack a batch on miss |
//! | [`ScalarView`] | O(1) | none | one byte read per symbol |
//!
//! Strided slices (`step != 1`) are served element by element in every
//! strategy.

mod batched;
mod direct;
mod preloaded;
mod scalar;

pub use batched::BatchedView;
pub use direct::DirectView;
pub use preloaded::PreloadedView;
pub use scalar::ScalarView;

use crate::Result;
use crate::cache::CacheStats;
use crate::config::{Strategy, ViewConfig};
use crate::slice::{ResolvedSlice, SliceArgs};
use crate::store::PackedStore;
use std::borrow::Cow;
use std::path::Path;

/// Random access over a logical sequence of 2-bit symbols.
///
/// Views are single-owner: reads take `&mut self` because a miss replaces
/// the cache window in place.
pub trait RandomAccess {
    /// Symbol at `index`; negative values count from the end.
    fn get(&mut self, index: i64) -> Result<u8>;

    /// Symbols selected by a slice, clamped to the sequence bounds.
    ///
    /// Contiguous slices borrow from the view's unpacked buffer where the
    /// strategy has one.
    fn get_range(&mut self, slice: SliceArgs) -> Result<Cow<'_, [u8]>>;

    /// Number of logical symbols.
    fn len(&self) -> usize;

    /// Whether the sequence holds no symbols.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release the backing storage and any unpacked buffer.
    ///
    /// Closing twice is a no-op; reads after close fail with
    /// [`StorageError::ClosedHandle`](crate::StorageError::ClosedHandle).
    fn close(&mut self);

    /// Whether the view has been closed.
    fn is_closed(&self) -> bool;

    /// Access counters since open.
    fn stats(&self) -> CacheStats;
}

/// Collect a strided slice one symbol at a time.
fn collect_indices<F>(slice: &ResolvedSlice, mut get: F) -> Result<Vec<u8>>
where
    F: FnMut(usize) -> Result<u8>,
{
    let mut out = Vec::with_capacity(slice.len());
    for index in slice.indices() {
        out.push(get(index)?);
    }
    Ok(out)
}

/// A view whose strategy is chosen at open time.
#[derive(Debug)]
pub enum PackedView {
    /// On-demand unpacking with a last-range cache
    Direct(DirectView),
    /// Fully unpacked at open
    Preloaded(PreloadedView),
    /// Batch-aligned cache refills
    Batched(BatchedView),
    /// Uncached per-symbol reads
    Scalar(ScalarView),
}

impl PackedView {
    /// Open `path` holding `element_count` symbols with the configured strategy.
    pub fn open(
        store: &dyn PackedStore,
        path: impl AsRef<Path>,
        element_count: usize,
        config: &ViewConfig,
    ) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();

        Ok(match config.strategy {
            Strategy::Direct => Self::Direct(DirectView::open(store, path, element_count)?),
            Strategy::Preloaded => {
                Self::Preloaded(PreloadedView::open(store, path, element_count)?)
            }
            Strategy::Batched => Self::Batched(BatchedView::open(
                store,
                path,
                element_count,
                config.batch_size,
                config.oversized_range,
            )?),
            Strategy::Scalar => Self::Scalar(ScalarView::open(store, path, element_count)?),
        })
    }

    /// Strategy backing this view.
    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::Direct(_) => Strategy::Direct,
            Self::Preloaded(_) => Strategy::Preloaded,
            Self::Batched(_) => Strategy::Batched,
            Self::Scalar(_) => Strategy::Scalar,
        }
    }

    fn inner(&self) -> &dyn RandomAccess {
        match self {
            Self::Direct(view) => view,
            Self::Preloaded(view) => view,
            Self::Batched(view) => view,
            Self::Scalar(view) => view,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn RandomAccess {
        match self {
            Self::Direct(view) => view,
            Self::Preloaded(view) => view,
            Self::Batched(view) => view,
            Self::Scalar(view) => view,
        }
    }
}

impl RandomAccess for PackedView {
    fn get(&mut self, index: i64) -> Result<u8> {
        self.inner_mut().get(index)
    }

    fn get_range(&mut self, slice: SliceArgs) -> Result<Cow<'_, [u8]>> {
        self.inner_mut().get_range(slice)
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn close(&mut self) {
        self.inner_mut().close();
    }

    fn is_closed(&self) -> bool {
        self.inner().is_closed()
    }

    fn stats(&self) -> CacheStats {
        self.inner().stats()
    }
}
