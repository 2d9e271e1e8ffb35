//! Index and slice normalization
//!
//! Every view resolves caller indices here, once, at its public entry
//! points. Negative indices count back from the end. Slice bounds follow
//! Python's `slice.indices`: omitted bounds default by step direction, and
//! out-of-range bounds clamp instead of failing.

use crate::{Result, StorageError};
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// Resolve a possibly negative index against `len`.
///
/// # Errors
///
/// Returns [`StorageError::IndexOutOfRange`] if the index falls outside
/// `[0, len)` after adding `len` to negative values.
pub fn resolve_index(index: i64, len: usize) -> Result<usize> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved >= len as i64 {
        return Err(StorageError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// Unresolved slice bounds, as a caller writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceArgs {
    /// First index (inclusive); `None` means "from the beginning" for the step direction
    pub start: Option<i64>,
    /// End index (exclusive); `None` means "to the end" for the step direction
    pub stop: Option<i64>,
    /// Stride; `None` means 1
    pub step: Option<i64>,
}

impl SliceArgs {
    /// Slice with every bound given explicitly.
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// The whole sequence.
    pub const fn full() -> Self {
        Self::new(None, None, None)
    }

    /// Contiguous `start..stop`.
    pub const fn range(start: i64, stop: i64) -> Self {
        Self::new(Some(start), Some(stop), None)
    }

    /// Replace the stride.
    #[must_use]
    pub const fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }

    /// Resolve against a sequence of `len` symbols.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRange`] for a zero step.
    pub fn resolve(&self, len: usize) -> Result<ResolvedSlice> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(StorageError::InvalidRange("slice step cannot be zero".into()));
        }

        let len = len as i64;
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };

        let clamp = |bound: Option<i64>, default: i64| match bound {
            None => default,
            Some(value) if value < 0 => (value + len).max(lower),
            Some(value) => value.min(upper),
        };

        let (start, stop) = if step > 0 {
            (clamp(self.start, lower), clamp(self.stop, upper))
        } else {
            (clamp(self.start, upper), clamp(self.stop, lower))
        };

        Ok(ResolvedSlice { start, stop, step })
    }
}

impl From<Range<i64>> for SliceArgs {
    fn from(range: Range<i64>) -> Self {
        Self::range(range.start, range.end)
    }
}

impl From<RangeFrom<i64>> for SliceArgs {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None, None)
    }
}

impl From<RangeTo<i64>> for SliceArgs {
    fn from(range: RangeTo<i64>) -> Self {
        Self::new(None, Some(range.end), None)
    }
}

impl From<RangeFull> for SliceArgs {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// Slice bounds after clamping.
///
/// For negative steps `stop` may be `-1`, meaning "through index 0".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    /// First index visited
    pub start: i64,
    /// Exclusive end in the step direction
    pub stop: i64,
    /// Non-zero stride
    pub step: i64,
}

impl ResolvedSlice {
    /// Number of indices visited.
    #[allow(clippy::cast_possible_truncation)] // Bounded by the resolved span
    pub const fn len(&self) -> usize {
        let (low, high) = if self.step > 0 {
            (self.start, self.stop)
        } else {
            (self.stop, self.start)
        };
        if high <= low {
            return 0;
        }
        ((high.abs_diff(low) - 1) / self.step.unsigned_abs() + 1) as usize
    }

    /// Whether no index is visited.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the slice is a plain forward run (`step == 1`).
    pub const fn is_contiguous(&self) -> bool {
        self.step == 1
    }

    /// Forward bounds for a contiguous slice; empty when `stop <= start`.
    pub fn bounds(&self) -> Range<usize> {
        let start = self.start.max(0) as usize;
        start..start + self.len()
    }

    /// Indices visited, in order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + use<> {
        let start = self.start.max(0) as usize;
        let stride = usize::try_from(self.step.unsigned_abs()).unwrap_or(usize::MAX);
        let forward = self.step > 0;
        // Only k == 0 can meet a stride wider than the sequence
        (0..self.len()).map(move |k| {
            let offset = k * stride;
            if forward { start + offset } else { start - offset }
        })
    }
}
