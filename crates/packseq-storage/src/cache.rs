//! Single-range cache window and access counters

/// One contiguous unpacked range `start..stop` of the logical sequence.
///
/// A view holds at most one window; a miss replaces it wholesale.
/// `symbols.len() == stop - start` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheWindow {
    start: usize,
    symbols: Vec<u8>,
}

impl CacheWindow {
    /// Window over `symbols`, the unpacked range beginning at `start`.
    pub const fn new(start: usize, symbols: Vec<u8>) -> Self {
        Self { start, symbols }
    }

    /// First logical index held.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end of the held range.
    pub const fn stop(&self) -> usize {
        self.start + self.symbols.len()
    }

    /// Number of symbols held.
    pub const fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether nothing is cached.
    pub const fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Cached symbols.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Whether `index` lies inside the window.
    pub const fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.stop()
    }

    /// Whether `start..stop` is fully served by the window.
    ///
    /// `start` must be inside the window, so an empty window never covers.
    pub const fn covers(&self, start: usize, stop: usize) -> bool {
        self.contains(start) && stop <= self.stop()
    }

    /// Symbol at logical `index`, if cached.
    pub fn get(&self, index: usize) -> Option<u8> {
        if self.contains(index) {
            Some(self.symbols[index - self.start])
        } else {
            None
        }
    }

    /// Cached symbols for `start..stop`, cut at the window end.
    ///
    /// `start` must lie inside the window.
    pub fn slice(&self, start: usize, stop: usize) -> &[u8] {
        let from = start - self.start;
        let to = stop.min(self.stop()) - self.start;
        &self.symbols[from..to.max(from)]
    }

    /// Drop the cached range.
    pub fn clear(&mut self) {
        self.start = 0;
        self.symbols = Vec::new();
    }
}

/// Access counters kept by each view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from already unpacked symbols
    pub hits: u64,
    /// Requests that had to read packed bytes
    pub misses: u64,
    /// Times the cache window was replaced
    pub refills: u64,
    /// Symbols unpacked from packed bytes
    pub symbols_unpacked: u64,
}

impl CacheStats {
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_refill(&mut self, symbols: usize) {
        self.refills += 1;
        self.symbols_unpacked += symbols as u64;
    }

    pub(crate) fn record_unpacked(&mut self, symbols: usize) {
        self.symbols_unpacked += symbols as u64;
    }

    /// Fraction of requests served from cache, as a percentage.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        (self.hits as f64 / total as f64) * 100.0
    }
}
