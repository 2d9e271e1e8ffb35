//! Packed 2-bit sequence storage with random-access views.
//!
//! A packed sequence file holds `ceil(N / 4)` bytes and nothing else; the
//! symbol count `N` travels out of band and is supplied on every open. This
//! crate binds those bytes to durable storage and serves random access over
//! the logical sequence through interchangeable strategies:
//!
//! - **Direct**: memory-mapped bytes, unpacked on demand with a one-range cache
//! - **Preloaded**: the whole sequence unpacked into memory at open
//! - **Batched**: unpacks aligned batches into a one-window cache
//! - **Scalar**: per-symbol extraction with no caching, the reference baseline
//!
//! All strategies share the same indexing rules: negative indices count from
//! the end and slices clamp to bounds.
//!
//! # Example
//!
//! ```rust,no_run
//! use packseq_storage::{FileStore, PackedFile, PackedView, RandomAccess, SliceArgs, ViewConfig};
//!
//! # fn example() -> packseq_storage::Result<()> {
//! let store = FileStore::new();
//! PackedFile::write(&store, "reads.bin", &[0, 1, 2, 3, 1])?;
//!
//! let config = ViewConfig::default().with_batch_size(1024);
//! let mut view = PackedView::open(&store, "reads.bin", 5, &config)?;
//! assert_eq!(view.get(-1)?, 1);
//! assert_eq!(&*view.get_range(SliceArgs::range(1, 4))?, &[1, 2, 3]);
//! view.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_wrap)] // Index normalization works in i64

use thiserror::Error;

// Persistence collaborator
pub mod store;

// Packed file handle
pub mod packed_file;

// Index and slice normalization
pub mod slice;

// Cache window and counters
pub mod cache;

// Random access strategies
pub mod view;

// Configuration
pub mod config;

pub use cache::{CacheStats, CacheWindow};
pub use config::{OversizedRange, Strategy, ViewConfig};
pub use packed_file::PackedFile;
pub use slice::{ResolvedSlice, SliceArgs, resolve_index};
pub use store::{Backing, FileStore, MemoryStore, PackedStore};
pub use view::{BatchedView, DirectView, PackedView, PreloadedView, RandomAccess, ScalarView};

pub use packseq_formats::FormatError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Packing or encoding failed (invalid symbol, invalid base, short input).
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Backing storage holds fewer bytes than the symbol count requires.
    #[error("Size mismatch: expected at least {expected} bytes, found {actual}")]
    SizeMismatch {
        /// Bytes required for the declared symbol count
        expected: usize,
        /// Bytes present in storage
        actual: usize,
    },

    /// Resolved index falls outside `[0, len)`.
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Index as supplied by the caller
        index: i64,
        /// Sequence length
        len: usize,
    },

    /// Byte or slice range that cannot be served.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Access after the view or file handle was closed.
    #[error("Handle is closed")]
    ClosedHandle,

    /// Nothing stored at the requested path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Version information for the storage system.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
