//! Persistence collaborators for packed byte sequences
//!
//! A store persists a whole packed byte sequence at a path, returns it in
//! full, and opens a read-only [`Backing`] for range reads. Packed files
//! receive their store explicitly; nothing here is process-global.

use crate::{Result, StorageError};
use bytes::Bytes;
use memmap2::{Mmap, MmapOptions};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read-only bytes backing an open packed file.
pub enum Backing {
    /// Memory-mapped file contents
    Mapped(Mmap),
    /// Bytes held in memory
    Shared(Bytes),
}

impl Backing {
    /// Backing bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => &mmap[..],
            Self::Shared(bytes) => &bytes[..],
        }
    }

    /// Whether the bytes come from a memory mapping.
    pub const fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Backing {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_mapped() { "Mapped" } else { "Shared" };
        f.debug_struct("Backing")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

/// Storage for packed byte sequences.
pub trait PackedStore: fmt::Debug + Send + Sync {
    /// Persist `bytes` at `path`, replacing any existing content.
    fn persist(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Return the full contents stored at `path`.
    fn load_full(&self, path: &Path) -> Result<Vec<u8>>;

    /// Open the contents at `path` for read-only range access.
    fn open_backing(&self, path: &Path) -> Result<Backing>;
}

/// Local filesystem store.
///
/// Writes go to a sibling temp file, are synced, then renamed over the
/// target, so readers never observe a half-written file. Reads memory-map
/// the file unless mapping is disabled.
#[derive(Debug, Clone)]
pub struct FileStore {
    use_mmap: bool,
}

impl Default for FileStore {
    fn default() -> Self {
        Self { use_mmap: true }
    }
}

impl FileStore {
    /// Create a store that memory-maps on read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable memory mapping on read
    #[must_use]
    pub const fn with_mmap(mut self, enable: bool) -> Self {
        self.use_mmap = enable;
        self
    }

    /// Whether reads memory-map the file.
    pub const fn uses_mmap(&self) -> bool {
        self.use_mmap
    }

    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map_or_else(|| "packed".into(), |n| n.to_string_lossy().into_owned());
        path.with_file_name(format!(".{name}.tmp"))
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

fn io_error(path: &Path, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(path.display().to_string())
    } else {
        StorageError::Io(err)
    }
}

impl PackedStore for FileStore {
    fn persist(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let temp_path = Self::temp_path(path);

        if let Err(e) = Self::write_synced(&temp_path, bytes) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_error(path, e));
        }

        if let Err(e) = std::fs::rename(&temp_path, path) {
            warn!(
                "Failed to move {} into place: {}",
                temp_path.display(),
                e
            );
            let _ = std::fs::remove_file(&temp_path);
            return Err(StorageError::Io(e));
        }

        debug!("Persisted {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn load_full(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| io_error(path, e))
    }

    fn open_backing(&self, path: &Path) -> Result<Backing> {
        if !self.use_mmap {
            return Ok(Backing::Shared(Bytes::from(self.load_full(path)?)));
        }

        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let len = file.metadata()?.len();

        // Zero-length mappings are rejected on some platforms
        if len == 0 {
            return Ok(Backing::Shared(Bytes::new()));
        }

        #[allow(unsafe_code)]
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        debug!("Mapped {} bytes from {}", len, path.display());
        Ok(Backing::Mapped(mmap))
    }
}

/// In-process store keyed by path.
///
/// Stored sequences are shared [`Bytes`], so opening a backing never
/// copies.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<PathBuf, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is stored at `path`.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.read().contains_key(path.as_ref())
    }

    /// Remove the entry at `path`, returning its bytes.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Bytes> {
        self.files.write().remove(path.as_ref())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn lookup(&self, path: &Path) -> Result<Bytes> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))
    }
}

impl PackedStore for MemoryStore {
    fn persist(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.files
            .write()
            .insert(path.to_path_buf(), Bytes::copy_from_slice(bytes));
        Ok(())
    }

    fn load_full(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(self.lookup(path)?.to_vec())
    }

    fn open_backing(&self, path: &Path) -> Result<Backing> {
        Ok(Backing::Shared(self.lookup(path)?))
    }
}
