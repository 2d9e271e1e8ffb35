//! Packed sequence file handle
//!
//! A packed file is `ceil(N / 4)` bytes with no header. Opening validates
//! the stored length against the declared symbol count; excess trailing
//! bytes are tolerated and never read.

use crate::store::{Backing, PackedStore};
use crate::{Result, StorageError};
use packseq_formats::packing::{self, SYMBOLS_PER_BYTE, packed_len};
use packseq_formats::{FastqEncoder, FastqSummary};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read-only handle over a packed sequence.
#[derive(Debug)]
pub struct PackedFile {
    path: PathBuf,
    element_count: usize,
    byte_len: usize,
    backing: Option<Backing>,
}

impl PackedFile {
    /// Pack `symbols` and persist them at `path`, replacing existing content.
    ///
    /// Every symbol is validated before the store is touched, so an invalid
    /// symbol leaves nothing behind.
    pub fn write(store: &dyn PackedStore, path: impl AsRef<Path>, symbols: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let bytes = packing::pack(symbols)?;
        store.persist(path, &bytes)?;

        info!(
            "Wrote {} symbols ({} bytes) to {}",
            symbols.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    /// Encode the leading k-mers of a FASTQ file and persist them at `output`.
    ///
    /// The returned summary carries the symbol count needed to open the
    /// written file.
    pub fn write_fastq(
        store: &dyn PackedStore,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        encoder: &FastqEncoder,
    ) -> Result<FastqSummary> {
        let input = input.as_ref();
        let encoded = encoder.encode_path(input)?;
        debug!(
            "Encoded {} reads from {} ({} skipped)",
            encoded.summary.reads,
            input.display(),
            encoded.summary.skipped
        );

        Self::write(store, output, &encoded.symbols)?;
        Ok(encoded.summary)
    }

    /// Open `path` for read-only access to `element_count` symbols.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SizeMismatch`] if the stored bytes are fewer
    /// than `ceil(element_count / 4)`. The backing is released before the
    /// error is returned.
    pub fn open_readonly(
        store: &dyn PackedStore,
        path: impl AsRef<Path>,
        element_count: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let byte_len = packed_len(element_count);
        let backing = store.open_backing(path)?;

        let actual = backing.len();
        if actual < byte_len {
            drop(backing);
            return Err(StorageError::SizeMismatch {
                expected: byte_len,
                actual,
            });
        }
        if actual > byte_len {
            warn!(
                "{} holds {} bytes, {} symbols need only {}; ignoring the rest",
                path.display(),
                actual,
                element_count,
                byte_len
            );
        }

        debug!(
            "Opened {} for {} symbols ({} bytes)",
            path.display(),
            element_count,
            byte_len
        );

        Ok(Self {
            path: path.to_path_buf(),
            element_count,
            byte_len,
            backing: Some(backing),
        })
    }

    /// Load and unpack a whole sequence in one pass.
    ///
    /// Reads the full contents through [`PackedStore::load_full`] without
    /// keeping a handle open.
    pub fn load(store: &dyn PackedStore, path: impl AsRef<Path>, element_count: usize) -> Result<Vec<u8>> {
        let bytes = store.load_full(path.as_ref())?;
        let expected = packed_len(element_count);
        if bytes.len() < expected {
            return Err(StorageError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(packing::unpack(&bytes, element_count)?)
    }

    /// Path the handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of logical symbols.
    pub const fn element_count(&self) -> usize {
        self.element_count
    }

    /// Number of packed bytes covering the symbols.
    pub const fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Whether [`close`](Self::close) has been called.
    pub const fn is_closed(&self) -> bool {
        self.backing.is_none()
    }

    /// Release the backing. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.backing.take().is_some() {
            debug!("Closed {}", self.path.display());
        }
    }

    fn backing(&self) -> Result<&Backing> {
        self.backing.as_ref().ok_or(StorageError::ClosedHandle)
    }

    /// Borrow packed bytes `byte_start..byte_stop`.
    pub fn read_bytes(&self, byte_start: usize, byte_stop: usize) -> Result<&[u8]> {
        let backing = self.backing()?;
        if byte_start > byte_stop || byte_stop > self.byte_len {
            return Err(StorageError::InvalidRange(format!(
                "bytes {byte_start}..{byte_stop} outside 0..{}",
                self.byte_len
            )));
        }
        Ok(&backing[byte_start..byte_stop])
    }

    /// Unpack logical symbols `start..stop`.
    ///
    /// Reads the byte-aligned span `start / 4 .. ceil(stop / 4)` and drops the
    /// leading pairs that precede `start`.
    pub fn unpack_range(&self, start: usize, stop: usize) -> Result<Vec<u8>> {
        if start > stop || stop > self.element_count {
            return Err(StorageError::InvalidRange(format!(
                "symbols {start}..{stop} outside 0..{}",
                self.element_count
            )));
        }

        let first_byte = start / SYMBOLS_PER_BYTE;
        let bytes = self.read_bytes(first_byte, packed_len(stop))?;
        Ok(packing::unpack_offset(
            bytes,
            start % SYMBOLS_PER_BYTE,
            stop - start,
        )?)
    }

    /// Extract one symbol from its byte.
    pub fn symbol_at(&self, index: usize) -> Result<u8> {
        let backing = self.backing()?;
        if index >= self.element_count {
            return Err(StorageError::IndexOutOfRange {
                index: index as i64,
                len: self.element_count,
            });
        }
        Ok(packing::extract(
            backing[index / SYMBOLS_PER_BYTE],
            index % SYMBOLS_PER_BYTE,
        ))
    }

    /// Unpack the whole sequence.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        self.unpack_range(0, self.element_count)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use packseq_formats::FormatError;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_open() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("seq.bin");
        let store = FileStore::new();

        PackedFile::write(&store, &path, &[0, 1, 2, 3, 1]).expect("write");
        assert_eq!(std::fs::read(&path).expect("raw read"), vec![0x1B, 0x40]);

        let file = PackedFile::open_readonly(&store, &path, 5).expect("open");
        assert_eq!(file.element_count(), 5);
        assert_eq!(file.byte_len(), 2);
        assert_eq!(file.path(), path.as_path());
        assert_eq!(file.read_all().expect("read"), vec![0, 1, 2, 3, 1]);
    }

    #[test]
    fn test_invalid_symbol_writes_nothing() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("seq.bin");
        let store = FileStore::new();

        let err = PackedFile::write(&store, &path, &[0, 1, 5]).expect_err("5 is invalid");
        assert!(matches!(
            err,
            StorageError::Format(FormatError::InvalidSymbol { index: 2, value: 5 })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_symbol_keeps_previous_content() {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", &[3, 3, 3, 3]).expect("write");
        assert!(PackedFile::write(&store, "seq", &[9]).is_err());
        assert_eq!(
            store.load_full(Path::new("seq")).expect("load"),
            vec![0xFF]
        );
    }

    #[test]
    fn test_open_truncated_file_fails() {
        let store = MemoryStore::new();
        store.persist(Path::new("short"), &[0x00]).expect("persist");

        let err = PackedFile::open_readonly(&store, "short", 5).expect_err("needs 2 bytes");
        assert!(matches!(
            err,
            StorageError::SizeMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_open_tolerates_trailing_bytes() {
        let store = MemoryStore::new();
        store
            .persist(Path::new("long"), &[0x1B, 0x40, 0xFF, 0xFF])
            .expect("persist");

        let file = PackedFile::open_readonly(&store, "long", 5).expect("open");
        assert_eq!(file.byte_len(), 2);
        assert_eq!(file.read_all().expect("read"), vec![0, 1, 2, 3, 1]);
        assert!(file.read_bytes(0, 3).is_err());
    }

    #[test]
    fn test_read_bytes_and_ranges() {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", &[0, 1, 2, 3, 1, 2, 3, 0, 2]).expect("write");
        let file = PackedFile::open_readonly(&store, "seq", 9).expect("open");

        assert_eq!(file.read_bytes(1, 2).expect("in range"), &[0b0110_1100]);
        assert_eq!(file.read_bytes(2, 2).expect("empty"), &[] as &[u8]);
        assert!(file.read_bytes(2, 1).is_err());

        assert_eq!(file.unpack_range(3, 7).expect("range"), vec![3, 1, 2, 3]);
        assert_eq!(file.unpack_range(8, 9).expect("range"), vec![2]);
        assert!(file.unpack_range(8, 10).is_err());

        assert_eq!(file.symbol_at(6).expect("index"), 3);
        assert!(matches!(
            file.symbol_at(9),
            Err(StorageError::IndexOutOfRange { index: 9, len: 9 })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", &[1, 2]).expect("write");
        let mut file = PackedFile::open_readonly(&store, "seq", 2).expect("open");

        file.close();
        file.close();
        assert!(file.is_closed());
        assert!(matches!(file.read_bytes(0, 1), Err(StorageError::ClosedHandle)));
        assert!(matches!(file.symbol_at(0), Err(StorageError::ClosedHandle)));
        assert!(matches!(file.read_all(), Err(StorageError::ClosedHandle)));
    }

    #[test]
    fn test_load_full_sequence() {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", &[2, 2, 1, 0, 3]).expect("write");

        assert_eq!(
            PackedFile::load(&store, "seq", 5).expect("load"),
            vec![2, 2, 1, 0, 3]
        );
        assert_eq!(PackedFile::load(&store, "seq", 3).expect("load"), vec![2, 2, 1]);
        assert!(matches!(
            PackedFile::load(&store, "seq", 9),
            Err(StorageError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_sequence() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("empty.bin");
        let store = FileStore::new();

        PackedFile::write(&store, &path, &[]).expect("write");
        let file = PackedFile::open_readonly(&store, &path, 0).expect("open");
        assert!(file.read_all().expect("read").is_empty());
    }
}
