//! FASTQ k-mer clipping encoder
//!
//! Reads FASTQ records (plain text or gzip, detected from the magic bytes)
//! and encodes the leading `kmer_length` bases of each usable read as packed
//! symbol values. A read is skipped when its sequence is shorter than
//! `kmer_length` or contains an `N` (either case) anywhere. Encoding stops once
//! `max_reads` reads have been accepted.
//!
//! Only the sequence line of each four-line record is inspected. A record cut
//! short at end of input is dropped.

use crate::error::Result;
use crate::nucleotide::encode_bases_into;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default number of leading bases kept from each read
pub const DEFAULT_KMER_LENGTH: usize = 32;

/// Default cap on accepted reads
pub const DEFAULT_MAX_READS: usize = 1_000_000;

/// Gzip member magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Counters describing one encoding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FastqSummary {
    /// Reads encoded into the output
    pub reads: usize,
    /// Reads dropped for being short or containing `N`
    pub skipped: usize,
    /// Symbols produced (`reads * kmer_length`)
    pub symbols: usize,
}

/// Symbols produced from a FASTQ source
#[derive(Debug, Clone, Default)]
pub struct EncodedReads {
    /// Concatenated k-mer symbols, one read after another
    pub symbols: Vec<u8>,
    /// Pass counters
    pub summary: FastqSummary,
}

/// Encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastqEncoder {
    kmer_length: usize,
    max_reads: usize,
}

impl Default for FastqEncoder {
    fn default() -> Self {
        Self {
            kmer_length: DEFAULT_KMER_LENGTH,
            max_reads: DEFAULT_MAX_READS,
        }
    }
}

impl FastqEncoder {
    /// Create an encoder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of leading bases kept per read
    #[must_use]
    pub const fn with_kmer_length(mut self, kmer_length: usize) -> Self {
        self.kmer_length = kmer_length;
        self
    }

    /// Set the maximum number of accepted reads
    #[must_use]
    pub const fn with_max_reads(mut self, max_reads: usize) -> Self {
        self.max_reads = max_reads;
        self
    }

    /// Leading bases kept per read
    pub const fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    /// Maximum number of accepted reads
    pub const fn max_reads(&self) -> usize {
        self.max_reads
    }

    /// Encode a FASTQ file, transparently decompressing gzip input
    pub fn encode_path(&self, path: impl AsRef<Path>) -> Result<EncodedReads> {
        self.encode(open_fastq(path)?)
    }

    /// Encode FASTQ records from a buffered reader
    pub fn encode<R: BufRead>(&self, mut reader: R) -> Result<EncodedReads> {
        let mut out = EncodedReads::default();

        let mut header = String::new();
        let mut sequence = String::new();
        let mut separator = String::new();
        let mut quality = String::new();

        while out.summary.reads < self.max_reads {
            header.clear();
            if reader.read_line(&mut header)? == 0 {
                break;
            }

            sequence.clear();
            separator.clear();
            quality.clear();
            if reader.read_line(&mut sequence)? == 0
                || reader.read_line(&mut separator)? == 0
                || reader.read_line(&mut quality)? == 0
            {
                break;
            }

            let bases = sequence.trim_end_matches(['\r', '\n']).as_bytes();
            let ambiguous = bases.iter().any(|b| b.eq_ignore_ascii_case(&b'N'));
            if bases.len() < self.kmer_length || ambiguous {
                out.summary.skipped += 1;
                continue;
            }

            encode_bases_into(&bases[..self.kmer_length], &mut out.symbols)?;
            out.summary.reads += 1;
        }

        out.summary.symbols = out.symbols.len();
        Ok(out)
    }
}

/// Open a FASTQ file for reading, wrapping it in a gzip decoder when the
/// file starts with the gzip magic bytes.
pub fn open_fastq(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}
