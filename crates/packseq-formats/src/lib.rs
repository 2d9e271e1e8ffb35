//! Symbol packing and sequence encoders for packed 2-bit sequence files
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for bit packing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! This crate holds the pure, I/O-free half of packseq: the byte layout of a
//! packed sequence and the encoders that turn biological input into symbol
//! values in `0..=3`.
//!
//! # Format
//!
//! - **Packing**: four 2-bit symbols per byte, most significant pair first,
//!   final byte zero-padded. No header; the symbol count is supplied by the
//!   caller on every read.
//! - **Nucleotide**: `A=0 C=1 G=2 T=3` alphabet mapping.
//! - **FASTQ**: leading k-mer extraction from (optionally gzipped) reads.
//!
//! # Example
//!
//! ```rust
//! use packseq_formats::packing::{pack, unpack};
//!
//! let bytes = pack(&[0, 1, 2, 3, 1]).unwrap();
//! assert_eq!(bytes, vec![0x1B, 0x40]);
//! assert_eq!(unpack(&bytes, 5).unwrap(), vec![0, 1, 2, 3, 1]);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod fastq;
pub mod nucleotide;
pub mod packing;

pub use error::{FormatError, Result};
pub use fastq::{EncodedReads, FastqEncoder, FastqSummary};
pub use packing::{MAX_SYMBOL, SYMBOLS_PER_BYTE, pack, packed_len, unpack};
