//! Error types for symbol packing and sequence encoders

use thiserror::Error;

/// Errors that can occur when packing, unpacking or encoding symbols
#[derive(Debug, Error)]
pub enum FormatError {
    /// A symbol value outside `0..=3` was presented for packing
    #[error("Invalid symbol {value} at index {index}: expected a value in 0..=3")]
    InvalidSymbol {
        /// Position of the offending symbol in the input
        index: usize,
        /// The rejected value
        value: u8,
    },

    /// More symbols were requested than the packed bytes can supply
    #[error("Invalid range: requested {requested} symbols, only {available} available")]
    InvalidRange {
        /// Number of symbols requested
        requested: usize,
        /// Number of symbols the input bytes hold
        available: usize,
    },

    /// A nucleotide outside the A/C/G/T alphabet
    #[error("Invalid base 0x{base:02x} at position {position}")]
    InvalidBase {
        /// Position of the base within its sequence
        position: usize,
        /// The rejected ASCII byte
        base: u8,
    },

    /// IO error while reading encoder input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for format operations
pub type Result<T> = std::result::Result<T, FormatError>;
