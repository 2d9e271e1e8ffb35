//! Nucleotide alphabet mapping
//!
//! DNA bases map onto the four packed symbol values in alphabetical order:
//! `A = 0`, `C = 1`, `G = 2`, `T = 3`. Lowercase (soft-masked) bases are
//! accepted on input. Ambiguity codes such as `N` have no symbol and are
//! rejected.

use crate::error::{FormatError, Result};
use crate::packing::MAX_SYMBOL;

/// Uppercase base for each symbol value.
pub const BASES: [u8; 4] = *b"ACGT";

/// Map an ASCII base to its symbol value.
#[inline]
pub const fn base_to_symbol(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Map a symbol value back to its uppercase base.
#[inline]
pub const fn symbol_to_base(symbol: u8) -> Option<u8> {
    if symbol > MAX_SYMBOL {
        None
    } else {
        Some(BASES[symbol as usize])
    }
}

/// Encode a base sequence into symbols.
pub fn encode_bases(sequence: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(sequence.len());
    encode_bases_into(sequence, &mut out)?;
    Ok(out)
}

/// Encode a base sequence, appending symbols to `out`.
///
/// On error `out` keeps whatever was appended before the bad base; callers
/// that need all-or-nothing should truncate back themselves.
pub fn encode_bases_into(sequence: &[u8], out: &mut Vec<u8>) -> Result<()> {
    out.reserve(sequence.len());
    for (position, &base) in sequence.iter().enumerate() {
        let symbol =
            base_to_symbol(base).ok_or(FormatError::InvalidBase { position, base })?;
        out.push(symbol);
    }
    Ok(())
}

/// Decode symbols back into an uppercase base sequence.
pub fn decode_symbols(symbols: &[u8]) -> Result<Vec<u8>> {
    symbols
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            symbol_to_base(value).ok_or(FormatError::InvalidSymbol { index, value })
        })
        .collect()
}
