//! 2-bit symbol packing
//!
//! Four symbols share one byte, most significant bit pair first:
//!
//! | Bits | Symbol offset within the byte |
//! |------|-------------------------------|
//! | 7..6 | 0 |
//! | 5..4 | 1 |
//! | 3..2 | 2 |
//! | 1..0 | 3 |
//!
//! When the symbol count is not a multiple of four the unused low-order
//! pairs of the final byte are zero. The byte stream carries no header, so
//! the symbol count always travels out of band.

use crate::error::{FormatError, Result};

/// Number of symbols stored in one packed byte
pub const SYMBOLS_PER_BYTE: usize = 4;

/// Largest valid symbol value
pub const MAX_SYMBOL: u8 = 0b11;

/// Expanded symbols for every byte value, indexed by the packed byte.
static UNPACK_TABLE: [[u8; SYMBOLS_PER_BYTE]; 256] = build_unpack_table();

const fn build_unpack_table() -> [[u8; SYMBOLS_PER_BYTE]; 256] {
    let mut table = [[0u8; SYMBOLS_PER_BYTE]; 256];
    let mut value = 0;
    while value < 256 {
        let byte = value as u8;
        table[value] = [
            (byte >> 6) & MAX_SYMBOL,
            (byte >> 4) & MAX_SYMBOL,
            (byte >> 2) & MAX_SYMBOL,
            byte & MAX_SYMBOL,
        ];
        value += 1;
    }
    table
}

/// Number of bytes needed to hold `count` packed symbols (`ceil(count / 4)`).
pub const fn packed_len(count: usize) -> usize {
    count.div_ceil(SYMBOLS_PER_BYTE)
}

/// Extract the symbol at bit-pair `position` (0..4, most significant first) of `byte`.
#[inline]
pub const fn extract(byte: u8, position: usize) -> u8 {
    (byte >> (6 - 2 * (position % SYMBOLS_PER_BYTE))) & MAX_SYMBOL
}

/// Check that every symbol lies in `0..=3`.
///
/// Reports the first offending symbol.
pub fn validate_symbols(symbols: &[u8]) -> Result<()> {
    match symbols.iter().position(|&s| s > MAX_SYMBOL) {
        Some(index) => Err(FormatError::InvalidSymbol {
            index,
            value: symbols[index],
        }),
        None => Ok(()),
    }
}

/// Pack symbols into a new byte vector.
///
/// # Errors
///
/// Returns [`FormatError::InvalidSymbol`] if any value is above 3. Nothing
/// is produced in that case.
pub fn pack(symbols: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(packed_len(symbols.len()));
    pack_into(symbols, &mut out)?;
    Ok(out)
}

/// Pack symbols, appending the bytes to `out`.
///
/// The whole input is validated before `out` is touched.
pub fn pack_into(symbols: &[u8], out: &mut Vec<u8>) -> Result<()> {
    validate_symbols(symbols)?;
    out.reserve(packed_len(symbols.len()));

    let chunks = symbols.chunks_exact(SYMBOLS_PER_BYTE);
    let tail = chunks.remainder();
    out.extend(chunks.map(|c| (c[0] << 6) | (c[1] << 4) | (c[2] << 2) | c[3]));

    if !tail.is_empty() {
        let last = tail
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &s)| acc | (s << (6 - 2 * i)));
        out.push(last);
    }

    Ok(())
}

/// Unpack the first `count` symbols of `bytes`.
///
/// Trailing padding pairs beyond `count` are ignored.
///
/// # Errors
///
/// Returns [`FormatError::InvalidRange`] if `count > 4 * bytes.len()`.
pub fn unpack(bytes: &[u8], count: usize) -> Result<Vec<u8>> {
    unpack_offset(bytes, 0, count)
}

/// Unpack `count` symbols starting at symbol `offset` of `bytes`.
///
/// `offset` is counted in symbols, so `offset = 5` starts at the second
/// pair of `bytes[1]`.
pub fn unpack_offset(bytes: &[u8], offset: usize, count: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    unpack_into(bytes, offset, count, &mut out)?;
    Ok(out)
}

/// Unpack `count` symbols starting at symbol `offset`, appending to `out`.
pub fn unpack_into(bytes: &[u8], offset: usize, count: usize, out: &mut Vec<u8>) -> Result<()> {
    let available = bytes
        .len()
        .saturating_mul(SYMBOLS_PER_BYTE)
        .saturating_sub(offset);
    if count > available {
        return Err(FormatError::InvalidRange {
            requested: count,
            available,
        });
    }
    if count == 0 {
        return Ok(());
    }

    let first_byte = offset / SYMBOLS_PER_BYTE;
    let lead = offset % SYMBOLS_PER_BYTE;
    let end_byte = packed_len(offset + count);
    let base = out.len();
    out.reserve(count + SYMBOLS_PER_BYTE);

    let span = &bytes[first_byte..end_byte];
    if let Some((&head, rest)) = span.split_first() {
        out.extend_from_slice(&UNPACK_TABLE[head as usize][lead..]);
        for &byte in rest {
            out.extend_from_slice(&UNPACK_TABLE[byte as usize]);
        }
    }

    out.truncate(base + count);
    Ok(())
}

/// Read the symbol at logical `index` of a packed byte slice.
///
/// Returns `None` when the index lies past the last byte.
#[inline]
pub fn symbol_at(bytes: &[u8], index: usize) -> Option<u8> {
    bytes
        .get(index / SYMBOLS_PER_BYTE)
        .map(|&byte| extract(byte, index % SYMBOLS_PER_BYTE))
}
