//! Word-level helpers shared by the encoder and decoder.

use crate::{AbiError, Result, Word};

const USIZE_BYTES: usize = usize::BITS as usize / 8;

/// Number of 32-byte words needed to hold `len` bytes.
#[inline(always)]
pub(crate) const fn words_for_len(len: usize) -> usize {
    len.div_ceil(32)
}

/// Rounds `len` up to the next multiple of 32.
#[inline(always)]
pub(crate) const fn padded_len(len: usize) -> usize {
    words_for_len(len) * 32
}

/// Left-pads a `usize` to a 32-byte big-endian word.
#[inline]
pub(crate) fn pad_usize(value: usize) -> Word {
    let mut padded = Word::ZERO;
    padded[32 - USIZE_BYTES..].copy_from_slice(&value.to_be_bytes());
    padded
}

#[inline]
pub(crate) fn check_zeroes(data: &[u8]) -> bool {
    data.iter().all(|b| *b == 0)
}

/// Reads an offset or length word as a `usize`.
///
/// A word whose high-order bytes are set can never address a real buffer,
/// so it is rejected as malformed regardless of validation mode.
#[inline]
pub(crate) fn as_offset(word: &[u8; 32]) -> Result<usize> {
    let (high, low) = word.split_at(32 - USIZE_BYTES);
    if !check_zeroes(high) {
        return Err(AbiError::malformed("offset or length word out of range"));
    }
    let mut buf = [0u8; USIZE_BYTES];
    buf.copy_from_slice(low);
    Ok(usize::from_be_bytes(buf))
}

/// Whether a 32-byte big-endian word holds a valid `bits`-wide integer:
/// zero-extended for unsigned values, sign-extended for signed ones.
#[inline]
pub(crate) fn fits_width(word: &[u8; 32], bits: usize, signed: bool) -> bool {
    debug_assert!(bits % 8 == 0 && (8..=256).contains(&bits));
    let prefix = 32 - bits / 8;
    if prefix == 0 {
        return true;
    }
    let ext = if signed && word[prefix] & 0x80 != 0 { 0xff } else { 0x00 };
    word[..prefix].iter().all(|b| *b == ext)
}
