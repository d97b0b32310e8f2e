//! Bit cache shared by the stream readers.
//!
//! Both [`Reader`](super::Reader) and [`SubstreamReader`](super::SubstreamReader)
//! fetch whole bytes from a source and hand them out bit by bit. The cache
//! holds the not-yet-consumed low bits of the last fetched byte.

use crate::error::{Error, Result};

/// A byte-granular source with a repositionable cursor.
pub(crate) trait ByteSource {
    /// Fetch the next byte, advancing the cursor.
    fn next_byte(&mut self) -> Result<u8>;

    /// Offset of the next byte to be fetched.
    fn position(&self) -> u64;

    /// Move the cursor without touching any cached bits.
    fn set_position(&mut self, pos: u64);
}

/// Mask selecting the low `n` bits of a byte (`n` in `0..=8`).
#[inline]
fn low_mask(n: u8) -> u8 {
    ((1u16 << n) - 1) as u8
}

/// Unread bits of the most recently fetched byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BitCache {
    /// Unread bits, right-aligned
    cache: u8,
    /// Number of unread bits in `cache` (0-7 between calls)
    bits: u8,
}

/// A saved reader position for mark/reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    pub(crate) position: u64,
    pub(crate) cache: BitCache,
}

impl BitCache {
    /// Number of cached bits.
    #[inline]
    pub(crate) fn bits(&self) -> u8 {
        self.bits
    }

    /// Drop all cached bits.
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.cache = 0;
        self.bits = 0;
    }

    /// Drop the cached bits and report how many there were.
    pub(crate) fn align(&mut self) -> u8 {
        let dropped = self.bits;
        self.clear();
        dropped
    }

    /// Index of the next unread bit within the current byte.
    pub(crate) fn bit_position(&self) -> u8 {
        if self.bits == 0 {
            0
        } else {
            8 - self.bits
        }
    }

    pub(crate) fn read_bit<S: ByteSource + ?Sized>(&mut self, src: &mut S) -> Result<u8> {
        if self.bits == 0 {
            self.cache = src.next_byte()?;
            self.bits = 8;
        }
        self.bits -= 1;
        let bit = (self.cache >> self.bits) & 1;
        self.cache &= low_mask(self.bits);
        Ok(bit)
    }

    /// Read a byte, stitching cached bits together with a fresh byte when unaligned.
    pub(crate) fn read_byte<S: ByteSource + ?Sized>(&mut self, src: &mut S) -> Result<u8> {
        let next = src.next_byte()?;
        if self.bits == 0 {
            return Ok(next);
        }

        let byte = (self.cache << (8 - self.bits)) | (next >> self.bits);
        self.cache = next & low_mask(self.bits);
        Ok(byte)
    }

    /// Read `n` bits MSB-first. On failure the source cursor is restored and
    /// the cache is untouched.
    pub(crate) fn read_bits<S: ByteSource + ?Sized>(&mut self, src: &mut S, n: u8) -> Result<u64> {
        if n > 64 {
            return Err(Error::InvalidArgument(format!(
                "bit count must be in range 0..=64, got {}",
                n
            )));
        }
        if n == 0 {
            return Ok(0);
        }

        if n <= self.bits {
            let shift = self.bits - n;
            let value = u64::from(self.cache >> shift);
            self.cache &= low_mask(shift);
            self.bits = shift;
            return Ok(value);
        }

        let start = src.position();
        match fetch_bits(src, u64::from(self.cache), n - self.bits) {
            Ok((value, cache)) => {
                *self = cache;
                Ok(value)
            },
            Err(e) => {
                src.set_position(start);
                Err(e)
            },
        }
    }
}

/// Append `remaining` bits from the source to `value`, returning the result
/// and the cache left over from the last byte fetched.
fn fetch_bits<S: ByteSource + ?Sized>(
    src: &mut S,
    mut value: u64,
    mut remaining: u8,
) -> Result<(u64, BitCache)> {
    while remaining >= 8 {
        value = (value << 8) | u64::from(src.next_byte()?);
        remaining -= 8;
    }
    if remaining == 0 {
        return Ok((value, BitCache::default()));
    }

    let next = src.next_byte()?;
    let shift = 8 - remaining;
    value = (value << remaining) | u64::from(next >> shift);
    Ok((
        value,
        BitCache {
            cache: next & low_mask(shift),
            bits: shift,
        },
    ))
}
