//! Bit-oriented stream I/O.
//!
//! This module provides the byte and bit level plumbing every JBIG2 region
//! and symbol decoder is built on:
//! - [`BufferWriter`] - growable buffer with MSB-first or LSB-first bit packing
//! - [`Reader`] - sequential/seekable bit reader over an immutable byte source
//! - [`SubstreamReader`] - bounded window over another [`StreamReader`]
//!
//! Writers and readers are exposed through the small [`BitWriter`],
//! [`BinaryWriter`] and [`StreamReader`] traits so MSB and LSB writers, and
//! bounded and unbounded readers, are interchangeable to consumers.
//!
//! JBIG2 Spec: ITU-T T.88 (ISO/IEC 14492), Section 6.2 - bit and byte ordering

use std::io::SeekFrom;

use crate::error::Result;

mod cache;
mod reader;
mod substream;
mod writer;

pub use reader::Reader;
pub use substream::SubstreamReader;
pub use writer::BufferWriter;

/// Order in which bits are packed into a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// First bit written lands in bit 7 (JBIG2, CCITT, PDF filters)
    #[default]
    Msb,
    /// First bit written lands in bit 0
    Lsb,
}

/// Position of a bit cursor within a byte buffer.
///
/// `bit_index` is always in `0..8`; advancing past bit 7 carries into the
/// next byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct BitPosition {
    /// Index of the byte the cursor is in
    pub byte_index: usize,
    /// Index of the next bit within that byte, counted in write order
    pub bit_index: u8,
}

impl BitPosition {
    /// Absolute offset of the cursor in bits.
    pub fn absolute_bits(&self) -> u64 {
        self.byte_index as u64 * 8 + u64::from(self.bit_index)
    }
}

/// Sink for individual bits and bit runs.
pub trait BitWriter {
    /// Write a single bit. Fails unless `bit` is 0 or 1.
    fn write_bit(&mut self, bit: u8) -> Result<()>;

    /// Write the low `count` bits of `value` (`count` in `0..=64`).
    ///
    /// Returns the number of whole bytes written before the trailing bits.
    fn write_bits(&mut self, value: u64, count: usize) -> Result<usize>;

    /// Pad the current byte with zero bits up to the next byte boundary.
    fn finish_byte(&mut self);

    /// Move the bit cursor by `n` bits, backwards when negative.
    fn skip_bits(&mut self, n: i64) -> Result<()>;
}

/// A [`BitWriter`] that also accepts whole bytes and exposes its output.
pub trait BinaryWriter: BitWriter {
    /// Write one byte at the current bit position.
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Write a byte slice at the current bit position, returning the count written.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Bytes written so far, including a trailing partially filled byte.
    fn data(&self) -> &[u8];
}

/// Bit-level reader over a byte source.
///
/// Reads past the end return [`Error::EndOfData`](crate::error::Error::EndOfData);
/// whether that is expected is up to the caller.
pub trait StreamReader {
    /// Read up to `buf.len()` bytes, returning how many were read.
    ///
    /// Fails with end of data only when nothing at all could be read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read 8 bits, starting at the current bit position.
    fn read_byte(&mut self) -> Result<u8>;

    /// Move to a byte offset, discarding any cached bits.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Read a single bit.
    fn read_bit(&mut self) -> Result<u8>;

    /// Read `n` bits (`n` in `0..=64`) MSB-first into an integer.
    fn read_bits(&mut self, n: u8) -> Result<u64>;

    /// Read a single bit as a boolean.
    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bit()? == 1)
    }

    /// Read a big-endian 32-bit unsigned integer.
    fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Discard the unread bits of the current byte, returning how many were dropped.
    fn align(&mut self) -> u8;

    /// Index of the next unread bit within the current byte (0 when aligned).
    fn bit_position(&self) -> u8;

    /// Remember the current position for a later [`reset`](StreamReader::reset).
    fn mark(&mut self);

    /// Return to the last marked position (the start if never marked).
    fn reset(&mut self);

    /// Total length of the readable data in bytes.
    fn length(&self) -> u64;

    /// Offset of the next byte to be fetched from the source.
    fn stream_position(&self) -> u64;
}

impl<R: StreamReader + ?Sized> StreamReader for &mut R {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }

    fn read_bit(&mut self) -> Result<u8> {
        (**self).read_bit()
    }

    fn read_bits(&mut self, n: u8) -> Result<u64> {
        (**self).read_bits(n)
    }

    fn read_bool(&mut self) -> Result<bool> {
        (**self).read_bool()
    }

    fn read_u32(&mut self) -> Result<u32> {
        (**self).read_u32()
    }

    fn align(&mut self) -> u8 {
        (**self).align()
    }

    fn bit_position(&self) -> u8 {
        (**self).bit_position()
    }

    fn mark(&mut self) {
        (**self).mark()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn length(&self) -> u64 {
        (**self).length()
    }

    fn stream_position(&self) -> u64 {
        (**self).stream_position()
    }
}

impl<R: StreamReader + ?Sized> StreamReader for Box<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }

    fn read_bit(&mut self) -> Result<u8> {
        (**self).read_bit()
    }

    fn read_bits(&mut self, n: u8) -> Result<u64> {
        (**self).read_bits(n)
    }

    fn read_bool(&mut self) -> Result<bool> {
        (**self).read_bool()
    }

    fn read_u32(&mut self) -> Result<u32> {
        (**self).read_u32()
    }

    fn align(&mut self) -> u8 {
        (**self).align()
    }

    fn bit_position(&self) -> u8 {
        (**self).bit_position()
    }

    fn mark(&mut self) {
        (**self).mark()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn length(&self) -> u64 {
        (**self).length()
    }

    fn stream_position(&self) -> u64 {
        (**self).stream_position()
    }
}

/// Resolve a seek request against a current position and a length.
///
/// Positions past the end are allowed; the next read reports end of data.
pub(crate) fn resolve_seek(pos: SeekFrom, current: u64, length: u64) -> Result<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => i128::from(offset),
        SeekFrom::Current(delta) => i128::from(current) + i128::from(delta),
        SeekFrom::End(delta) => i128::from(length) + i128::from(delta),
    };

    u64::try_from(target).map_err(|_| {
        crate::error::Error::InvalidArgument(format!(
            "seek to negative position {} ({:?})",
            target, pos
        ))
    })
}
