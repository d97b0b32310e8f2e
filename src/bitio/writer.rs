//! Growable bit-oriented buffer writer.
//!
//! [`BufferWriter`] packs bits MSB-first or LSB-first (fixed at construction)
//! into a byte buffer. Byte writes take a plain copy path when the cursor is
//! byte-aligned; otherwise each byte is split across two buffer bytes.
//!
//! # Growth
//!
//! Growth mirrors an arena: a request that fits the current capacity only
//! extends the logical length; otherwise the capacity becomes
//! `2 * capacity + increment`. An empty buffer starts at 64 bytes. Requests
//! that would overflow the address space, exceed
//! [`CodecOptions::max_buffer_size`] or fail to allocate are refused and
//! leave the buffer as it was.
//! [`BufferWriter::reset`] truncates without giving memory back.

use std::io;

use super::{BinaryWriter, BitOrder, BitPosition, BitWriter};
use crate::config::CodecOptions;
use crate::error::{Error, Result};

/// Initial allocation of an empty buffer.
pub(crate) const SMALL_BUFFER_SIZE: usize = 64;

/// Bit-oriented writer over a growable byte buffer.
///
/// # Example
///
/// ```
/// use jbig2_oxide::bitio::{BinaryWriter, BitOrder, BitWriter, BufferWriter};
///
/// let mut writer = BufferWriter::new(BitOrder::Msb);
/// writer.write_bits(0b1011, 4).unwrap();
/// writer.finish_byte();
/// writer.write_byte(0xFF).unwrap();
/// assert_eq!(writer.data(), &[0xB0, 0xFF]);
/// ```
#[derive(Debug, Clone)]
pub struct BufferWriter {
    /// Written bytes; a partially filled current byte is included
    data: Vec<u8>,
    byte_index: usize,
    /// Next bit within the current byte, counted in write order (0-7)
    bit_index: u8,
    order: BitOrder,
    /// Largest capacity the buffer may grow to
    limit: usize,
}

impl Default for BufferWriter {
    fn default() -> Self {
        Self::new(BitOrder::Msb)
    }
}

impl BufferWriter {
    /// Create an empty writer with the given bit order.
    pub fn new(order: BitOrder) -> Self {
        Self::with_options(order, &CodecOptions::default())
    }

    /// Create an empty writer honoring the buffer limit in `options`.
    pub fn with_options(order: BitOrder, options: &CodecOptions) -> Self {
        Self {
            data: Vec::new(),
            byte_index: 0,
            bit_index: 0,
            order,
            limit: options.buffer_limit(),
        }
    }

    /// Bit order fixed at construction.
    pub fn bit_order(&self) -> BitOrder {
        self.order
    }

    /// Current cursor position.
    pub fn position(&self) -> BitPosition {
        BitPosition {
            byte_index: self.byte_index,
            bit_index: self.bit_index,
        }
    }

    /// Number of bytes in the buffer, including a partially written byte.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes that can still be appended before the buffer has to grow.
    pub fn remaining_capacity(&self) -> usize {
        self.data.capacity() - self.data.len()
    }

    /// Allocated capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Truncate to zero length, keeping the allocation for reuse.
    pub fn reset(&mut self) {
        self.data.clear();
        self.byte_index = 0;
        self.bit_index = 0;
    }

    /// Consume the writer and return the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn refuse(&self, requested: usize) -> Error {
        log::warn!(
            "Refusing to grow buffer: capacity {} bytes, {} more requested, limit {} bytes",
            self.data.capacity(),
            requested,
            self.limit
        );
        Error::CapacityOverflow {
            capacity: self.data.capacity(),
            requested,
            limit: self.limit,
        }
    }

    /// Make room for `n` more bytes past the current length.
    fn grow(&mut self, n: usize) -> Result<()> {
        let len = self.data.len();
        let cap = self.data.capacity();
        let required = match len.checked_add(n) {
            Some(required) if required <= self.limit => required,
            _ => return Err(self.refuse(n)),
        };
        if required <= cap {
            return Ok(());
        }

        let new_cap = if cap == 0 && required <= SMALL_BUFFER_SIZE {
            SMALL_BUFFER_SIZE.min(self.limit)
        } else {
            let max = isize::MAX as usize;
            // Same as checking `cap > max - cap - n` without underflow
            let doubled = cap
                .checked_mul(2)
                .and_then(|c| c.checked_add(n))
                .filter(|&c| c <= max)
                .ok_or_else(|| self.refuse(n))?;
            doubled.min(self.limit).max(required)
        };

        self.data
            .try_reserve_exact(new_cap - len)
            .map_err(|_| self.refuse(n))?;
        Ok(())
    }

    /// Extend the logical length to at least `end` bytes with zero fill.
    fn ensure_len(&mut self, end: usize) -> Result<()> {
        let len = self.data.len();
        if end > len {
            self.grow(end - len)?;
            self.data.resize(end, 0);
        }
        Ok(())
    }

    #[inline]
    fn advance_bit(&mut self) {
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }
    }

    /// Split `byte` across the current and the next buffer byte.
    fn write_unaligned_byte(&mut self, byte: u8) {
        let shift = self.bit_index;
        let i = self.byte_index;
        match self.order {
            BitOrder::Msb => {
                // Current byte keeps its high `shift` bits, next byte its low bits
                self.data[i] = (self.data[i] & (0xFF << (8 - shift))) | (byte >> shift);
                self.data[i + 1] = (self.data[i + 1] & (0xFF >> shift)) | (byte << (8 - shift));
            },
            BitOrder::Lsb => {
                self.data[i] = (self.data[i] & (0xFF >> (8 - shift))) | (byte << shift);
                self.data[i + 1] = (self.data[i + 1] & (0xFF << shift)) | (byte >> (8 - shift));
            },
        }
        self.byte_index += 1;
    }
}

impl BitWriter for BufferWriter {
    fn write_bit(&mut self, bit: u8) -> Result<()> {
        if bit > 1 {
            return Err(Error::InvalidArgument(format!("bit value must be 0 or 1, got {}", bit)));
        }

        self.ensure_len(self.byte_index + 1)?;
        let shift = match self.order {
            BitOrder::Msb => 7 - self.bit_index,
            BitOrder::Lsb => self.bit_index,
        };
        let byte = &mut self.data[self.byte_index];
        *byte = (*byte & !(1 << shift)) | (bit << shift);
        self.advance_bit();
        Ok(())
    }

    fn write_bits(&mut self, value: u64, count: usize) -> Result<usize> {
        if count > 64 {
            return Err(Error::InvalidArgument(format!(
                "bit count must be in range 0..=64, got {}",
                count
            )));
        }

        let full_bytes = count / 8;
        let rest = count % 8;

        // Whole bytes come from the high end, above the `rest` trailing bits
        for i in (0..full_bytes).rev() {
            let byte = (value >> (i * 8 + rest)) as u8;
            self.write_byte(byte)?;
        }

        let mut bits = value;
        for i in 0..rest {
            let bit = match self.order {
                BitOrder::Msb => (bits >> (rest - 1 - i)) & 1,
                BitOrder::Lsb => {
                    let bit = bits & 1;
                    bits >>= 1;
                    bit
                },
            };
            self.write_bit(bit as u8)?;
        }

        Ok(full_bytes)
    }

    fn finish_byte(&mut self) {
        if self.bit_index != 0 {
            self.bit_index = 0;
            self.byte_index += 1;
        }
    }

    fn skip_bits(&mut self, n: i64) -> Result<()> {
        let target = self.position().absolute_bits() as i128 + i128::from(n);
        if target < 0 {
            return Err(Error::InvalidArgument(format!(
                "cannot skip {} bits from bit offset {}",
                n,
                self.position().absolute_bits()
            )));
        }

        let byte_index = usize::try_from(target / 8)
            .map_err(|_| Error::InvalidArgument(format!("bit offset {} out of range", target)))?;
        let bit_index = (target % 8) as u8;

        let needed = byte_index
            .checked_add(usize::from(bit_index != 0))
            .ok_or_else(|| Error::InvalidArgument(format!("bit offset {} out of range", target)))?;
        self.ensure_len(needed)?;

        self.byte_index = byte_index;
        self.bit_index = bit_index;
        Ok(())
    }
}

impl BinaryWriter for BufferWriter {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        if self.bit_index == 0 {
            self.ensure_len(self.byte_index + 1)?;
            self.data[self.byte_index] = byte;
            self.byte_index += 1;
            return Ok(());
        }

        self.ensure_len(self.byte_index + 2)?;
        self.write_unaligned_byte(byte);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }

        if self.bit_index == 0 {
            let end = self.byte_index + bytes.len();
            self.ensure_len(end)?;
            self.data[self.byte_index..end].copy_from_slice(bytes);
            self.byte_index = end;
            return Ok(bytes.len());
        }

        self.ensure_len(self.byte_index + bytes.len() + 1)?;
        for &byte in bytes {
            self.write_unaligned_byte(byte);
        }
        Ok(bytes.len())
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
