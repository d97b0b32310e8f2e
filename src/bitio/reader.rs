//! Bit reader over an in-memory byte source.
//!
//! [`Reader`] owns its data as [`Bytes`], so cloning a reader or handing the
//! same buffer to several decoders never copies the image data.

use std::io::{self, SeekFrom};

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

use super::cache::{BitCache, ByteSource, Checkpoint};
use super::{resolve_seek, StreamReader};
use crate::error::{Error, Result};

/// Byte cursor over the reader's data.
#[derive(Debug, Clone)]
struct ByteCursor {
    data: Bytes,
    pos: u64,
}

impl ByteCursor {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.pos)
    }
}

impl ByteSource for ByteCursor {
    #[inline]
    fn next_byte(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos as usize).ok_or(Error::EndOfData)?;
        self.pos += 1;
        Ok(byte)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn set_position(&mut self, pos: u64) {
        self.pos = pos;
    }
}

/// Sequential and seekable bit reader over an immutable byte buffer.
///
/// Bits are read MSB-first, matching the bit order of JBIG2 segment data.
///
/// # Example
///
/// ```
/// use jbig2_oxide::bitio::{Reader, StreamReader};
///
/// let mut reader = Reader::from_slice(&[0b1011_0000, 0xFF]);
/// assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(reader.align(), 4);
/// assert_eq!(reader.read_byte().unwrap(), 0xFF);
/// assert!(reader.read_bit().unwrap_err().is_end_of_data());
/// ```
#[derive(Debug, Clone)]
pub struct Reader {
    src: ByteCursor,
    cache: BitCache,
    mark: Checkpoint,
}

impl Reader {
    /// Create a reader over `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            src: ByteCursor {
                data: data.into(),
                pos: 0,
            },
            cache: BitCache::default(),
            mark: Checkpoint::default(),
        }
    }

    /// Create a reader over a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Whole bytes left before the end of data, not counting cached bits.
    pub fn remaining(&self) -> u64 {
        self.src.remaining()
    }

    /// The underlying data.
    pub fn get_ref(&self) -> &Bytes {
        &self.src.data
    }
}

impl StreamReader for Reader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.cache.bits() == 0 {
            let available = self.src.remaining();
            if available == 0 {
                return Err(Error::EndOfData);
            }
            let n = buf.len().min(available as usize);
            let start = self.src.pos as usize;
            buf[..n].copy_from_slice(&self.src.data[start..start + n]);
            self.src.pos += n as u64;
            return Ok(n);
        }

        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.cache.read_byte(&mut self.src) {
                Ok(byte) => {
                    *slot = byte;
                    n += 1;
                },
                Err(e) if e.is_end_of_data() && n > 0 => break,
                Err(e) => return Err(e),
            }
        }
        Ok(n)
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.cache.read_byte(&mut self.src)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = resolve_seek(pos, self.src.pos, self.src.len())?;
        self.src.pos = target;
        self.cache.clear();
        Ok(target)
    }

    fn read_bit(&mut self) -> Result<u8> {
        self.cache.read_bit(&mut self.src)
    }

    fn read_bits(&mut self, n: u8) -> Result<u64> {
        self.cache.read_bits(&mut self.src, n)
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.cache.bits() == 0 && self.src.remaining() >= 4 {
            let start = self.src.pos as usize;
            let value = BigEndian::read_u32(&self.src.data[start..start + 4]);
            self.src.pos += 4;
            return Ok(value);
        }
        Ok(self.read_bits(32)? as u32)
    }

    fn align(&mut self) -> u8 {
        self.cache.align()
    }

    fn bit_position(&self) -> u8 {
        self.cache.bit_position()
    }

    fn mark(&mut self) {
        self.mark = Checkpoint {
            position: self.src.pos,
            cache: self.cache,
        };
    }

    fn reset(&mut self) {
        self.src.pos = self.mark.position;
        self.cache = self.mark.cache;
    }

    fn length(&self) -> u64 {
        self.src.len()
    }

    fn stream_position(&self) -> u64 {
        self.src.pos
    }
}

impl io::Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match StreamReader::read(self, buf) {
            Ok(n) => Ok(n),
            Err(Error::EndOfData) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl io::Seek for Reader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(StreamReader::seek(self, pos)?)
    }
}
