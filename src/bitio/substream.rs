//! Bounded window over another stream reader.
//!
//! A JBIG2 segment header declares the exact byte length of the segment
//! data. Region decoders get a [`SubstreamReader`] restricted to that window,
//! so a decoder can never run into the next segment's bytes: end of data is
//! reported exactly at the end of the window, however much data the parent
//! still has.

use std::io::{self, SeekFrom};

use super::cache::{BitCache, ByteSource, Checkpoint};
use super::{resolve_seek, StreamReader};
use crate::config::CodecOptions;
use crate::error::{Error, Result};

/// Parent reader plus the read-ahead buffer for the window `[offset, offset + length)`.
#[derive(Debug)]
struct Window<R> {
    parent: R,
    offset: u64,
    length: u64,
    /// Logical cursor relative to `offset`
    pos: u64,
    buffer: Vec<u8>,
    /// Logical position of `buffer[0]`
    buffer_base: u64,
    /// Logical position one past the last valid buffered byte
    buffer_top: u64,
}

impl<R: StreamReader> Window<R> {
    fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.pos)
    }

    /// Refill the buffer from the parent starting at the logical cursor.
    fn fill(&mut self) -> Result<()> {
        let absolute = self.offset + self.pos;
        if self.parent.stream_position() != absolute || self.parent.bit_position() != 0 {
            self.parent.seek(SeekFrom::Start(absolute))?;
        }

        let wanted = (self.buffer.len() as u64).min(self.remaining()) as usize;
        let mut filled = 0;
        while filled < wanted {
            match self.parent.read(&mut self.buffer[filled..wanted]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.is_end_of_data() => break,
                Err(e) => return Err(e),
            }
        }

        log::trace!(
            "Substream refill at {} (parent offset {}): {} of {} bytes",
            self.pos,
            absolute,
            filled,
            wanted
        );

        self.buffer_base = self.pos;
        self.buffer_top = self.pos + filled as u64;
        Ok(())
    }

    /// Make sure the byte at the cursor is buffered.
    fn ensure_buffered(&mut self) -> Result<()> {
        if self.pos >= self.length {
            return Err(Error::EndOfData);
        }
        if self.pos < self.buffer_base || self.pos >= self.buffer_top {
            self.fill()?;
            if self.pos >= self.buffer_top {
                // Parent ran out before the declared window did
                return Err(Error::EndOfData);
            }
        }
        Ok(())
    }

    /// The buffered bytes from the cursor onwards.
    fn buffered(&self) -> &[u8] {
        let start = (self.pos - self.buffer_base) as usize;
        let end = (self.buffer_top - self.buffer_base) as usize;
        &self.buffer[start..end]
    }
}

impl<R: StreamReader> ByteSource for Window<R> {
    #[inline]
    fn next_byte(&mut self) -> Result<u8> {
        self.ensure_buffered()?;
        let byte = self.buffer[(self.pos - self.buffer_base) as usize];
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

/// A [`StreamReader`] restricted to `length` bytes of a parent reader,
/// starting at `offset`.
///
/// The parent is held by value; pass `&mut parent` to keep using it
/// afterwards. Positions reported by the substream are relative to `offset`.
///
/// # Example
///
/// ```
/// use jbig2_oxide::bitio::{Reader, StreamReader, SubstreamReader};
///
/// let mut file = Reader::from_slice(&[0xAA, 0x01, 0x02, 0xBB]);
/// let mut segment = SubstreamReader::new(&mut file, 1, 2).unwrap();
/// assert_eq!(segment.read_byte().unwrap(), 0x01);
/// assert_eq!(segment.read_byte().unwrap(), 0x02);
/// assert!(segment.read_byte().unwrap_err().is_end_of_data());
/// ```
#[derive(Debug)]
pub struct SubstreamReader<R> {
    window: Window<R>,
    cache: BitCache,
    mark: Checkpoint,
}

impl<R: StreamReader> SubstreamReader<R> {
    /// Create a substream over `[offset, offset + length)` of `parent`.
    pub fn new(parent: R, offset: u64, length: u64) -> Result<Self> {
        Self::with_options(parent, offset, length, &CodecOptions::default())
    }

    /// Create a substream with an explicit read-ahead buffer size.
    pub fn with_options(
        parent: R,
        offset: u64,
        length: u64,
        options: &CodecOptions,
    ) -> Result<Self> {
        if offset.checked_add(length).is_none() {
            return Err(Error::InvalidArgument(format!(
                "substream window {}+{} overflows",
                offset, length
            )));
        }

        let buffer_size = options.substream_buffer_size.max(1);
        Ok(Self {
            window: Window {
                parent,
                offset,
                length,
                pos: 0,
                buffer: vec![0; buffer_size],
                buffer_base: 0,
                buffer_top: 0,
            },
            cache: BitCache::default(),
            mark: Checkpoint::default(),
        })
    }

    /// Offset of the window within the parent.
    pub fn offset(&self) -> u64 {
        self.window.offset
    }

    /// Whole bytes left before the end of the window, not counting cached bits.
    pub fn remaining(&self) -> u64 {
        self.window.remaining()
    }

    /// Borrow the parent reader.
    pub fn get_ref(&self) -> &R {
        &self.window.parent
    }

    /// Give back the parent reader.
    pub fn into_inner(self) -> R {
        self.window.parent
    }
}

impl<R: StreamReader> StreamReader for SubstreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.cache.bits() == 0 {
            let mut n = 0;
            while n < buf.len() {
                if let Err(e) = self.window.ensure_buffered() {
                    if e.is_end_of_data() && n > 0 {
                        break;
                    }
                    return Err(e);
                }
                let chunk = self.window.buffered();
                let take = chunk.len().min(buf.len() - n);
                buf[n..n + take].copy_from_slice(&chunk[..take]);
                self.window.pos += take as u64;
                n += take;
            }
            return Ok(n);
        }

        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.cache.read_byte(&mut self.window) {
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
        self.cache.read_byte(&mut self.window)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = resolve_seek(pos, self.window.pos, self.window.length)?;
        self.window.pos = target;
        self.cache.clear();
        Ok(target)
    }

    fn read_bit(&mut self) -> Result<u8> {
        self.cache.read_bit(&mut self.window)
    }

    fn read_bits(&mut self, n: u8) -> Result<u64> {
        self.cache.read_bits(&mut self.window, n)
    }

    fn align(&mut self) -> u8 {
        self.cache.align()
    }

    fn bit_position(&self) -> u8 {
        self.cache.bit_position()
    }

    fn mark(&mut self) {
        self.mark = Checkpoint {
            position: self.window.pos,
            cache: self.cache,
        };
    }

    fn reset(&mut self) {
        self.window.pos = self.mark.position;
        self.cache = self.mark.cache;
    }

    fn length(&self) -> u64 {
        self.window.length
    }

    fn stream_position(&self) -> u64 {
        self.window.pos
    }
}

impl<R: StreamReader> io::Read for SubstreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match StreamReader::read(self, buf) {
            Ok(n) => Ok(n),
            Err(Error::EndOfData) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: StreamReader> io::Seek for SubstreamReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(StreamReader::seek(self, pos)?)
    }
}
