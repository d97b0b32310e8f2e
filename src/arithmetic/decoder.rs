//! MQ arithmetic decoder (ITU-T T.88 Annex E).
//!
//! The decoder owns only the A, C and CT registers plus the last byte read.
//! Probability models live in caller-owned [`ContextStore`]s, so a single
//! decoder can drive any number of independent models over one byte stream.

use std::io::SeekFrom;

use super::context::ContextStore;
use super::qe_table::QE_TABLE;
use crate::bitio::StreamReader;
use crate::config::CodecOptions;
use crate::error::{Error, Result};

/// Contexts required by [`ArithmeticDecoder::decode_int`].
pub const INT_CONTEXT_SIZE: usize = 512;

/// Value ranges of the IAx integer procedure: (value bits, offset), one per prefix.
const INT_RANGES: [(u32, i64); 6] = [(2, 0), (4, 4), (6, 20), (8, 84), (12, 340), (32, 4436)];

/// Adaptive binary arithmetic decoder over a [`StreamReader`].
///
/// The registers are seeded at construction (INITDEC), which reads the
/// first two bytes of the stream. Once the `0xFF` + `0x90..=0xFF` marker is
/// seen the decoder stops consuming input and feeds itself 1-bits, so
/// decoding past the logical end of a well-formed stream never fails. The
/// reader is left positioned on the marker's `0xFF`.
///
/// # Example
///
/// ```
/// use jbig2_oxide::arithmetic::{ArithmeticDecoder, ContextStore};
/// use jbig2_oxide::bitio::Reader;
///
/// let data = [0x84, 0xC7, 0x3B, 0xFC, 0xE1, 0xA1, 0x43, 0x04, 0xFF, 0xAC];
/// let mut decoder = ArithmeticDecoder::new(Reader::from_slice(&data)).unwrap();
/// let mut contexts = ContextStore::new(512);
///
/// let bit = decoder.decode_bit(&mut contexts, 0).unwrap();
/// assert_eq!(bit, 0);
/// ```
#[derive(Debug)]
pub struct ArithmeticDecoder<R> {
    reader: R,
    /// Interval width
    a: u32,
    /// Code register
    c: u32,
    /// Bits left in the low half of C before the next BYTEIN
    ct: u32,
    /// Last byte read
    b: u8,
    marker: bool,
    strict: bool,
}

impl<R: StreamReader> ArithmeticDecoder<R> {
    /// Create a strict decoder: running out of input before the marker is an error.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, &CodecOptions::default())
    }

    /// Create a decoder with the given end-of-data policy.
    pub fn with_options(reader: R, options: &CodecOptions) -> Result<Self> {
        let mut decoder = Self {
            reader,
            a: 0,
            c: 0,
            ct: 0,
            b: 0,
            marker: false,
            strict: options.strict,
        };
        decoder.init()?;
        Ok(decoder)
    }

    /// INITDEC
    fn init(&mut self) -> Result<()> {
        self.b = match self.next_input()? {
            Some(byte) => byte,
            None => {
                self.marker = true;
                0xFF
            },
        };
        self.c = u32::from(self.b) << 16;
        self.byte_in()?;
        self.c <<= 7;
        self.ct -= 7;
        self.a = 0x8000;

        log::debug!(
            "Arithmetic decoder initialized: A={:#06x} C={:#010x} CT={}",
            self.a,
            self.c,
            self.ct
        );
        Ok(())
    }

    /// Fetch the next input byte; `None` means a lenient decoder ran out of data.
    fn next_input(&mut self) -> Result<Option<u8>> {
        match self.reader.read_byte() {
            Ok(byte) => Ok(Some(byte)),
            Err(e) if e.is_end_of_data() && !self.strict => {
                log::warn!("Arithmetic data truncated before end marker, padding with 1-bits");
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    /// BYTEIN
    fn byte_in(&mut self) -> Result<()> {
        if self.marker {
            self.c = self.c.wrapping_add(0xFF00);
            self.ct = 8;
            return Ok(());
        }

        if self.b == 0xFF {
            match self.next_input()? {
                Some(next) if next <= 0x8F => {
                    self.b = next;
                    self.c = self.c.wrapping_add(u32::from(next) << 9);
                    self.ct = 7;
                },
                Some(next) => {
                    log::debug!("Arithmetic end marker 0xFF{:02X} reached", next);
                    // Leave the reader on the marker's 0xFF
                    self.reader.seek(SeekFrom::Current(-2))?;
                    self.marker = true;
                    self.c = self.c.wrapping_add(0xFF00);
                    self.ct = 8;
                },
                None => {
                    self.marker = true;
                    self.c = self.c.wrapping_add(0xFF00);
                    self.ct = 8;
                },
            }
        } else {
            match self.next_input()? {
                Some(next) => {
                    self.b = next;
                    self.c = self.c.wrapping_add(u32::from(next) << 8);
                    self.ct = 8;
                },
                None => {
                    self.marker = true;
                    self.c = self.c.wrapping_add(0xFF00);
                    self.ct = 8;
                },
            }
        }
        Ok(())
    }

    /// RENORMD
    fn renormalize(&mut self) -> Result<()> {
        loop {
            if self.ct == 0 {
                self.byte_in()?;
            }
            self.a <<= 1;
            self.c <<= 1;
            self.ct -= 1;
            if self.a & 0x8000 != 0 {
                return Ok(());
            }
        }
    }

    /// Decode one binary decision using context `cx` of `store`.
    ///
    /// The context's state and MPS are updated in place. Fails with
    /// `InvalidArgument` when `cx` is outside the store, or with the reader's
    /// error when input runs out before the end marker in strict mode.
    pub fn decode_bit(&mut self, store: &mut ContextStore, cx: usize) -> Result<u8> {
        store.check_index(cx)?;
        let (index, mps) = store.get(cx);
        let entry = &QE_TABLE[index];
        let qe = entry.qe;

        self.a -= qe;
        if (self.c >> 16) < qe {
            // LPS exchange
            let bit = if self.a < qe {
                store.put(cx, entry.nmps, mps);
                mps
            } else {
                let next_mps = if entry.switch { mps ^ 1 } else { mps };
                store.put(cx, entry.nlps, next_mps);
                mps ^ 1
            };
            self.a = qe;
            self.renormalize()?;
            Ok(bit)
        } else {
            self.c -= qe << 16;
            if self.a & 0x8000 != 0 {
                return Ok(mps);
            }

            // MPS exchange
            let bit = if self.a < qe {
                let next_mps = if entry.switch { mps ^ 1 } else { mps };
                store.put(cx, entry.nlps, next_mps);
                mps ^ 1
            } else {
                store.put(cx, entry.nmps, mps);
                mps
            };
            self.renormalize()?;
            Ok(bit)
        }
    }

    /// Decode one decision using the store's [selected](ContextStore::select) context.
    pub fn decode_selected(&mut self, store: &mut ContextStore) -> Result<u8> {
        let cx = store.selected();
        self.decode_bit(store, cx)
    }

    /// Decode a signed integer with the IAx procedure (T.88 Annex A.2).
    ///
    /// Returns `None` for the out-of-band value. `store` must hold at least
    /// [`INT_CONTEXT_SIZE`] contexts and should be dedicated to one integer
    /// type (IADH, IADW, IAEX, ...).
    pub fn decode_int(&mut self, store: &mut ContextStore) -> Result<Option<i32>> {
        if store.len() < INT_CONTEXT_SIZE {
            return Err(Error::InvalidArgument(format!(
                "integer decoding needs {} contexts, store has {}",
                INT_CONTEXT_SIZE,
                store.len()
            )));
        }

        let mut prev = 1usize;
        let sign = self.decode_int_bit(store, &mut prev)?;

        let mut range = INT_RANGES[INT_RANGES.len() - 1];
        for &candidate in &INT_RANGES[..INT_RANGES.len() - 1] {
            if self.decode_int_bit(store, &mut prev)? == 0 {
                range = candidate;
                break;
            }
        }

        let (bits, offset) = range;
        let mut value: i64 = 0;
        for _ in 0..bits {
            value = (value << 1) | i64::from(self.decode_int_bit(store, &mut prev)?);
        }
        value += offset;

        if sign == 1 {
            if value == 0 {
                return Ok(None);
            }
            value = -value;
        }

        i32::try_from(value)
            .map(Some)
            .map_err(|_| Error::Decode(format!("decoded integer {} out of range", value)))
    }

    fn decode_int_bit(&mut self, store: &mut ContextStore, prev: &mut usize) -> Result<u8> {
        let bit = self.decode_bit(store, *prev)?;
        let shifted = (*prev << 1) | usize::from(bit);
        *prev = if *prev < 0x100 {
            shifted
        } else {
            (shifted & 0x1FF) | 0x100
        };
        Ok(bit)
    }

    /// Decode a `code_len`-bit symbol ID with the IAID procedure (T.88 Annex A.3).
    ///
    /// `store` must hold at least `2^code_len` contexts.
    pub fn decode_iaid(&mut self, code_len: u32, store: &mut ContextStore) -> Result<u32> {
        if code_len > 31 {
            return Err(Error::InvalidArgument(format!(
                "symbol code length must be at most 31, got {}",
                code_len
            )));
        }
        let limit = 1usize << code_len;
        if store.len() < limit {
            return Err(Error::InvalidArgument(format!(
                "symbol ID decoding with code length {} needs {} contexts, store has {}",
                code_len,
                limit,
                store.len()
            )));
        }

        let mut prev = 1usize;
        for _ in 0..code_len {
            prev = (prev << 1) | usize::from(self.decode_bit(store, prev)?);
        }
        Ok((prev - limit) as u32)
    }

    /// Interval register A.
    pub fn a(&self) -> u32 {
        self.a
    }

    /// Code register C.
    pub fn c(&self) -> u32 {
        self.c
    }

    /// Bit countdown CT.
    pub fn ct(&self) -> u32 {
        self.ct
    }

    /// Returns true once the end marker has been seen (or synthesized in lenient mode).
    pub fn marker_reached(&self) -> bool {
        self.marker
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consume the decoder, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
