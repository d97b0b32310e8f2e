//! Adaptive binary arithmetic decoding.
//!
//! JBIG2 generic, refinement, text and symbol dictionary decoding all drive
//! the same MQ-coder (ITU-T T.88 Annex E, shared with JPEG 2000):
//! - [`ArithmeticDecoder`] - the INITDEC/DECODE/RENORMD/BYTEIN engine
//! - [`ContextStore`] - caller-owned per-context adaptive state
//! - [`qe_table`] - the 47-state probability estimation table
//!
//! The decoder never owns a probability model. Region decoders size a
//! [`ContextStore`] for their template, compute a context index per pixel or
//! symbol, and pass the store into every call.
//!
//! # Example
//!
//! ```
//! use jbig2_oxide::arithmetic::{ArithmeticDecoder, ContextStore};
//! use jbig2_oxide::bitio::{Reader, SubstreamReader};
//!
//! # fn main() -> jbig2_oxide::Result<()> {
//! let segment = [0x00, 0x00, 0x84, 0xC7, 0x3B, 0xFC, 0xFF, 0xAC, 0x00];
//! let data = SubstreamReader::new(Reader::from_slice(&segment), 2, 6)?;
//!
//! let mut decoder = ArithmeticDecoder::new(data)?;
//! let mut generic = ContextStore::new(1 << 16);
//! let mut iadw = ContextStore::new(512);
//!
//! let _pixel = decoder.decode_bit(&mut generic, 0x9B25)?;
//! let _width = decoder.decode_int(&mut iadw)?;
//! # Ok(())
//! # }
//! ```

mod context;
mod decoder;
pub mod qe_table;

pub use context::ContextStore;
pub use decoder::{ArithmeticDecoder, INT_CONTEXT_SIZE};
