//! # JBIG2 Oxide
//!
//! Bit-level codec substrate for JBIG2 (ITU-T T.88 / ISO/IEC 14492), the
//! bi-level image compression used by scanned and fax PDFs.
//!
//! ## Core Features
//!
//! - **Bit Writer**: growable buffer with MSB-first or LSB-first packing,
//!   cursor skipping and capacity guards
//! - **Stream Reader**: bit/byte reads, seeking and mark/reset over an
//!   immutable byte source
//! - **Substream Reader**: a bounded window over any reader, so a segment
//!   decoder can never read into the next segment
//! - **MQ Arithmetic Decoder**: bit-exact T.88 Annex E decoding against
//!   caller-owned adaptive context state, plus the IAx/IAID integer procedures
//!
//! Segment header parsing and the region algorithms (generic, refinement,
//! text, halftone) are built on top of this crate and live elsewhere.
//!
//! ## Quick Start
//!
//! ```
//! use jbig2_oxide::bitio::{BitOrder, BitWriter, BinaryWriter, BufferWriter, Reader, StreamReader};
//!
//! # fn main() -> jbig2_oxide::Result<()> {
//! let mut writer = BufferWriter::new(BitOrder::Msb);
//! writer.write_bits(0b101, 3)?;
//! writer.write_byte(0xC3)?;
//! writer.finish_byte();
//!
//! let mut reader = Reader::new(writer.into_inner());
//! assert_eq!(reader.read_bits(3)?, 0b101);
//! assert_eq!(reader.read_byte()?, 0xC3);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Bit-level stream I/O
pub mod bitio;

// MQ arithmetic decoding
pub mod arithmetic;

pub use arithmetic::{ArithmeticDecoder, ContextStore};
pub use bitio::{BitOrder, BitPosition, BufferWriter, Reader, StreamReader, SubstreamReader};
pub use config::CodecOptions;
pub use error::{Error, Result};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
