//! Error types for the JBIG2 codec substrate.
//!
//! This module defines all error types that can occur while reading or writing
//! bit streams and while running the arithmetic decoder.
//!
//! End of data is deliberately not split into "expected" and "truncated":
//! a reader only knows that its window is exhausted, and the caller decides
//! whether that is the natural end of a field or a corrupt segment.

use std::io;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during bit-level I/O and arithmetic decoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument was outside its accepted range (bit value, bit count,
    /// negative seek target, context index).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A read was attempted past the end of the stream or substream window.
    #[error("End of data reached")]
    EndOfData,

    /// Buffer growth was refused because the new capacity would overflow or
    /// exceed the configured limit. The buffer is left unmodified.
    #[error("Buffer growth refused: {requested} more bytes at capacity {capacity}, limit {limit}")]
    CapacityOverflow {
        /// Capacity of the buffer at the time of the request
        capacity: usize,
        /// Number of additional bytes requested
        requested: usize,
        /// Largest capacity the buffer may reach
        limit: usize,
    },

    /// Arithmetic decoding produced a value the caller cannot represent.
    #[error("Arithmetic decoding error: {0}")]
    Decode(String),
}

impl Error {
    /// Returns true if this error marks the end of the readable data.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::EndOfData)
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::EndOfData => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            Error::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
            Error::CapacityOverflow { .. } => io::Error::new(io::ErrorKind::OutOfMemory, e),
            Error::Decode(_) => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
