//! Codec configuration for controlling strict/lenient decoding and buffer limits.

/// Default ceiling on a [`BufferWriter`](crate::bitio::BufferWriter) capacity.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 256 * 1024 * 1024;

/// Default size of the [`SubstreamReader`](crate::bitio::SubstreamReader) read-ahead buffer.
pub const DEFAULT_SUBSTREAM_BUFFER_SIZE: usize = 4096;

/// Codec options for controlling end-of-data handling and resource limits.
///
/// These options allow you to trade strict conformance to ITU-T T.88 for
/// broader compatibility with JBIG2 streams written by sloppy encoders.
///
/// # Example
///
/// ```
/// use jbig2_oxide::config::CodecOptions;
///
/// // Strict mode - truncated arithmetic data is an error (default)
/// let strict = CodecOptions::strict();
///
/// // Lenient mode - a missing end-of-data marker is synthesized
/// let lenient = CodecOptions::lenient();
///
/// // Custom configuration
/// let custom = CodecOptions {
///     strict: false,
///     max_buffer_size: 16 * 1024 * 1024,
///     substream_buffer_size: 512,
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Fail when arithmetic-coded data ends before its marker (true) or
    /// behave as if the marker had been read (false)
    ///
    /// Many encoders omit the trailing `0xFF 0xAC` marker and rely on the
    /// decoder feeding 1-bits once the segment is exhausted.
    pub strict: bool,

    /// Maximum capacity in bytes a buffer writer may grow to
    ///
    /// Default: 256 MB. Set to 0 to disable the check; growth that would
    /// overflow the address space is refused regardless.
    pub max_buffer_size: usize,

    /// Read-ahead buffer size of a substream reader, in bytes
    ///
    /// Values below 1 are treated as 1.
    pub substream_buffer_size: usize,
}

impl Default for CodecOptions {
    /// Default configuration: strict mode
    fn default() -> Self {
        Self::strict()
    }
}

impl CodecOptions {
    /// Strict mode: truncated arithmetic data is reported as an error
    pub fn strict() -> Self {
        Self {
            strict: true,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            substream_buffer_size: DEFAULT_SUBSTREAM_BUFFER_SIZE,
        }
    }

    /// Lenient mode: end of data before the marker decodes as the marker
    ///
    /// Use this for pulling images out of damaged or non-conforming PDFs.
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::strict()
        }
    }

    /// Set the buffer writer capacity limit (0 = unlimited).
    pub fn with_max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// Set the substream read-ahead buffer size.
    pub fn with_substream_buffer_size(mut self, size: usize) -> Self {
        self.substream_buffer_size = size;
        self
    }

    /// Largest capacity a buffer may grow to under these options.
    pub(crate) fn buffer_limit(&self) -> usize {
        if self.max_buffer_size == 0 {
            isize::MAX as usize
        } else {
            self.max_buffer_size.min(isize::MAX as usize)
        }
    }
}
