//! Error types for XOR compression and decompression.

use thiserror::Error;

/// Errors that can occur while writing or reading a compressed block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The compressed stream ended before a complete field could be read.
    #[error("unexpected end of compressed stream: needed {requested} bits, {available} available")]
    UnexpectedEnd {
        /// Width of the field being read.
        requested: u8,
        /// Bits left in the bound buffer.
        available: usize,
    },

    /// A value was requested before any bytes were bound.
    #[error("no compressed bytes bound; call set_bytes() first")]
    Unbound,

    /// A value was added after `close()`.
    #[error("block is closed; call refresh() before adding values")]
    Closed,

    /// A value was requested after the end-of-stream sentinel.
    #[error("end of block already reached; call refresh() or set_bytes()")]
    Exhausted,

    /// The stream contains a code that no encoder produces.
    #[error("invalid encoded data: {0}")]
    InvalidData(String),

    /// `betaStar` must fit in 4 bits.
    #[error("beta star {0} exceeds maximum of 15")]
    InvalidBetaStar(u8),
}
