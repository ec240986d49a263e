//! XOR-delta bit packing shared by the Chimp and Elf layouts.
//!
//! Both variants XOR each value against the previous one and elide the
//! leading and trailing zero runs of the result. Leading-zero counts are
//! rounded down to one of eight buckets so they fit a 3-bit code:
//!
//! | bucket | 0 | 8 | 12 | 16 | 18 | 20 | 22 | 24 |
//! |--------|---|---|----|----|----|----|----|----|
//! | code   | 0 | 1 | 2  | 3  | 4  | 5  | 6  | 7  |

pub mod chimp;
pub mod elf;

use log::debug;

use crate::bitbuffer::{BitBuffer, BitReader};
use crate::error::CodecError;
use crate::Result;

pub use chimp::{ChimpXorCompressor, ChimpXorDecompressor};
pub use elf::{ElfXorCompressor, ElfXorDecompressor};

/// Leading-zero count of an XOR → 3-bit bucket code.
pub const LEADING_REPRESENTATION: [u8; 64] = [
    0, 0, 0, 0, 0, 0, 0, 0, //
    1, 1, 1, 1, 2, 2, 2, 2, //
    3, 3, 4, 4, 5, 5, 6, 6, //
    7, 7, 7, 7, 7, 7, 7, 7, //
    7, 7, 7, 7, 7, 7, 7, 7, //
    7, 7, 7, 7, 7, 7, 7, 7, //
    7, 7, 7, 7, 7, 7, 7, 7, //
    7, 7, 7, 7, 7, 7, 7, 7, //
];

/// Leading-zero count of an XOR → bucket it is rounded down to.
pub const LEADING_ROUND: [u8; 64] = [
    0, 0, 0, 0, 0, 0, 0, 0, //
    8, 8, 8, 8, 12, 12, 12, 12, //
    16, 16, 18, 18, 20, 20, 22, 22, //
    24, 24, 24, 24, 24, 24, 24, 24, //
    24, 24, 24, 24, 24, 24, 24, 24, //
    24, 24, 24, 24, 24, 24, 24, 24, //
    24, 24, 24, 24, 24, 24, 24, 24, //
    24, 24, 24, 24, 24, 24, 24, 24, //
];

/// 3-bit bucket code → leading-zero count.
pub const LEADING_BUCKETS: [u8; 8] = [0, 8, 12, 16, 18, 20, 22, 24];

/// Marks an empty zero-run window. Never equal to a rounded count.
pub(crate) const NO_WINDOW: u32 = u32::MAX;

/// Rounded leading-zero count of a non-zero XOR.
#[inline]
pub(crate) fn rounded_leading_zeros(xor: u64) -> u32 {
    LEADING_ROUND[xor.leading_zeros() as usize] as u32
}

/// 3-bit code of an already-rounded leading-zero count.
#[inline]
pub(crate) fn leading_code(rounded: u32) -> u64 {
    LEADING_REPRESENTATION[rounded as usize] as u64
}

/// Per-block state owned by one compressor or decompressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Session {
    pub stored_val: u64,
    pub stored_leading_zeros: u32,
    /// Only the Elf layout remembers a trailing boundary.
    pub stored_trailing_zeros: u32,
    pub first: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            stored_val: 0,
            stored_leading_zeros: NO_WINDOW,
            stored_trailing_zeros: NO_WINDOW,
            first: true,
        }
    }
}

/// Writes 64-bit patterns into a block, one at a time, in arrival order.
///
/// A block is terminated by [`close`](XorCompressor::close), which appends
/// [`END_SIGN`](crate::decimal::END_SIGN). Feeding `END_SIGN` itself through
/// [`add_value`](XorCompressor::add_value) truncates the block at that point
/// when it is decoded.
pub trait XorCompressor {
    /// Appends the next pattern and returns the number of bits written.
    fn add_value(&mut self, value: u64) -> Result<usize>;

    /// Appends the end-of-stream sentinel, pads, and flushes to a byte
    /// boundary. Returns the bits written for the sentinel.
    fn close(&mut self) -> Result<usize>;

    /// Resets the session and clears the buffer for the next block.
    fn refresh(&mut self);

    /// Returns `true` once `close()` has been called on this block.
    fn is_closed(&self) -> bool;

    /// Number of values added to the current block.
    fn count(&self) -> usize;

    /// The block written so far.
    fn output(&self) -> &BitBuffer;

    /// Direct access to the output, for framing bits written between values.
    fn output_mut(&mut self) -> &mut BitBuffer;

    /// The compressed bytes; complete once `close()` has returned.
    fn bytes(&self) -> &[u8] {
        self.output().as_bytes()
    }

    /// Total bits written to the current block.
    fn bits(&self) -> usize {
        self.output().len_bits()
    }
}

/// Reads back the patterns written by the matching [`XorCompressor`].
pub trait XorDecompressor {
    /// Binds a new block and resets the session.
    fn set_bytes(&mut self, bytes: Vec<u8>);

    /// Decodes the next pattern, or `None` once the sentinel is reached.
    fn read_value(&mut self) -> Result<Option<u64>>;

    /// Resets the session and rewinds to the start of the bound block.
    fn refresh(&mut self);

    /// The bound input, for framing bits read between values.
    fn input_mut(&mut self) -> Result<&mut BitReader>;

    /// Decodes every pattern up to the sentinel.
    fn read_all(&mut self) -> Result<Vec<u64>> {
        let mut values = Vec::new();
        while let Some(value) = self.read_value()? {
            values.push(value);
        }
        Ok(values)
    }
}

/// Reads an `n`-bit field, failing on a truncated stream.
pub(crate) fn read_field(input: &mut BitReader, n: u8) -> Result<u64> {
    input.read_bits(n).ok_or(CodecError::UnexpectedEnd {
        requested: n,
        available: input.remaining(),
    })
}

pub(crate) fn malformed(reason: &str, position: usize) -> CodecError {
    debug!("malformed block at bit {position}: {reason}");
    CodecError::InvalidData(format!("{reason} at bit {position}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_agree() {
        for lz in 0..64usize {
            let rounded = LEADING_ROUND[lz];
            let code = LEADING_REPRESENTATION[lz];
            assert!(rounded as usize <= lz);
            assert_eq!(LEADING_BUCKETS[code as usize], rounded);
            assert_eq!(LEADING_REPRESENTATION[rounded as usize], code);
        }
    }

    #[test]
    fn test_rounded_leading_zeros() {
        assert_eq!(rounded_leading_zeros(u64::MAX), 0);
        assert_eq!(rounded_leading_zeros(1 << 52), 8);
        assert_eq!(rounded_leading_zeros(1 << 48), 12);
        assert_eq!(rounded_leading_zeros(1 << 44), 18);
        assert_eq!(rounded_leading_zeros(1), 24);
    }

    #[test]
    fn test_read_field_reports_remaining() {
        let mut input = BitReader::new(vec![0xAB]);
        assert_eq!(read_field(&mut input, 4), Ok(0xA));
        assert_eq!(
            read_field(&mut input, 6),
            Err(CodecError::UnexpectedEnd {
                requested: 6,
                available: 4
            })
        );
    }
}
