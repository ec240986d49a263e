use log::trace;

use crate::bitbuffer::BitBuffer;
use crate::error::CodecError;
use crate::xor::{ChimpXorCompressor, ElfXorCompressor, XorCompressor};
use crate::Result;

/// Largest `beta_star` the 4-bit field can carry.
pub const MAX_BETA_STAR: u8 = 15;

/// Writes the mode flags read by [`ElfDecompressor`](crate::ElfDecompressor)
/// in front of an XOR compressor.
///
/// Deciding whether a value can be replaced by an erased proxy is left to the
/// caller: [`add_value`](Self::add_value) stores a value verbatim, and
/// [`add_proxy`](Self::add_proxy) stores a proxy together with the
/// `beta_star` needed to restore it.
///
/// # Example
/// ```
/// use xorfloat::ElfCompressor;
///
/// let mut compressor = ElfCompressor::elf();
/// compressor.add_value(21.5).unwrap();
/// compressor.add_proxy(21.599999999, 3).unwrap();
/// compressor.close().unwrap();
/// assert_eq!(compressor.count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElfCompressor<C> {
    xor: C,
}

impl ElfCompressor<ElfXorCompressor> {
    /// Creates a front end over the Elf XOR layout.
    pub fn elf() -> Self {
        Self::new(ElfXorCompressor::new())
    }
}

impl ElfCompressor<ChimpXorCompressor> {
    /// Creates a front end over the Chimp XOR layout.
    pub fn chimp() -> Self {
        Self::new(ChimpXorCompressor::new())
    }
}

impl<C: XorCompressor> ElfCompressor<C> {
    /// Wraps an XOR compressor.
    pub fn new(xor: C) -> Self {
        Self { xor }
    }

    /// Appends `value` verbatim. Returns the bits written, flag included.
    pub fn add_value(&mut self, value: f64) -> Result<usize> {
        self.ensure_open()?;
        self.xor.output_mut().write_bit(false);
        Ok(1 + self.xor.add_value(value.to_bits())?)
    }

    /// Appends a proxy that restores to the original value with `beta_star`.
    pub fn add_proxy(&mut self, v_prime: f64, beta_star: u8) -> Result<usize> {
        if beta_star > MAX_BETA_STAR {
            return Err(CodecError::InvalidBetaStar(beta_star));
        }
        self.ensure_open()?;
        let out = self.xor.output_mut();
        out.write_bit(true);
        out.write_bits(beta_star as u64, 4);
        Ok(5 + self.xor.add_value(v_prime.to_bits())?)
    }

    /// Terminates the block. Returns the bits written for the final flag and
    /// the sentinel.
    pub fn close(&mut self) -> Result<usize> {
        self.ensure_open()?;
        self.xor.output_mut().write_bit(false);
        let size = 1 + self.xor.close()?;
        trace!("elf front end closed after {} values", self.xor.count());
        Ok(size)
    }

    /// Clears the block for reuse.
    pub fn refresh(&mut self) {
        self.xor.refresh();
    }

    /// Number of values in the current block.
    pub fn count(&self) -> usize {
        self.xor.count()
    }

    /// Bits written to the current block, flags included.
    pub fn bits(&self) -> usize {
        self.xor.bits()
    }

    /// The compressed bytes; complete once `close()` has returned.
    pub fn bytes(&self) -> &[u8] {
        self.xor.bytes()
    }

    /// The block written so far.
    pub fn output(&self) -> &BitBuffer {
        self.xor.output()
    }

    /// Returns the wrapped XOR compressor.
    pub fn into_inner(self) -> C {
        self.xor
    }

    fn ensure_open(&self) -> Result<()> {
        if self.xor.is_closed() {
            Err(CodecError::Closed)
        } else {
            Ok(())
        }
    }
}
