use log::trace;

use crate::decimal::{decimal_exponent, pow10, round_up};
use crate::error::CodecError;
use crate::xor::{read_field, ChimpXorDecompressor, ElfXorDecompressor, XorDecompressor};
use crate::Result;

/// Rebuilds an original value from its erased proxy `v_prime`.
///
/// With `sp = floor(log10(|v_prime|))`, a `beta_star` of zero yields
/// `10^(-sp-1)` carrying the sign of `v_prime`; any other `beta_star` rounds
/// `v_prime` away from zero to `beta_star - sp - 1` decimal places.
///
/// # Example
/// ```
/// use xorfloat::decoder::restore;
///
/// assert_eq!(restore(23.449999999999, 4).unwrap(), 23.45);
/// assert_eq!(restore(100.0, 0).unwrap(), 0.001);
/// ```
pub fn restore(v_prime: f64, beta_star: u8) -> Result<f64> {
    let sp = decimal_exponent(v_prime)
        .ok_or_else(|| CodecError::InvalidData(format!("proxy value {v_prime} has no exponent")))?;
    if beta_star == 0 {
        let v = pow10(-sp - 1);
        Ok(if v_prime < 0.0 { -v } else { v })
    } else {
        let alpha = beta_star as i32 - sp - 1;
        Ok(round_up(v_prime, alpha))
    }
}

/// The Elf decompressor.
///
/// Each value is prefixed by a 1-bit mode flag. `0` means the next XOR
/// pattern is the value itself; `1` is followed by a 4-bit `beta_star` and
/// the pattern is a proxy passed through [`restore`].
///
/// # Example
/// ```
/// use xorfloat::{ElfCompressor, ElfDecompressor};
///
/// let mut compressor = ElfCompressor::elf();
/// compressor.add_value(12.0).unwrap();
/// compressor.add_proxy(23.449999999999, 4).unwrap();
/// compressor.close().unwrap();
///
/// let mut decompressor = ElfDecompressor::elf();
/// decompressor.set_bytes(compressor.bytes().to_vec());
/// assert_eq!(decompressor.decompress().unwrap(), vec![12.0, 23.45]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElfDecompressor<D> {
    xor: D,
    finished: bool,
}

impl ElfDecompressor<ElfXorDecompressor> {
    /// Creates a decompressor over the Elf XOR layout.
    pub fn elf() -> Self {
        Self::new(ElfXorDecompressor::new())
    }
}

impl ElfDecompressor<ChimpXorDecompressor> {
    /// Creates a decompressor over the Chimp XOR layout.
    pub fn chimp() -> Self {
        Self::new(ChimpXorDecompressor::new())
    }
}

impl<D: XorDecompressor> ElfDecompressor<D> {
    /// Wraps an XOR decompressor.
    pub fn new(xor: D) -> Self {
        Self {
            xor,
            finished: false,
        }
    }

    /// Binds a new block for a fresh read pass.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.xor.set_bytes(bytes);
        self.finished = false;
    }

    /// Resets the session and rewinds to the start of the bound block.
    pub fn refresh(&mut self) {
        self.xor.refresh();
        self.finished = false;
    }

    /// Returns the wrapped XOR decompressor.
    pub fn into_inner(self) -> D {
        self.xor
    }

    /// Decodes the next value, or `None` at the end of the block.
    ///
    /// A malformed block fails once with the underlying error; later calls
    /// return [`CodecError::Exhausted`] until `set_bytes` or `refresh`.
    pub fn next_value(&mut self) -> Result<Option<f64>> {
        if self.finished {
            return Err(CodecError::Exhausted);
        }
        match self.decode_next() {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => {
                self.finished = true;
                trace!("elf decompressor reached end of block");
                Ok(None)
            }
            Err(CodecError::Unbound) => Err(CodecError::Unbound),
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn decode_next(&mut self) -> Result<Option<f64>> {
        let flag = read_field(self.xor.input_mut()?, 1)?;
        if flag == 0 {
            return Ok(self.xor.read_value()?.map(f64::from_bits));
        }

        let beta_star = read_field(self.xor.input_mut()?, 4)? as u8;
        match self.xor.read_value()? {
            Some(bits) => restore(f64::from_bits(bits), beta_star).map(Some),
            None => Err(CodecError::InvalidData(
                "proxy flag set on the end-of-block sentinel".to_string(),
            )),
        }
    }

    /// Decodes every remaining value in the block.
    pub fn decompress(&mut self) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(1024);
        while let Some(value) = self.next_value()? {
            values.push(value);
        }
        Ok(values)
    }

    /// Returns an iterator that lazily decodes the remaining values.
    pub fn values(&mut self) -> Values<'_, D> {
        Values {
            decompressor: self,
            done: false,
        }
    }
}

/// A lazy iterator over the values of a block. Stops after the first error.
pub struct Values<'a, D> {
    decompressor: &'a mut ElfDecompressor<D>,
    done: bool,
}

impl<'a, D: XorDecompressor> Iterator for Values<'a, D> {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decompressor.next_value() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ElfCompressor;

    #[test]
    fn test_restore_power_of_ten() {
        assert_eq!(restore(100.0, 0), Ok(0.001));
        assert_eq!(restore(-100.0, 0), Ok(-0.001));
        assert_eq!(restore(0.5, 0), Ok(1.0));
    }

    #[test]
    fn test_restore_rounds_proxy() {
        assert_eq!(restore(23.449999999999, 4), Ok(23.45));
        assert_eq!(restore(-23.449999999999, 4), Ok(-23.45));
        assert_eq!(restore(0.012299999, 3), Ok(0.0123));
    }

    #[test]
    fn test_restore_rejects_zero_proxy() {
        assert!(matches!(restore(0.0, 3), Err(CodecError::InvalidData(_))));
    }

    #[test]
    fn test_roundtrip_verbatim() {
        let input = vec![12.0, 12.5, 13.0, 11.5, 12.0];
        let mut compressor = ElfCompressor::elf();
        for &v in &input {
            compressor.add_value(v).unwrap();
        }
        compressor.close().unwrap();

        let mut decompressor = ElfDecompressor::elf();
        decompressor.set_bytes(compressor.bytes().to_vec());
        assert_eq!(decompressor.decompress().unwrap(), input);
    }

    #[test]
    fn test_mixed_modes_over_chimp() {
        let mut compressor = ElfCompressor::chimp();
        compressor.add_value(1.5).unwrap();
        compressor.add_proxy(23.449999999999, 4).unwrap();
        compressor.add_proxy(100.0, 0).unwrap();
        compressor.add_value(1.5).unwrap();
        compressor.close().unwrap();

        let mut decompressor = ElfDecompressor::chimp();
        decompressor.set_bytes(compressor.bytes().to_vec());
        assert_eq!(
            decompressor.decompress().unwrap(),
            vec![1.5, 23.45, 0.001, 1.5]
        );
    }

    #[test]
    fn test_iterator_matches_decompress() {
        let input: Vec<f64> = (0..200).map(|i| (i as f64).sqrt()).collect();
        let mut compressor = ElfCompressor::elf();
        for &v in &input {
            compressor.add_value(v).unwrap();
        }
        compressor.close().unwrap();

        let mut decompressor = ElfDecompressor::elf();
        decompressor.set_bytes(compressor.bytes().to_vec());
        let iterated: Vec<f64> = decompressor.values().map(|r| r.unwrap()).collect();
        assert_eq!(iterated, input);

        decompressor.refresh();
        assert_eq!(decompressor.decompress().unwrap(), input);
    }

    #[test]
    fn test_next_after_end_fails() {
        let mut compressor = ElfCompressor::elf();
        compressor.close().unwrap();
        let mut decompressor = ElfDecompressor::elf();
        decompressor.set_bytes(compressor.bytes().to_vec());
        assert_eq!(decompressor.next_value(), Ok(None));
        assert_eq!(decompressor.next_value(), Err(CodecError::Exhausted));
    }

    #[test]
    fn test_unbound() {
        let mut decompressor = ElfDecompressor::elf();
        assert_eq!(decompressor.next_value(), Err(CodecError::Unbound));
        assert_eq!(decompressor.next_value(), Err(CodecError::Unbound));
    }

    #[test]
    fn test_truncated_block_stays_failed() {
        let mut compressor = ElfCompressor::elf();
        compressor.add_value(1.5).unwrap();
        compressor.add_proxy(23.449999999999, 4).unwrap();
        compressor.close().unwrap();
        let bytes = compressor.bytes()[..10].to_vec();

        let mut decompressor = ElfDecompressor::elf();
        decompressor.set_bytes(bytes);
        assert_eq!(decompressor.next_value(), Ok(Some(1.5)));
        assert!(matches!(
            decompressor.next_value(),
            Err(CodecError::UnexpectedEnd { .. })
        ));
        assert_eq!(decompressor.next_value(), Err(CodecError::Exhausted));

        decompressor.refresh();
        assert_eq!(decompressor.next_value(), Ok(Some(1.5)));
    }

    #[test]
    fn test_into_inner_keeps_read_state() {
        let mut compressor = ElfCompressor::chimp();
        compressor.add_value(2.0).unwrap();
        compressor.close().unwrap();

        let mut decompressor = ElfDecompressor::chimp();
        decompressor.set_bytes(compressor.bytes().to_vec());
        assert_eq!(decompressor.decompress().unwrap(), vec![2.0]);
        let mut xor = decompressor.into_inner();
        assert_eq!(xor.read_value(), Err(CodecError::Exhausted));
    }
}
