use log::trace;

use crate::bitbuffer::{BitBuffer, BitReader};
use crate::config::CodecConfig;
use crate::decimal::END_SIGN;
use crate::error::CodecError;
use crate::xor::{
    leading_code, malformed, read_field, rounded_leading_zeros, Session, XorCompressor,
    XorDecompressor, LEADING_BUCKETS, NO_WINDOW,
};
use crate::Result;

/// XORs with more trailing zeros than this drop them from the payload.
pub const THRESHOLD: u32 = 6;

/// The Chimp compressor.
///
/// The first value is written raw in 64 bits. Each later value is XORed with
/// its predecessor and written as one of:
///
/// | code | when                                  | payload                                         |
/// |------|---------------------------------------|-------------------------------------------------|
/// | `00` | XOR is zero                           | none                                            |
/// | `01` | more than 6 trailing zeros            | 3-bit lead code, 6-bit length, significant bits |
/// | `10` | rounded lead equals the remembered one| `64 - lead` bits                                |
/// | `11` | otherwise                             | 3-bit lead code, `64 - lead` bits               |
///
/// # Example
/// ```
/// use xorfloat::{ChimpXorCompressor, ChimpXorDecompressor, XorCompressor, XorDecompressor};
///
/// let mut compressor = ChimpXorCompressor::new();
/// compressor.add_value(1.0f64.to_bits()).unwrap();
/// compressor.add_value(1.0f64.to_bits()).unwrap();
/// compressor.close().unwrap();
///
/// let mut decompressor = ChimpXorDecompressor::new();
/// decompressor.set_bytes(compressor.bytes().to_vec());
/// assert_eq!(decompressor.read_all().unwrap(), vec![1.0f64.to_bits(); 2]);
/// ```
#[derive(Debug, Clone)]
pub struct ChimpXorCompressor {
    buf: BitBuffer,
    session: Session,
    count: usize,
    closed: bool,
}

impl ChimpXorCompressor {
    /// Creates a compressor sized for the default block capacity.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Creates a compressor sized for `config.capacity` values.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            buf: BitBuffer::with_capacity(config.buffer_bytes()),
            session: Session::default(),
            count: 0,
            closed: false,
        }
    }

    fn append(&mut self, value: u64) -> usize {
        if self.session.first {
            self.write_first(value)
        } else {
            self.compress_value(value)
        }
    }

    fn write_first(&mut self, value: u64) -> usize {
        self.session.first = false;
        self.session.stored_val = value;
        self.buf.write_bits(value, 64);
        64
    }

    fn compress_value(&mut self, value: u64) -> usize {
        let xor = self.session.stored_val ^ value;
        let size = if xor == 0 {
            self.buf.write_bits(0b00, 2);
            self.session.stored_leading_zeros = NO_WINDOW;
            2
        } else {
            let leading = rounded_leading_zeros(xor);
            let trailing = xor.trailing_zeros();

            if trailing > THRESHOLD {
                let significant = 64 - leading - trailing;
                self.buf.write_bits(0b01, 2);
                self.buf.write_bits(leading_code(leading), 3);
                self.buf.write_bits(significant as u64, 6);
                self.buf.write_bits(xor >> trailing, significant as u8);
                self.session.stored_leading_zeros = NO_WINDOW;
                11 + significant as usize
            } else if leading == self.session.stored_leading_zeros {
                let significant = 64 - leading;
                self.buf.write_bits(0b10, 2);
                self.buf.write_bits(xor, significant as u8);
                2 + significant as usize
            } else {
                self.session.stored_leading_zeros = leading;
                let significant = 64 - leading;
                self.buf.write_bits(0b11, 2);
                self.buf.write_bits(leading_code(leading), 3);
                self.buf.write_bits(xor, significant as u8);
                5 + significant as usize
            }
        };
        self.session.stored_val = value;
        size
    }
}

impl Default for ChimpXorCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl XorCompressor for ChimpXorCompressor {
    fn add_value(&mut self, value: u64) -> Result<usize> {
        if self.closed {
            return Err(CodecError::Closed);
        }
        let size = self.append(value);
        self.count += 1;
        Ok(size)
    }

    /// The returned size covers the sentinel only, not the guard bit or the
    /// byte padding.
    fn close(&mut self) -> Result<usize> {
        if self.closed {
            return Err(CodecError::Closed);
        }
        let size = self.append(END_SIGN);
        self.buf.write_bit(false);
        self.buf.flush();
        self.closed = true;
        trace!(
            "chimp block closed: {} values in {} bits",
            self.count,
            self.buf.len_bits()
        );
        Ok(size)
    }

    fn refresh(&mut self) {
        self.buf.clear();
        self.session = Session::default();
        self.count = 0;
        self.closed = false;
        trace!("chimp compressor refreshed");
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn count(&self) -> usize {
        self.count
    }

    fn output(&self) -> &BitBuffer {
        &self.buf
    }

    fn output_mut(&mut self) -> &mut BitBuffer {
        &mut self.buf
    }
}

/// The Chimp decompressor, the inverse of [`ChimpXorCompressor`].
#[derive(Debug, Clone, Default)]
pub struct ChimpXorDecompressor {
    input: Option<BitReader>,
    session: Session,
    finished: bool,
}

impl ChimpXorDecompressor {
    /// Creates a decompressor with no block bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decompressor already bound to `bytes`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            input: Some(BitReader::new(bytes)),
            ..Self::default()
        }
    }

    fn decode_next(input: &mut BitReader, session: &mut Session) -> Result<u64> {
        match read_field(input, 2)? {
            0b00 => {
                session.stored_leading_zeros = NO_WINDOW;
                Ok(session.stored_val)
            }
            0b01 => {
                let leading = LEADING_BUCKETS[read_field(input, 3)? as usize] as u32;
                let significant = match read_field(input, 6)? as u32 {
                    0 => 64,
                    n => n,
                };
                if leading + significant > 64 {
                    return Err(malformed("significant bits overflow", input.position()));
                }
                let trailing = 64 - leading - significant;
                let xor = read_field(input, significant as u8)? << trailing;
                session.stored_leading_zeros = NO_WINDOW;
                Ok(session.stored_val ^ xor)
            }
            0b10 => {
                let leading = session.stored_leading_zeros;
                if leading == NO_WINDOW {
                    return Err(malformed("window reuse without a window", input.position()));
                }
                let xor = read_field(input, (64 - leading) as u8)?;
                Ok(session.stored_val ^ xor)
            }
            _ => {
                let leading = LEADING_BUCKETS[read_field(input, 3)? as usize] as u32;
                session.stored_leading_zeros = leading;
                let xor = read_field(input, (64 - leading) as u8)?;
                Ok(session.stored_val ^ xor)
            }
        }
    }
}

impl XorDecompressor for ChimpXorDecompressor {
    fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.input = Some(BitReader::new(bytes));
        self.session = Session::default();
        self.finished = false;
    }

    fn read_value(&mut self) -> Result<Option<u64>> {
        if self.finished {
            return Err(CodecError::Exhausted);
        }
        let input = self.input.as_mut().ok_or(CodecError::Unbound)?;
        let decoded = if self.session.first {
            self.session.first = false;
            read_field(input, 64)
        } else {
            Self::decode_next(input, &mut self.session)
        };
        // A bad field leaves the cursor misaligned; nothing after it can be trusted.
        let value = match decoded {
            Ok(value) => value,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        if value == END_SIGN {
            self.finished = true;
            trace!("chimp sentinel reached at bit {}", input.position());
            return Ok(None);
        }
        self.session.stored_val = value;
        Ok(Some(value))
    }

    fn refresh(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.rewind();
        }
        self.session = Session::default();
        self.finished = false;
    }

    fn input_mut(&mut self) -> Result<&mut BitReader> {
        self.input.as_mut().ok_or(CodecError::Unbound)
    }
}
