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

/// The Elf XOR compressor.
///
/// Unlike Chimp, the first value drops its own trailing zeros (7-bit count,
/// then the remaining high bits), and the remembered window covers both ends
/// of the XOR:
///
/// | code | when                           | payload                                 |
/// |------|--------------------------------|-----------------------------------------|
/// | `00` | XOR fits the remembered window | `center` bits                           |
/// | `01` | XOR is zero                    | none                                    |
/// | `10` | new window, `center <= 16`     | 3-bit lead code, 4-bit center, payload  |
/// | `11` | new window, `center > 16`      | 3-bit lead code, 6-bit center, payload  |
#[derive(Debug, Clone)]
pub struct ElfXorCompressor {
    buf: BitBuffer,
    session: Session,
    count: usize,
    closed: bool,
}

impl ElfXorCompressor {
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
        let trailing = value.trailing_zeros();
        self.buf.write_bits(trailing as u64, 7);
        if trailing < 64 {
            self.buf.write_bits(value >> trailing, (64 - trailing) as u8);
        }
        71 - trailing as usize
    }

    fn compress_value(&mut self, value: u64) -> usize {
        let xor = self.session.stored_val ^ value;
        if xor == 0 {
            self.buf.write_bits(0b01, 2);
            return 2;
        }

        let leading = rounded_leading_zeros(xor);
        let trailing = xor.trailing_zeros();
        let session = &mut self.session;

        let size = if leading == session.stored_leading_zeros
            && trailing >= session.stored_trailing_zeros
        {
            let center = 64 - session.stored_leading_zeros - session.stored_trailing_zeros;
            let payload = xor >> session.stored_trailing_zeros;
            let len = 2 + center;
            if len > 64 {
                self.buf.write_bits(0b00, 2);
                self.buf.write_bits(payload, center as u8);
            } else {
                // The payload's top two bits are zero, so they double as the `00` code.
                self.buf.write_bits(payload, len as u8);
            }
            len as usize
        } else {
            session.stored_leading_zeros = leading;
            session.stored_trailing_zeros = trailing;
            let center = 64 - leading - trailing;
            let code = leading_code(leading);
            if center <= 16 {
                self.buf
                    .write_bits((((0b10 << 3) | code) << 4) | (center as u64 & 0xF), 9);
                self.buf.write_bits(xor >> trailing, center as u8);
                9 + center as usize
            } else {
                self.buf
                    .write_bits((((0b11 << 3) | code) << 6) | (center as u64 & 0x3F), 11);
                self.buf.write_bits(xor >> trailing, center as u8);
                11 + center as usize
            }
        };
        self.session.stored_val = value;
        size
    }
}

impl Default for ElfXorCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl XorCompressor for ElfXorCompressor {
    fn add_value(&mut self, value: u64) -> Result<usize> {
        if self.closed {
            return Err(CodecError::Closed);
        }
        let size = self.append(value);
        self.count += 1;
        Ok(size)
    }

    fn close(&mut self) -> Result<usize> {
        if self.closed {
            return Err(CodecError::Closed);
        }
        let size = self.append(END_SIGN);
        self.buf.flush();
        self.closed = true;
        trace!(
            "elf block closed: {} values in {} bits",
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
        trace!("elf compressor refreshed");
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

/// The Elf XOR decompressor, the inverse of [`ElfXorCompressor`].
#[derive(Debug, Clone, Default)]
pub struct ElfXorDecompressor {
    input: Option<BitReader>,
    session: Session,
    finished: bool,
}

impl ElfXorDecompressor {
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

    fn decode_first(input: &mut BitReader) -> Result<u64> {
        let trailing = read_field(input, 7)? as u32;
        match trailing {
            64 => Ok(0),
            t if t > 64 => Err(malformed("first value trailing zeros", input.position())),
            t => Ok(read_field(input, (64 - t) as u8)? << t),
        }
    }

    fn decode_next(input: &mut BitReader, session: &mut Session) -> Result<u64> {
        let (leading, center) = match read_field(input, 2)? {
            0b00 => {
                if session.stored_leading_zeros == NO_WINDOW {
                    return Err(malformed("window reuse without a window", input.position()));
                }
                let center = 64 - session.stored_leading_zeros - session.stored_trailing_zeros;
                let xor = read_field(input, center as u8)? << session.stored_trailing_zeros;
                return Ok(session.stored_val ^ xor);
            }
            0b01 => return Ok(session.stored_val),
            0b10 => {
                let header = read_field(input, 7)?;
                let center = match header & 0xF {
                    0 => 16,
                    n => n as u32,
                };
                (LEADING_BUCKETS[(header >> 4) as usize] as u32, center)
            }
            _ => {
                let header = read_field(input, 9)?;
                let center = match header & 0x3F {
                    0 => 64,
                    n => n as u32,
                };
                (LEADING_BUCKETS[(header >> 6) as usize] as u32, center)
            }
        };
        if leading + center > 64 {
            return Err(malformed("center bits overflow", input.position()));
        }
        let trailing = 64 - leading - center;
        session.stored_leading_zeros = leading;
        session.stored_trailing_zeros = trailing;
        let xor = read_field(input, center as u8)? << trailing;
        Ok(session.stored_val ^ xor)
    }
}

impl XorDecompressor for ElfXorDecompressor {
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
            Self::decode_first(input)
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
            trace!("elf sentinel reached at bit {}", input.position());
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
