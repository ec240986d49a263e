/// A growable bit buffer that appends individual bits and multi-bit fields,
/// most significant bit first. Used as the output of every compressor.
///
/// The buffer is usually pre-sized for a whole block and reused through
/// [`BitBuffer::clear`], so steady-state compression does not reallocate.
#[derive(Debug, Clone, Default)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    /// Number of valid bits in the last byte (1..=8, or 0 if empty).
    bit_count: u8,
}

impl BitBuffer {
    /// Creates a new empty `BitBuffer`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `BitBuffer` with the given pre-allocated capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            bit_count: 0,
        }
    }

    /// Returns the total number of bits written.
    #[inline]
    pub fn len_bits(&self) -> usize {
        if self.bytes.is_empty() {
            0
        } else {
            (self.bytes.len() - 1) * 8 + self.bit_count as usize
        }
    }

    /// Returns `true` if no bits have been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the reserved capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Returns a reference to the underlying byte slice.
    ///
    /// Unwritten bits of the last byte are always zero.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer and returns the raw byte vector.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Drops all written bits but keeps the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.bit_count = 0;
    }

    /// Pads the last byte with zero bits so the next write starts on a byte
    /// boundary.
    pub fn flush(&mut self) {
        if !self.bytes.is_empty() {
            self.bit_count = 8;
        }
    }

    /// Writes a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        if self.bit_count == 0 || self.bit_count == 8 {
            self.bytes.push(0);
            self.bit_count = 0;
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << (7 - self.bit_count);
            }
        }
        self.bit_count += 1;
    }

    /// Writes the lowest `n` bits of `value` (big-endian order). `n` must be <= 64.
    pub fn write_bits(&mut self, value: u64, n: u8) {
        debug_assert!(n <= 64);
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }
}

/// A cursor for reading bits sequentially from an owned byte buffer.
///
/// Every byte is considered readable, including the zero padding a flushed
/// [`BitBuffer`] leaves at the end of its last byte.
#[derive(Debug, Clone, Default)]
pub struct BitReader {
    bytes: Vec<u8>,
    /// Total number of valid bits.
    total_bits: usize,
    /// Current bit position (0-indexed from the start).
    pos: usize,
}

impl BitReader {
    /// Creates a new `BitReader` over all bits of `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        let total_bits = bytes.len() * 8;
        Self::from_raw(bytes, total_bits)
    }

    /// Creates a `BitReader` from raw bytes and a total bit count.
    pub fn from_raw(bytes: Vec<u8>, total_bits: usize) -> Self {
        debug_assert!(total_bits <= bytes.len() * 8, "total_bits exceeds bytes length");
        Self {
            bytes,
            total_bits,
            pos: 0,
        }
    }

    /// Moves the cursor back to the first bit.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Returns the current bit position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bits remaining.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.total_bits.saturating_sub(self.pos)
    }

    /// Returns `true` if there are no more bits to read.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.total_bits
    }

    /// Reads a single bit. Returns `None` if exhausted.
    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = self.peek_bit()?;
        self.pos += 1;
        Some(bit)
    }

    /// Reads `n` bits as a `u64` (big-endian). Returns `None` if not enough
    /// bits remain, in which case the cursor does not move.
    pub fn read_bits(&mut self, n: u8) -> Option<u64> {
        debug_assert!(n <= 64);
        if self.remaining() < n as usize {
            return None;
        }
        let mut value: u64 = 0;
        for _ in 0..n {
            value = (value << 1) | (self.read_bit()? as u64);
        }
        Some(value)
    }

    /// Peeks at the next bit without advancing the position.
    #[inline]
    pub fn peek_bit(&self) -> Option<bool> {
        if self.pos >= self.total_bits {
            return None;
        }
        let byte_idx = self.pos / 8;
        let bit_idx = self.pos % 8;
        Some((self.bytes[byte_idx] >> (7 - bit_idx)) & 1 == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_bits() {
        let mut buf = BitBuffer::new();
        buf.write_bit(true);
        buf.write_bit(false);
        buf.write_bit(true);
        buf.write_bit(true);
        assert_eq!(buf.len_bits(), 4);
        assert_eq!(buf.as_bytes(), &[0b1011_0000]);

        let mut reader = BitReader::from_raw(buf.into_bytes(), 4);
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read_bit(), Some(false));
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn test_write_and_read_multi_bits() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b11010, 5);
        buf.write_bits(0xFF, 8);
        buf.write_bits(0x00, 8);
        assert_eq!(buf.len_bits(), 21);

        let mut reader = BitReader::from_raw(buf.into_bytes(), 21);
        assert_eq!(reader.read_bits(5), Some(0b11010));
        assert_eq!(reader.read_bits(8), Some(0xFF));
        assert_eq!(reader.read_bits(8), Some(0x00));
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_64_bit_value() {
        let mut buf = BitBuffer::new();
        let val: u64 = 0xDEAD_BEEF_CAFE_BABE;
        buf.write_bits(val, 64);
        assert_eq!(buf.len_bits(), 64);

        let mut reader = BitReader::new(buf.into_bytes());
        assert_eq!(reader.read_bits(64), Some(val));
    }

    #[test]
    fn test_zero_width_field() {
        let mut buf = BitBuffer::new();
        buf.write_bits(u64::MAX, 0);
        assert!(buf.is_empty());

        let mut reader = BitReader::new(Vec::new());
        assert_eq!(reader.read_bits(0), Some(0));
    }

    #[test]
    fn test_empty_buffer() {
        let buf = BitBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len_bits(), 0);

        let mut reader = BitReader::new(buf.into_bytes());
        assert!(reader.is_exhausted());
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn test_flush_pads_to_byte_boundary() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b101, 3);
        buf.flush();
        assert_eq!(buf.len_bits(), 8);
        buf.write_bit(true);
        assert_eq!(buf.as_bytes(), &[0b1010_0000, 0b1000_0000]);
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut buf = BitBuffer::new();
        buf.flush();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut buf = BitBuffer::with_capacity(64);
        buf.write_bits(0xABCD, 16);
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 64);
        buf.write_bits(0b1, 1);
        assert_eq!(buf.as_bytes(), &[0b1000_0000]);
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let mut reader = BitReader::new(vec![0xFF]);
        assert_eq!(reader.read_bits(3), Some(0b111));
        assert_eq!(reader.read_bits(6), None);
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.remaining(), 5);
    }

    #[test]
    fn test_rewind() {
        let mut reader = BitReader::new(vec![0b1100_0000]);
        assert_eq!(reader.read_bits(2), Some(0b11));
        reader.rewind();
        assert_eq!(reader.peek_bit(), Some(true));
        assert_eq!(reader.read_bits(8), Some(0b1100_0000));
    }
}
