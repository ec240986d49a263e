//! Block sizing configuration.

use serde::{Deserialize, Serialize};

/// Number of values a block is sized for when no configuration is given.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Sizing knobs shared by every compressor and decompressor.
///
/// Capacity only affects how much memory is reserved up front; it is not part
/// of the wire format and a block may hold more values than this.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CodecConfig {
    /// Expected number of values per block.
    pub capacity: usize,
}

impl CodecConfig {
    /// Creates a configuration for blocks of `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Bytes to reserve for one block: 64 data bits plus control bits per
    /// value and the sentinel, with 20% slack.
    pub fn buffer_bytes(&self) -> usize {
        let base = (self.capacity + 1) * 8 + self.capacity / 8 + 1;
        (base as f64 * 1.2) as usize
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buffer_bytes() {
        // ((1001 * 8) + 125 + 1) * 1.2 = 9760.8
        assert_eq!(CodecConfig::default().buffer_bytes(), 9760);
    }

    #[test]
    fn test_small_capacity() {
        // ((1 * 8) + 0 + 1) * 1.2 = 10.8
        assert_eq!(CodecConfig::new(0).buffer_bytes(), 10);
    }

    #[test]
    fn test_missing_fields_use_default() {
        let config: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());

        let config: CodecConfig = serde_json::from_str(r#"{"capacity": 64}"#).unwrap();
        assert_eq!(config.capacity, 64);
    }
}
