//! # xorfloat
//!
//! Lossless compression of `f64` time series with the Chimp and Elf XOR
//! layouts, plus the Elf decimal-restoration layer.
//!
//! ## Algorithm overview
//!
//! Adjacent readings in a time series usually share sign, exponent and most
//! of their mantissa. Each value is XORed with its predecessor and only the
//! bits between the leading and trailing zero runs of the result are stored:
//!
//! - **Chimp** writes the first value raw, elides trailing zeros only when the
//!   run is longer than 6 bits, and remembers the last leading-zero bucket.
//! - **Elf** elides the first value's trailing zeros too, and remembers a full
//!   `(leading, trailing)` window that later values can reuse for a 2-bit code.
//!
//! On top of either layout, the [`ElfDecompressor`] reads a 1-bit mode flag per
//! value. Values known to come from limited decimal precision (sensor readings
//! such as `23.45`) can be stored as a cheaper proxy with trailing mantissa bits
//! cleared, and restored exactly by decimal rounding.
//!
//! Every block ends with [`END_SIGN`](decimal::END_SIGN), the canonical quiet NaN
//! bit pattern. That exact pattern cannot be stored as data.
//!
//! ## Example
//!
//! ```rust
//! use xorfloat::{ElfCompressor, ElfDecompressor};
//!
//! let mut compressor = ElfCompressor::elf();
//! compressor.add_value(12.0).unwrap();
//! compressor.add_value(12.5).unwrap();
//! compressor.add_value(13.0).unwrap();
//! compressor.close().unwrap();
//!
//! let mut decompressor = ElfDecompressor::elf();
//! decompressor.set_bytes(compressor.bytes().to_vec());
//! assert_eq!(decompressor.decompress().unwrap(), vec![12.0, 12.5, 13.0]);
//! ```
//!
//! ## Reusing instances
//!
//! Compressors and decompressors are meant to be pooled. `refresh()` resets
//! all per-block state and keeps the buffer allocation:
//!
//! ```rust
//! use xorfloat::{ChimpXorCompressor, XorCompressor};
//!
//! let mut compressor = ChimpXorCompressor::new();
//! for block in [[1.0f64, 2.0], [3.0, 4.0]] {
//!     for v in block {
//!         compressor.add_value(v.to_bits()).unwrap();
//!     }
//!     compressor.close().unwrap();
//!     let bytes = compressor.bytes().to_vec();
//!     # assert!(!bytes.is_empty());
//!     compressor.refresh();
//! }
//! ```

pub mod bitbuffer;
pub mod config;
pub mod decimal;
pub mod decoder;
pub mod encoder;
mod error;
pub mod xor;

// Re-export primary types at the crate root.
pub use config::CodecConfig;
pub use decoder::{ElfDecompressor, Values};
pub use encoder::ElfCompressor;
pub use error::CodecError;
pub use xor::{
    ChimpXorCompressor, ChimpXorDecompressor, ElfXorCompressor, ElfXorDecompressor,
    XorCompressor, XorDecompressor,
};

/// Convenience type alias for Results with CodecError.
pub type Result<T> = std::result::Result<T, CodecError>;
