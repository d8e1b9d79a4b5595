//! Decoding side of the compression abstraction.

mod decoder;

pub use decoder::CompressionDecoder;
