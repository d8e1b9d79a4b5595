//! Encoding side of the compression abstraction.

mod encoder;

pub use encoder::CompressionEncoder;
