//! Decoder for decompression which supports multiple backends.

use std::fmt::Debug;
use std::io::{BufRead, Read};

use bzip2::bufread::BzDecoder;
use flate2::bufread::GzDecoder;
use liblzma::bufread::XzDecoder;
use repose_types::{ArchiveLayerError, ReposeError, Result};

use crate::CompressionKind;

/// Decoder for decompression which supports multiple backends.
///
/// Wraps [`BzDecoder`], [`GzDecoder`] and [`XzDecoder`] behind a single
/// [`Read`] implementation.
pub enum CompressionDecoder<R: BufRead> {
    /// No compression.
    None(R),
    /// The gzip decoder.
    Gzip(GzDecoder<R>),
    /// The bzip2 decoder.
    Bzip2(BzDecoder<R>),
    /// The xz (liblzma) decoder.
    Xz(XzDecoder<R>),
}

impl<R: BufRead> CompressionDecoder<R> {
    /// Creates a new [`CompressionDecoder`] wrapping `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if `kind` is [`CompressionKind::Compress`]: no
    /// maintained Rust crate implements the legacy LZW decompressor.
    pub fn new(reader: R, kind: CompressionKind) -> Result<Self> {
        log::trace!("creating compression decoder: {kind}");
        Ok(match kind {
            CompressionKind::None => Self::None(reader),
            CompressionKind::Gzip => Self::Gzip(GzDecoder::new(reader)),
            CompressionKind::Bzip2 => Self::Bzip2(BzDecoder::new(reader)),
            CompressionKind::Xz => Self::Xz(XzDecoder::new(reader)),
            CompressionKind::Compress => {
                return Err(ReposeError::Archive(
                    ArchiveLayerError::UnsupportedAlgorithm("compress".to_string()),
                ));
            }
        })
    }
}

impl<R: BufRead> Debug for CompressionDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompressionDecoder::None(_) => "None",
            CompressionDecoder::Gzip(_) => "Gzip",
            CompressionDecoder::Bzip2(_) => "Bzip2",
            CompressionDecoder::Xz(_) => "Xz",
        };
        write!(f, "CompressionDecoder({name})")
    }
}

impl<R: BufRead> Read for CompressionDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            CompressionDecoder::None(r) => r.read(buf),
            CompressionDecoder::Gzip(dec) => dec.read(buf),
            CompressionDecoder::Bzip2(dec) => dec.read(buf),
            CompressionDecoder::Xz(dec) => dec.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Write};

    use rstest::rstest;
    use testresult::TestResult;

    use super::*;
    use crate::compression::CompressionEncoder;

    #[rstest]
    #[case::none(CompressionKind::None)]
    #[case::gzip(CompressionKind::Gzip)]
    #[case::bzip2(CompressionKind::Bzip2)]
    #[case::xz(CompressionKind::Xz)]
    fn round_trips_through_matching_encoder(#[case] kind: CompressionKind) -> TestResult {
        let input = b"alpm4ever";
        let mut encoder = CompressionEncoder::new(Vec::new(), kind)?;
        encoder.write_all(input)?;
        let compressed = encoder.finish()?;

        let mut decoder = CompressionDecoder::new(BufReader::new(compressed.as_slice()), kind)?;
        let mut output = Vec::new();
        decoder.read_to_end(&mut output)?;

        assert_eq!(output, input);
        Ok(())
    }

    #[test]
    fn rejects_legacy_compress() {
        let reader = BufReader::new(&b""[..]);
        let result = CompressionDecoder::new(reader, CompressionKind::Compress);
        assert!(result.is_err());
    }
}
