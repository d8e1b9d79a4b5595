//! Encoder for compression which supports multiple backends.

use std::fmt::Debug;
use std::io::Write;

use bzip2::Compression as BzCompression;
use bzip2::write::BzEncoder;
use flate2::Compression as GzCompression;
use flate2::write::GzEncoder;
use liblzma::write::XzEncoder;
use repose_types::Result;

use crate::CompressionKind;

/// Encoder for compression which supports multiple backends.
///
/// Wraps [`BzEncoder`], [`GzEncoder`] and [`XzEncoder`] behind a single
/// [`Write`] implementation. There is no variant for
/// [`CompressionKind::Compress`]: [`CompressionEncoder::new`] rejects it
/// before construction.
pub enum CompressionEncoder<W: Write> {
    /// No compression.
    None(W),
    /// The gzip encoder.
    Gzip(GzEncoder<W>),
    /// The bzip2 encoder.
    Bzip2(BzEncoder<W>),
    /// The xz (liblzma) encoder.
    Xz(XzEncoder<W>),
}

impl<W: Write> CompressionEncoder<W> {
    /// Creates a new [`CompressionEncoder`] wrapping `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if `kind` is [`CompressionKind::Compress`], which
    /// this crate cannot encode.
    pub fn new(writer: W, kind: CompressionKind) -> Result<Self> {
        kind.check_encodable()?;
        log::trace!("creating compression encoder: {kind}");
        Ok(match kind {
            CompressionKind::None => Self::None(writer),
            CompressionKind::Gzip => Self::Gzip(GzEncoder::new(writer, GzCompression::default())),
            CompressionKind::Bzip2 => {
                Self::Bzip2(BzEncoder::new(writer, BzCompression::default()))
            }
            CompressionKind::Xz => Self::Xz(XzEncoder::new(writer, 6)),
            CompressionKind::Compress => unreachable!("rejected by check_encodable above"),
        })
    }

    /// Finishes the compression stream, flushing any trailing frame data and
    /// returning the underlying writer.
    pub fn finish(self) -> std::io::Result<W> {
        match self {
            CompressionEncoder::None(w) => Ok(w),
            CompressionEncoder::Gzip(enc) => enc.finish(),
            CompressionEncoder::Bzip2(enc) => enc.finish(),
            CompressionEncoder::Xz(enc) => enc.finish(),
        }
    }
}

impl<W: Write> Debug for CompressionEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompressionEncoder::None(_) => "None",
            CompressionEncoder::Gzip(_) => "Gzip",
            CompressionEncoder::Bzip2(_) => "Bzip2",
            CompressionEncoder::Xz(_) => "Xz",
        };
        write!(f, "CompressionEncoder({name})")
    }
}

impl<W: Write> Write for CompressionEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            CompressionEncoder::None(w) => w.write(buf),
            CompressionEncoder::Gzip(enc) => enc.write(buf),
            CompressionEncoder::Bzip2(enc) => enc.write(buf),
            CompressionEncoder::Xz(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            CompressionEncoder::None(w) => w.flush(),
            CompressionEncoder::Gzip(enc) => enc.flush(),
            CompressionEncoder::Bzip2(enc) => enc.flush(),
            CompressionEncoder::Xz(enc) => enc.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use testresult::TestResult;

    use super::*;

    #[rstest]
    #[case::none(CompressionKind::None)]
    #[case::gzip(CompressionKind::Gzip)]
    #[case::bzip2(CompressionKind::Bzip2)]
    #[case::xz(CompressionKind::Xz)]
    fn encoder_writes_and_finishes(#[case] kind: CompressionKind) -> TestResult {
        let mut encoder = CompressionEncoder::new(Vec::new(), kind)?;
        encoder.write_all(b"alpm4ever")?;
        encoder.flush()?;
        let bytes = encoder.finish()?;
        assert!(!bytes.is_empty());
        Ok(())
    }

    #[test]
    fn encoder_rejects_legacy_compress() {
        let result = CompressionEncoder::new(Vec::new(), CompressionKind::Compress);
        assert!(result.is_err());
    }
}
