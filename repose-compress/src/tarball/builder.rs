//! Creation of tarballs.

use std::fmt;
use std::fmt::Debug;
use std::io::Write;

use repose_types::Result;
use tar::Builder;

use crate::CompressionKind;
use crate::compression::CompressionEncoder;

/// Wraps a [`Builder`] that writes to a [`CompressionEncoder`].
///
/// As [`CompressionEncoder`] has an uncompressed variant, this can be used
/// to create either compressed tarballs or plain `.tar` archives.
pub struct TarballBuilder<W: Write> {
    inner: Builder<CompressionEncoder<W>>,
}

impl<W: Write> Debug for TarballBuilder<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarballBuilder")
            .field("inner", &"Builder<CompressionEncoder>")
            .finish()
    }
}

impl<W: Write> TarballBuilder<W> {
    /// Creates a new [`TarballBuilder`] writing to `writer` with the given
    /// [`CompressionKind`].
    ///
    /// # Errors
    ///
    /// Returns an error if [`CompressionEncoder`] initialization fails.
    pub fn new(writer: W, kind: CompressionKind) -> Result<Self> {
        Ok(CompressionEncoder::new(writer, kind)?.into())
    }

    /// Returns a mutable reference to the inner [`Builder`], for appending
    /// entries directly.
    pub fn inner_mut(&mut self) -> &mut Builder<CompressionEncoder<W>> {
        &mut self.inner
    }

    /// Finishes writing the tarball and flushes the compression stream.
    ///
    /// # Errors
    ///
    /// Returns an error if finalising the tar stream or the compression
    /// encoder fails.
    pub fn finish(self) -> Result<W> {
        let encoder = self.inner.into_inner()?;
        Ok(encoder.finish()?)
    }
}

impl<W: Write> From<CompressionEncoder<W>> for TarballBuilder<W> {
    fn from(encoder: CompressionEncoder<W>) -> Self {
        Self {
            inner: Builder::new(encoder),
        }
    }
}
