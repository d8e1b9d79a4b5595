use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use repose_types::{ArchiveLayerError, ReposeError, Result};

/// The compression algorithm used for an index archive or a package pool
/// entry.
///
/// Corresponds to the `-j/-J/-z/-Z` CLI flags and to the filename extension
/// on `<repo>.db.tar<ext>`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionKind {
    /// No compression filter.
    None,
    /// gzip, the default for newly written indexes.
    #[default]
    Gzip,
    /// bzip2.
    Bzip2,
    /// xz (liblzma).
    Xz,
    /// The legacy Unix `compress` (`.Z`) format. Readable in principle, but
    /// this crate has no encoder for it.
    Compress,
}

impl CompressionKind {
    /// The filename extension this compression kind appends, including the
    /// leading dot (empty for [`CompressionKind::None`]).
    pub fn extension(self) -> &'static str {
        match self {
            CompressionKind::None => "",
            CompressionKind::Gzip => ".gz",
            CompressionKind::Bzip2 => ".bz2",
            CompressionKind::Xz => ".xz",
            CompressionKind::Compress => ".Z",
        }
    }

    /// Guesses a [`CompressionKind`] from a path's extension.
    ///
    /// Returns [`CompressionKind::None`] if the extension isn't a
    /// recognised compression suffix.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(OsStr::to_str) {
            Some("gz") => CompressionKind::Gzip,
            Some("bz2") => CompressionKind::Bzip2,
            Some("xz") => CompressionKind::Xz,
            Some("Z") => CompressionKind::Compress,
            _ => CompressionKind::None,
        }
    }

    /// Returns an error if this kind cannot be used to encode, i.e.
    /// [`CompressionKind::Compress`].
    pub fn check_encodable(self) -> Result<()> {
        if self == CompressionKind::Compress {
            return Err(ReposeError::Archive(
                ArchiveLayerError::CompressEncodeUnsupported,
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionKind::None => "none",
            CompressionKind::Gzip => "gzip",
            CompressionKind::Bzip2 => "bzip2",
            CompressionKind::Xz => "xz",
            CompressionKind::Compress => "compress",
        };
        f.write_str(name)
    }
}
