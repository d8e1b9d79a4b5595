//! Error handling.
//!
//! A single crate-wide error type, in place of the original's mix of `err()`,
//! `warn()` and negative-`errno` returns (see the repose design notes on the
//! "error channel").

/// The crate-wide result alias. Used pervasively so that `?` propagates
/// through every layer of the workspace.
pub type Result<T> = std::result::Result<T, ReposeError>;

/// Errors produced anywhere in the `repose` workspace.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReposeError {
    /// An unrecoverable error: the driver should print `program_name: message`
    /// and exit non-zero.
    #[error("{0}")]
    Fatal(String),

    /// A single item (usually one pool archive) could not be processed and
    /// should be skipped while the run continues.
    #[error("{0}")]
    Skip(String),

    /// A requested resource does not exist. Distinguished from other I/O
    /// failures so that callers can downgrade it to "feature off" where that
    /// is appropriate (a missing `.sig`, a missing `.files` index).
    #[error("not found")]
    NotFound,

    /// An I/O error that isn't covered by a more specific variant above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the compression/archive layer that isn't a plain I/O
    /// failure (the compression and tar backends themselves surface their
    /// own errors as `std::io::Error`, which is absorbed by [`ReposeError::Io`]).
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveLayerError),
}

/// Errors from the compression/tar layer that have no `std::io::Error`
/// representation of their own.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ArchiveLayerError {
    /// The requested compression algorithm has no available backend.
    #[error("unsupported compression algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Encoding in the legacy Unix `compress` (`.Z`) format was requested.
    ///
    /// No maintained Rust crate implements the legacy LZW compressor; the
    /// flag is accepted for command-line compatibility but rejected here.
    #[error("writing legacy `.Z` compressed indexes is not supported")]
    CompressEncodeUnsupported,
}

impl ReposeError {
    /// Returns `true` for [`ReposeError::NotFound`] or an [`std::io::Error`]
    /// whose kind is [`std::io::ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            ReposeError::NotFound => true,
            ReposeError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
