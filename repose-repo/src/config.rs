//! The configuration surface passed into every component, in place of the
//! original's process-wide `struct config`.

use std::path::PathBuf;

use repose_compress::CompressionKind;

/// Everything a [`crate::driver::Driver`] run needs, built once by
/// `repose-cli` from parsed command line flags.
#[derive(Clone, Debug)]
pub struct Config {
    /// The repository name, with any trailing `.db` already stripped.
    pub repo_name: String,
    /// Repository root directory; default `.`.
    pub root: PathBuf,
    /// Package pool directory; default = `root`.
    pub pool: PathBuf,
    /// Architecture filter; packages with `arch` not equal to this or
    /// `any` are excluded.
    pub arch: String,
    /// Whether to also maintain the `.files` index.
    pub files: bool,
    /// List packages instead of writing.
    pub list: bool,
    /// Remove targets from the repository instead of updating.
    pub drop: bool,
    /// Sign written indexes.
    pub sign: bool,
    /// Use btrfs reflinks instead of symlinks for pool links.
    pub reflink: bool,
    /// Ignore any existing index; rebuild from scratch.
    pub rebuild: bool,
    /// Compression used for newly written indexes.
    pub compression: CompressionKind,
    /// Positional targets (drop targets, or an update subset); empty means
    /// "all packages in the pool".
    pub targets: Vec<String>,
}
