//! Command-line argument handling for `repose`.

use std::path::PathBuf;

use clap::Parser;
use repose_repo::CompressionKind;

/// Maintains a binary package repository index.
///
/// Scans a pool directory of package archives, reconciles them against an
/// existing `.db`/`.files` index, and writes the result back out along
/// with filename links from the repository root into the pool.
#[derive(Debug, Parser)]
#[command(name = "repose", author, version, about)]
pub struct Cli {
    /// Log verbosity level.
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// Repository name; a trailing `.db` is stripped.
    pub repository: String,

    /// Packages to act on (glob against `name-version`, or an exact name or
    /// filename). With no targets, every package in the pool is considered.
    pub targets: Vec<String>,

    /// Also maintain the `.files` index.
    #[arg(short = 'f', long)]
    pub files: bool,

    /// List packages instead of writing.
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Remove targets from the repository instead of updating.
    #[arg(short = 'd', long)]
    pub drop: bool,

    /// Sign written indexes.
    #[arg(short = 's', long)]
    pub sign: bool,

    /// Repository root directory.
    #[arg(short = 'r', long, default_value = ".")]
    pub root: PathBuf,

    /// Package pool directory; defaults to the repository root.
    #[arg(short = 'p', long)]
    pub pool: Option<PathBuf>,

    /// Filter packages by architecture.
    #[arg(short = 'm', long)]
    pub arch: Option<String>,

    /// Use bzip2 compression for written indexes.
    #[arg(short = 'j', long, group = "compression")]
    pub bzip2: bool,

    /// Use xz compression for written indexes.
    #[arg(short = 'J', long, group = "compression")]
    pub xz: bool,

    /// Use gzip compression for written indexes (the default).
    #[arg(short = 'z', long, group = "compression")]
    pub gzip: bool,

    /// Use legacy Unix `compress` for written indexes.
    #[arg(short = 'Z', long, group = "compression")]
    pub compress: bool,

    /// Use btrfs reflinks instead of symlinks for pool links.
    #[arg(long)]
    pub reflink: bool,

    /// Ignore any existing index; rebuild it from scratch.
    #[arg(long)]
    pub rebuild: bool,
}

impl Cli {
    /// The compression kind selected by whichever of `-j/-J/-z/-Z` was
    /// given, or [`CompressionKind::Gzip`] (the default) if none was.
    pub fn compression(&self) -> CompressionKind {
        if self.bzip2 {
            CompressionKind::Bzip2
        } else if self.xz {
            CompressionKind::Xz
        } else if self.compress {
            CompressionKind::Compress
        } else {
            CompressionKind::Gzip
        }
    }

    /// The repository name with any trailing `.db` stripped.
    pub fn repo_name(&self) -> String {
        self.repository
            .strip_suffix(".db")
            .unwrap_or(&self.repository)
            .to_string()
    }

    /// The package pool directory: `--pool` if given, else `--root`.
    pub fn pool_dir(&self) -> PathBuf {
        self.pool.clone().unwrap_or_else(|| self.root.clone())
    }

    /// The architecture filter: `--arch` if given, else the local machine's
    /// architecture (equivalent to `uname -m`).
    pub fn arch(&self) -> String {
        self.arch
            .clone()
            .unwrap_or_else(|| std::env::consts::ARCH.to_string())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn strips_trailing_db_suffix() {
        let cli = Cli::parse_from(["repose", "myrepo.db"]);
        assert_eq!(cli.repo_name(), "myrepo");
    }

    #[test]
    fn keeps_name_without_db_suffix() {
        let cli = Cli::parse_from(["repose", "myrepo"]);
        assert_eq!(cli.repo_name(), "myrepo");
    }

    #[test]
    fn pool_defaults_to_root() {
        let cli = Cli::parse_from(["repose", "-r", "/srv/repo", "myrepo"]);
        assert_eq!(cli.pool_dir(), PathBuf::from("/srv/repo"));
    }

    #[test]
    fn explicit_pool_overrides_root() {
        let cli = Cli::parse_from(["repose", "-r", "/srv/repo", "-p", "/srv/pool", "myrepo"]);
        assert_eq!(cli.pool_dir(), PathBuf::from("/srv/pool"));
    }

    #[test]
    fn compression_flag_selects_kind() {
        let cli = Cli::parse_from(["repose", "-J", "myrepo"]);
        assert_eq!(cli.compression(), CompressionKind::Xz);
    }

    #[test]
    fn default_compression_is_gzip() {
        let cli = Cli::parse_from(["repose", "myrepo"]);
        assert_eq!(cli.compression(), CompressionKind::Gzip);
    }

    #[test]
    fn collects_trailing_targets() {
        let cli = Cli::parse_from(["repose", "myrepo", "foo", "bar"]);
        assert_eq!(cli.targets, vec!["foo".to_string(), "bar".to_string()]);
    }
}
