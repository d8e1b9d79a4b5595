//! The [`Package`] record: the single entity this whole workspace revolves
//! around. Built either by `repose-archive`'s `.PKGINFO` parser or by
//! `repose-db`'s desc parser, and owned by at most one `repose-cache`
//! `PackageCache` at a time.

use crate::{sdbm, Version};

/// A single package's metadata, as tracked in a repository index.
///
/// `name`, `version` and `filename` are expected to be non-empty for any
/// package that is actually resident in a cache; the list fields never
/// contain empty strings.
#[derive(Clone, Debug, Default)]
pub struct Package {
    /// The package name. Primary key in the `repose-cache` `PackageCache`.
    pub name: String,
    /// SDBM hash of `name`. Kept in sync with `name` by [`Package::new`] and
    /// [`Package::set_name`]; never recomputed implicitly elsewhere.
    pub name_hash: u32,
    /// Split-package base name, if this package was built from a `pkgbase`
    /// that produced more than one package.
    pub base: Option<String>,
    /// `epoch:pkgver-pkgrel` version, ordered via [`crate::vercmp`].
    pub version: Version,
    /// The archive's file name within the pool.
    pub filename: String,
    pub desc: Option<String>,
    pub url: Option<String>,
    pub packager: Option<String>,
    pub arch: Option<String>,
    /// Compressed archive size in bytes.
    pub size: u64,
    /// Uncompressed install size in bytes.
    pub isize: u64,
    /// Seconds since epoch at which the package was built.
    pub builddate: i64,
    /// `max(archive mtime, signature mtime)`; used for reconciliation
    /// tie-breaking.
    pub mtime: i64,
    pub md5sum: Option<String>,
    pub sha256sum: Option<String>,
    /// Base64-encoded detached OpenPGP signature, if one was found.
    pub base64sig: Option<String>,
    pub groups: Vec<String>,
    pub licenses: Vec<String>,
    pub replaces: Vec<String>,
    pub depends: Vec<String>,
    pub conflicts: Vec<String>,
    pub provides: Vec<String>,
    pub optdepends: Vec<String>,
    pub makedepends: Vec<String>,
    pub checkdepends: Vec<String>,
    /// Archive contents minus the metadata entries (`.PKGINFO`, `.MTREE`,
    /// `.INSTALL`, `.CHANGELOG`).
    pub files: Vec<String>,
}

/// Archive entries that describe package metadata rather than payload, and
/// are therefore excluded from [`Package::files`].
pub const METADATA_ENTRIES: &[&str] = &[".PKGINFO", ".MTREE", ".INSTALL", ".CHANGELOG"];

impl Package {
    /// Creates a bare package with `name` and `filename` set, `name_hash`
    /// derived from `name`, and every other field at its default.
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        let name = name.into();
        let name_hash = sdbm(&name);
        Package {
            name,
            name_hash,
            filename: filename.into(),
            ..Default::default()
        }
    }

    /// Sets `name` and recomputes `name_hash` so the invariant
    /// `name_hash == sdbm(name)` always holds.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.name_hash = sdbm(&self.name);
    }

    /// Returns whether `entry_name` names a payload file rather than one of
    /// the four recognised metadata entries.
    pub fn is_payload_entry(entry_name: &str) -> bool {
        !METADATA_ENTRIES.contains(&entry_name)
    }

    /// The `<name>-<version>` string used as a directory name inside index
    /// archives and as the glob target for `fnmatch`-based target matching.
    pub fn name_version(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}
