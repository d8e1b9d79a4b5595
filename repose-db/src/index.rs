//! Loads an existing index archive (`<repo>.db`/`<repo>.files`) into a
//! [`PackageCache`].
//!
//! Grounded on `original_source/src/database.c`'s `load_database`/
//! `parse_db_entry`/`load_pkg_for_entry`/`db_read_pkg`: walk every regular
//! tar entry, split its path into `<name-version>/<type>`, parse `type`'s
//! content onto the package keyed by that directory, and finally hand every
//! accumulated package to the cache.

use std::collections::HashMap;
use std::io::BufRead;

use repose_cache::PackageCache;
use repose_compress::CompressionKind;
use repose_compress::tarball::TarballReader;
use repose_types::{Package, ReposeError, Result};

use crate::desc::parse_into;

/// Splits a `<name>-<version>` directory name into its `(name, version)`
/// parts.
///
/// Ported from `parse_db_entry`'s double `memrchr` search: the version is
/// always the last two dash-separated segments (`pkgver-pkgrel`), so the
/// split point is the second-to-last `-` in the string.
fn split_name_version(dirname: &str) -> Option<(&str, &str)> {
    let last_dash = dirname.rfind('-')?;
    let prior_dash = dirname[..last_dash].rfind('-')?;
    Some((&dirname[..prior_dash], &dirname[prior_dash + 1..]))
}

/// Loads every package recorded in the index archive read from `reader`.
///
/// Entries are grouped by their directory name and parsed regardless of
/// which of `desc`/`depends`/`files` are present (a `.files`-only index,
/// for instance, carries only `files` entries). On a name/version mismatch
/// between the directory name and the `desc` content, the `desc` content
/// wins; the mismatch is logged.
///
/// # Errors
///
/// Fails if a tar entry's path cannot be split into `<name-version>/<type>`,
/// or if any entry's content is malformed.
pub fn load_index<R: BufRead>(reader: R, kind: CompressionKind) -> Result<PackageCache> {
    let mut tarball = TarballReader::new(reader, kind)?;
    let mut by_dir: HashMap<String, Package> = HashMap::new();

    for entry in tarball.entries()? {
        let mut entry = entry?;
        if !entry.is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        let mut components = path.components();
        let dir = components
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .ok_or_else(|| ReposeError::Fatal(format!("index entry with no directory: {path:?}")))?;
        let kind_name = components
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .ok_or_else(|| ReposeError::Fatal(format!("index entry with no file name: {path:?}")))?;

        if !matches!(kind_name.as_str(), "desc" | "depends" | "files") {
            continue;
        }

        let pkg = match by_dir.get_mut(&dir) {
            Some(pkg) => pkg,
            None => {
                let (name, version) = split_name_version(&dir).ok_or_else(|| {
                    ReposeError::Fatal(format!(
                        "cannot parse index entry directory into name-version: {dir}"
                    ))
                })?;
                let mut pkg = Package::new(name, "");
                pkg.version = version.into();
                by_dir.insert(dir.clone(), pkg);
                by_dir.get_mut(&dir).expect("just inserted")
            }
        };

        let before_name = pkg.name.clone();
        let before_version = pkg.version.to_string();

        let content = entry.content()?;
        let text = String::from_utf8_lossy(&content);
        parse_into(pkg, &text)?;

        if pkg.name != before_name || pkg.version.to_string() != before_version {
            log::warn!(
                "index entry {dir}: desc content ({}-{}) disagrees with directory name, using desc content",
                pkg.name,
                pkg.version
            );
        }
    }

    let mut cache = PackageCache::create(by_dir.len());
    for pkg in by_dir.into_values() {
        cache.add_sorted(pkg);
    }
    Ok(cache)
}
