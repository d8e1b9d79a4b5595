//! Walks the package pool directory into a [`PackageCache`].
//!
//! Grounded on `original_source/src/filecache.c`'s `scan_for_targets`/
//! `get_filecache`/`filecache_add`. The original dups and re-opens the pool
//! directory fd so a long-lived caller-held `dirfd` is left undisturbed;
//! this crate has no such long-lived fd to protect (each scan opens and
//! walks the directory itself via `std::fs::read_dir`), so that trick is
//! dropped as unneeded ceremony rather than ported literally (see
//! `DESIGN.md`).

use std::fs;
use std::path::Path;

use repose_archive::load_package_signature;
use repose_cache::PackageCache;
use repose_types::{vercmp, Package, Result};

use crate::filters::{match_arch, match_targets};

/// Inserts `pkg` into `cache`, keeping only the highest version per name.
///
/// Ported from `filecache_add`: a strictly newer version replaces the
/// stored one, an equal version also replaces it (last-in-wins among
/// duplicates), and a strictly older version is discarded.
fn add_with_version_dedup(cache: &mut PackageCache, pkg: Package) {
    let existing_version = cache.find(&pkg.name).map(|existing| existing.version.clone());
    match existing_version {
        Some(existing_version) if vercmp(&pkg.version, &existing_version) < 0 => {
            // Strictly older than what's already cached: discard.
        }
        Some(_) => {
            let name = pkg.name.clone();
            cache.replace(pkg, &name);
        }
        None => cache.add(pkg),
    }
}

/// Scans `pool` for package archives, filtering by `arch` and `targets` and
/// deduplicating on version per name.
///
/// Archives that fail to parse (`ReposeError::Skip`) are logged and
/// skipped, matching the original's swallow-and-continue behaviour; any
/// other I/O error aborts the scan.
///
/// # Errors
///
/// Fails if the pool directory itself cannot be read, or on any I/O error
/// other than a per-package parse failure.
pub fn scan_pool(pool: &Path, arch: &str, targets: &[String]) -> Result<PackageCache> {
    let hint = fs::read_dir(pool)?.count();
    let mut cache = PackageCache::create(hint);

    for entry in fs::read_dir(pool)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }

        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "sig") {
            continue;
        }

        // Any failure here means "not a package" (missing .PKGINFO, corrupt
        // archive, unreadable file): the pool is expected to contain
        // arbitrary non-package debris, so every per-file error is skipped
        // rather than aborting the whole scan.
        let mut pkg = match repose_archive::load_package(&path) {
            Ok(pkg) => pkg,
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                continue;
            }
        };

        if !match_arch(&pkg, arch) {
            continue;
        }
        if !match_targets(&pkg, targets) {
            continue;
        }

        match load_package_signature(&mut pkg, pool) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        add_with_version_dedup(&mut cache, pkg);
    }

    Ok(cache)
}
