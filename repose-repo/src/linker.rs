//! Places filename links from the repository root back into the pool.
//!
//! Grounded on `original_source/src/repose.c`'s `symlink_pkg`/`clone_pkg`/
//! `link_pkg`/`unlink_pkg`/`link_db`. The btrfs reflink path is this
//! crate's sole `unsafe` block, confined to [`reflink_file`].
#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use repose_cache::PackageCache;
use repose_types::{Package, Result};

nix::ioctl_write_int!(btrfs_ioc_clone, 0x94, 9);

/// Clones `src`'s data into `dest` via the btrfs `FICLONE` ioctl.
///
/// # Safety
///
/// `src` and `dest` must both be open file descriptors on the same btrfs
/// filesystem; the ioctl itself is what the kernel validates beyond that.
/// This is the crate's one deliberate `unsafe` block, isolated here exactly
/// as the original's `clone_pkg` isolates its `ioctl(FICLONE)` call.
unsafe fn reflink_file(dest: &File, src: &File) -> Result<()> {
    unsafe {
        btrfs_ioc_clone(dest.as_raw_fd(), src.as_raw_fd() as _)
            .map(|_| ())
            .map_err(|e| repose_types::ReposeError::Io(std::io::Error::from(e)))
    }
}

fn symlink_pkg(src: &Path, dest: &Path) -> Result<()> {
    match std::os::unix::fs::symlink(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn clone_pkg(src: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(src)?;
    let dest_file = match OpenOptions::new().write(true).truncate(true).open(dest) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            OpenOptions::new().write(true).create(true).truncate(true).open(dest)?
        }
        Err(e) => return Err(e.into()),
    };
    // SAFETY: both `src_file` and `dest_file` are plain opened files; the
    // kernel rejects the clone if they aren't on the same filesystem.
    unsafe { reflink_file(&dest_file, &src_file) }
}

fn link_pkg(pkg: &Package, root: &Path, pool: &Path, reflink: bool) -> Result<()> {
    let dest = root.join(&pkg.filename);
    let src = pool.join(&pkg.filename);
    if reflink {
        clone_pkg(&src, &dest)
    } else {
        symlink_pkg(&src, &dest)
    }
}

/// Removes `<root>/<filename>` if, and only if, it is a symlink.
///
/// Ported from `unlink_pkg`: a missing entry is a no-op; a reflinked copy
/// (a regular file, not a symlink) is deliberately left alone, matching
/// the original's `fstatat(AT_SYMLINK_NOFOLLOW)` guard.
pub fn unlink_pkg(root: &Path, filename: &str) -> Result<()> {
    let path = root.join(filename);
    let meta = match std::fs::symlink_metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if meta.file_type().is_symlink() {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

/// Places a link (symlink or reflink) at `<root>/<pkg.filename>` for every
/// package in `cache`.
///
/// A no-op when `pool == root`: the pool file already lives where the link
/// would go (the original's `link_db` checks `repo->pool` for exactly this
/// reason, since `repo->pool` is unset when the pool falls back to root).
///
/// # Errors
///
/// Propagates any I/O error from an individual link (other than a
/// tolerated `AlreadyExists` on a symlink target).
pub fn link_packages(cache: &PackageCache, root: &Path, pool: &Path, reflink: bool) -> Result<()> {
    if pool == root {
        return Ok(());
    }
    for pkg in cache.iter() {
        link_pkg(pkg, root, pool, reflink)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn symlinks_pool_package_into_root() -> TestResult {
        let pool = tempdir()?;
        let root = tempdir()?;
        fs::write(pool.path().join("foo-1.0-1-x86_64.pkg.tar.zst"), b"data")?;

        let mut cache = PackageCache::create(1);
        cache.add(Package::new("foo", "foo-1.0-1-x86_64.pkg.tar.zst"));

        link_packages(&cache, root.path(), pool.path(), false)?;

        let link = root.path().join("foo-1.0-1-x86_64.pkg.tar.zst");
        assert!(fs::symlink_metadata(&link)?.file_type().is_symlink());
        Ok(())
    }

    #[test]
    fn relinking_an_existing_symlink_is_tolerated() -> TestResult {
        let pool = tempdir()?;
        let root = tempdir()?;
        fs::write(pool.path().join("foo-1.0-1-x86_64.pkg.tar.zst"), b"data")?;

        let mut cache = PackageCache::create(1);
        cache.add(Package::new("foo", "foo-1.0-1-x86_64.pkg.tar.zst"));

        link_packages(&cache, root.path(), pool.path(), false)?;
        link_packages(&cache, root.path(), pool.path(), false)?;
        Ok(())
    }

    #[test]
    fn same_root_and_pool_skips_linking() -> TestResult {
        let dir = tempdir()?;
        fs::write(dir.path().join("foo-1.0-1-x86_64.pkg.tar.zst"), b"data")?;

        let mut cache = PackageCache::create(1);
        cache.add(Package::new("foo", "foo-1.0-1-x86_64.pkg.tar.zst"));

        link_packages(&cache, dir.path(), dir.path(), false)?;
        Ok(())
    }

    #[test]
    fn unlink_removes_only_symlinks() -> TestResult {
        let root = tempdir()?;
        fs::write(root.path().join("real-file"), b"data")?;
        std::os::unix::fs::symlink("real-file", root.path().join("link-file"))?;

        unlink_pkg(root.path(), "real-file")?;
        unlink_pkg(root.path(), "link-file")?;
        unlink_pkg(root.path(), "missing-file")?;

        assert!(root.path().join("real-file").exists());
        assert!(!root.path().join("link-file").exists());
        Ok(())
    }
}
