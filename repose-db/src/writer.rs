//! Serialises a [`PackageCache`] back out as a compressed tar index.
//!
//! Grounded on `original_source/src/database.c`'s `compile_desc_entry`/
//! `compile_depends_entry`/`compile_files_entry`/`record_entry`/
//! `save_database`: the header ordering, the "scalar/list with a nil value
//! emits nothing" rule, and the lazy digest/signature/files fill-in are all
//! ported from those four functions. The single-trailing-blank-line
//! convention is applied uniformly here.

use std::io::Write;
use std::path::Path;

use repose_archive::{compute_digests, load_package_files, load_package_signature};
use repose_cache::PackageCache;
use repose_compress::CompressionKind;
use repose_compress::tarball::TarballBuilder;
use repose_types::{Package, Result};

/// Which of `desc`/`depends`/`files` to emit for each package.
///
/// The `.db` index writes `desc + depends`; the `.files` index writes
/// `files` alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Contents {
    /// Whether to emit the `desc` entry.
    pub desc: bool,
    /// Whether to emit the `depends` entry.
    pub depends: bool,
    /// Whether to emit the `files` entry.
    pub files: bool,
}

impl Contents {
    /// `desc + depends`, for a `.db` index.
    pub const DB: Contents = Contents {
        desc: true,
        depends: true,
        files: false,
    };

    /// `files` alone, for a `.files` index.
    pub const FILES: Contents = Contents {
        desc: false,
        depends: false,
        files: true,
    };
}

fn write_scalar(buf: &mut String, header: &str, value: Option<&str>) {
    if let Some(v) = value {
        if !v.is_empty() {
            buf.push_str(&format!("%{header}%\n{v}\n\n"));
        }
    }
}

fn write_uint(buf: &mut String, header: &str, value: u64) {
    buf.push_str(&format!("%{header}%\n{value}\n\n"));
}

fn write_int(buf: &mut String, header: &str, value: i64) {
    buf.push_str(&format!("%{header}%\n{value}\n\n"));
}

fn write_list(buf: &mut String, header: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    buf.push_str(&format!("%{header}%\n"));
    for v in values {
        buf.push_str(v);
        buf.push('\n');
    }
    buf.push('\n');
}

/// Builds the `desc` entry text for `pkg`, in the exact header order the
/// original writes them.
fn compile_desc(pkg: &Package) -> String {
    let mut buf = String::new();
    write_scalar(&mut buf, "FILENAME", Some(pkg.filename.as_str()));
    write_scalar(&mut buf, "NAME", Some(pkg.name.as_str()));
    write_scalar(&mut buf, "BASE", pkg.base.as_deref());
    write_scalar(&mut buf, "VERSION", Some(pkg.version.to_string()).as_deref());
    write_scalar(&mut buf, "DESC", pkg.desc.as_deref());
    write_list(&mut buf, "GROUPS", &pkg.groups);
    write_uint(&mut buf, "CSIZE", pkg.size);
    write_uint(&mut buf, "ISIZE", pkg.isize);
    write_scalar(&mut buf, "MD5SUM", pkg.md5sum.as_deref());
    write_scalar(&mut buf, "SHA256SUM", pkg.sha256sum.as_deref());
    write_scalar(&mut buf, "PGPSIG", pkg.base64sig.as_deref());
    write_scalar(&mut buf, "URL", pkg.url.as_deref());
    write_list(&mut buf, "LICENSE", &pkg.licenses);
    write_scalar(&mut buf, "ARCH", pkg.arch.as_deref());
    write_int(&mut buf, "BUILDDATE", pkg.builddate);
    write_scalar(&mut buf, "PACKAGER", pkg.packager.as_deref());
    write_list(&mut buf, "REPLACES", &pkg.replaces);
    buf
}

/// Builds the `depends` entry text for `pkg`.
fn compile_depends(pkg: &Package) -> String {
    let mut buf = String::new();
    write_list(&mut buf, "DEPENDS", &pkg.depends);
    write_list(&mut buf, "CONFLICTS", &pkg.conflicts);
    write_list(&mut buf, "PROVIDES", &pkg.provides);
    write_list(&mut buf, "OPTDEPENDS", &pkg.optdepends);
    write_list(&mut buf, "MAKEDEPENDS", &pkg.makedepends);
    write_list(&mut buf, "CHECKDEPENDS", &pkg.checkdepends);
    buf
}

/// Builds the `files` entry text for `pkg`.
fn compile_files(pkg: &Package) -> String {
    let mut buf = String::new();
    write_list(&mut buf, "FILES", &pkg.files);
    buf
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Writes `secs` into a raw GNU octal time field: left-zero-padded octal
/// digits followed by a trailing NUL, matching the encoding `tar::Header`
/// uses internally for the fields it exposes setters for (`mtime`, `size`,
/// ...).
fn set_octal_time(field: &mut [u8; 12], secs: u64) {
    let octal = format!("{secs:o}");
    let width = field.len() - 1;
    let start = width.saturating_sub(octal.len());
    field.fill(b'0');
    field[start..width].copy_from_slice(octal.as_bytes());
    field[width] = 0;
}

fn append_entry<W: Write>(builder: &mut tar::Builder<W>, dir: &str, name: &str, data: &str) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    let now = now_secs();
    header.set_mtime(now);
    // Spec calls for "pax restricted" with all three timestamps set to
    // wall-clock; `tar::Header`'s safe API only exposes a setter for mtime.
    // atime/ctime are the same GNU-format fields pax restricted would carry
    // as extended records, so they're poked directly through `as_gnu_mut`
    // (see DESIGN.md).
    if let Some(gnu) = header.as_gnu_mut() {
        set_octal_time(&mut gnu.atime, now);
        set_octal_time(&mut gnu.ctime, now);
    }
    header.set_cksum();
    builder.append_data(&mut header, format!("{dir}/{name}"), data.as_bytes())?;
    Ok(())
}

/// Computes `md5sum`/`sha256sum` from the pool archive if either is unset,
/// and loads a detached signature if one wasn't already attached.
///
/// Ported from `compile_desc_entry`'s lazy fill-in: digests are always
/// computed from the pool file the first time a package is written, and a
/// missing signature file is not an error (it just means unsigned).
fn fill_digests_and_signature(pkg: &mut Package, pool_dir: &Path) -> Result<()> {
    if pkg.md5sum.is_none() || pkg.sha256sum.is_none() {
        let path = pool_dir.join(&pkg.filename);
        let (md5, sha256) = compute_digests(&path)?;
        pkg.md5sum = Some(md5);
        pkg.sha256sum = Some(sha256);
    }
    if pkg.base64sig.is_none() {
        match load_package_signature(pkg, pool_dir) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Loads `pkg.files` from the pool archive if it's empty.
fn fill_files(pkg: &mut Package, pool_dir: &Path) -> Result<()> {
    if pkg.files.is_empty() {
        let path = pool_dir.join(&pkg.filename);
        load_package_files(pkg, &path)?;
    }
    Ok(())
}

/// Serialises every package in `cache` into a compressed tar index written
/// to `dest`.
///
/// Packages are visited in the cache's list order. Before writing `desc`,
/// missing digests and signatures are lazily computed from `pool_dir` and
/// cached back onto the package; before writing `files`, a missing file
/// list is likewise lazily populated. Locking the destination for the
/// duration of the write is the caller's responsibility (`repose-repo`
/// holds an advisory `flock` around this call).
///
/// # Errors
///
/// Propagates any I/O, archive, or digest-computation error. Digests and
/// signatures are read from `pool_dir`, so a package whose pool file has
/// gone missing fails the whole write (the reconciler is expected to have
/// already dropped such entries via `reduce`).
pub fn write_index<W: Write>(
    cache: &mut PackageCache,
    dest: W,
    kind: CompressionKind,
    contents: Contents,
    pool_dir: &Path,
) -> Result<W> {
    kind.check_encodable()?;
    let mut builder = TarballBuilder::new(dest, kind)?;

    let names: Vec<String> = cache.iter().map(|p| p.name.clone()).collect();
    for name in names {
        let pkg = cache.find_mut(&name).expect("name collected from this cache");

        if contents.desc || contents.depends {
            fill_digests_and_signature(pkg, pool_dir)?;
        }
        if contents.files {
            fill_files(pkg, pool_dir)?;
        }

        let dir = pkg.name_version();
        if contents.desc {
            let text = compile_desc(pkg);
            append_entry(builder.inner_mut(), &dir, "desc", &text)?;
        }
        if contents.depends {
            let text = compile_depends(pkg);
            append_entry(builder.inner_mut(), &dir, "depends", &text)?;
        }
        if contents.files {
            let text = compile_files(pkg);
            append_entry(builder.inner_mut(), &dir, "files", &text)?;
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::BufReader;

    use pretty_assertions::assert_eq;
    use repose_compress::tarball::TarballReader;
    use tempfile::tempdir;
    use testresult::TestResult;

    use super::*;
    use crate::index::load_index;

    fn write_pool_package(dir: &Path, name: &str, version: &str) -> TestResult<Package> {
        let filename = format!("{name}-{version}-x86_64.pkg.tar.zst");
        let mut builder = repose_compress::tarball::TarballBuilder::new(
            File::create(dir.join(&filename))?,
            CompressionKind::None,
        )?;
        let pkginfo = format!("pkgname = {name}\npkgver = {version}\narch = x86_64\n");
        let mut header = tar::Header::new_gnu();
        header.set_size(pkginfo.len() as u64);
        header.set_cksum();
        builder.inner_mut().append_data(&mut header, ".PKGINFO", pkginfo.as_bytes())?;
        let payload = b"binary-contents";
        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64);
        header.set_cksum();
        builder.inner_mut().append_data(&mut header, "usr/bin/demo", &payload[..])?;
        builder.finish()?;

        let mut pkg = Package::new(name, filename);
        pkg.version = version.into();
        Ok(pkg)
    }

    #[test]
    fn writes_and_reloads_a_db_index() -> TestResult {
        let pool = tempdir()?;
        let pkg = write_pool_package(pool.path(), "foo", "1.0-1")?;

        let mut cache = PackageCache::create(1);
        cache.add(pkg);

        let bytes = write_index(&mut cache, Vec::new(), CompressionKind::None, Contents::DB, pool.path())?;
        assert!(!bytes.is_empty());

        let reloaded = load_index(bytes.as_slice(), CompressionKind::None)?;
        let pkg = reloaded.find("foo").unwrap();
        assert_eq!(pkg.version.to_string(), "1.0-1");
        assert!(pkg.md5sum.is_some());
        assert!(pkg.sha256sum.is_some());
        Ok(())
    }

    #[test]
    fn files_index_carries_only_files_section() -> TestResult {
        let pool = tempdir()?;
        let pkg = write_pool_package(pool.path(), "foo", "1.0-1")?;
        let mut cache = PackageCache::create(1);
        cache.add(pkg);

        let bytes = write_index(&mut cache, Vec::new(), CompressionKind::None, Contents::FILES, pool.path())?;
        let mut reader = TarballReader::new(BufReader::new(bytes.as_slice()), CompressionKind::None)?;
        let mut saw_files = false;
        for entry in reader.entries()? {
            let entry = entry?;
            let path = entry.path().to_string_lossy().into_owned();
            assert!(path.ends_with("/files"), "unexpected entry in .files index: {path}");
            saw_files = true;
        }
        assert!(saw_files);
        Ok(())
    }

    #[test]
    fn empty_cache_writes_an_empty_archive() -> TestResult {
        let pool = tempdir()?;
        let mut cache = PackageCache::create(0);
        let bytes = write_index(&mut cache, Vec::new(), CompressionKind::Gzip, Contents::DB, pool.path())?;
        assert!(!bytes.is_empty());
        Ok(())
    }
}
