//! Loads [`Package`] records and auxiliary metadata from pool archives.
//!
//! Grounded on `load_package`/`load_package_files`/`load_package_signature`
//! in `package.c`, restructured around `repose_compress::TarballReader`
//! instead of `libarchive`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};
use repose_compress::CompressionKind;
use repose_compress::tarball::TarballReader;
use repose_types::{Package, Result};
use sha2::Sha256;

use crate::pkginfo::parse_pkginfo;

fn mtime_secs(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Loads a [`Package`] from the archive at `path`, locating and parsing its
/// `.PKGINFO` entry.
///
/// # Errors
///
/// Returns [`repose_types::ReposeError::Skip`] if no `.PKGINFO` entry is
/// found (the original's "not a package"), and propagates any I/O or
/// archive error otherwise.
pub fn load_package(path: &Path) -> Result<Package> {
    let metadata = std::fs::metadata(path)?;
    let kind = CompressionKind::from_path(path);
    let file = File::open(path)?;
    let mut reader = TarballReader::new(BufReader::new(file), kind)?;

    let mut pkg = Package::default();
    let mut found = false;
    {
        let entries = reader.entries()?;
        for entry in entries {
            let mut entry = entry?;
            if entry.path() == Path::new(".PKGINFO") {
                parse_pkginfo(&mut entry, &mut pkg)?;
                found = true;
                break;
            }
        }
    }

    if !found {
        return Err(repose_types::ReposeError::Skip(format!(
            "{}: no .PKGINFO entry",
            path.display()
        )));
    }

    pkg.filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    pkg.size = metadata.len();
    pkg.mtime = mtime_secs(&metadata);
    pkg.name_hash = repose_types::sdbm(&pkg.name);

    Ok(pkg)
}

/// Re-scans the archive at `path` and records every entry that isn't one of
/// the four metadata entries into `pkg.files`.
///
/// # Errors
///
/// Propagates any I/O or archive error.
pub fn load_package_files(pkg: &mut Package, path: &Path) -> Result<()> {
    let kind = CompressionKind::from_path(path);
    let file = File::open(path)?;
    let mut reader = TarballReader::new(BufReader::new(file), kind)?;

    let mut files = Vec::new();
    for entry in reader.entries()? {
        let entry = entry?;
        let name = entry.path().to_string_lossy().into_owned();
        if Package::is_payload_entry(&name) {
            files.push(name);
        }
    }

    pkg.files = files;
    Ok(())
}

/// Loads `<filename>.sig` from `dir` alongside the package, base64-encoding
/// it into `pkg.base64sig` and bumping `pkg.mtime` if the signature is
/// newer than the package itself.
///
/// # Errors
///
/// Returns [`repose_types::ReposeError::NotFound`] if no signature file
/// exists, distinguished from other I/O failures.
pub fn load_package_signature(pkg: &mut Package, dir: &Path) -> Result<()> {
    let sig_path = dir.join(format!("{}.sig", pkg.filename));

    let bytes = match std::fs::read(&sig_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(repose_types::ReposeError::NotFound);
        }
        Err(e) => return Err(e.into()),
    };

    pkg.base64sig = Some(BASE64.encode(&bytes));

    let metadata = std::fs::metadata(&sig_path)?;
    let sig_mtime = mtime_secs(&metadata);
    if sig_mtime > pkg.mtime {
        pkg.mtime = sig_mtime;
    }

    Ok(())
}

/// Computes the md5 and sha256 digests of the raw archive bytes at `path`,
/// as `%MD5SUM%`/`%SHA256SUM%` expect them: lowercase hex.
///
/// # Errors
///
/// Propagates any I/O error encountered while reading `path`.
pub fn compute_digests(path: &Path) -> Result<(String, String)> {
    let mut file = File::open(path)?;
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        md5.update(&buf[..n]);
        sha256.update(&buf[..n]);
    }

    Ok((
        format!("{:x}", md5.finalize()),
        format!("{:x}", sha256.finalize()),
    ))
}
