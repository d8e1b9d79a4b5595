//! Diffs the repository cache against the filecache and mutates the
//! repository cache accordingly.
//!
//! Grounded on `original_source/src/repose.c`'s `drop_from_repo`,
//! `reduce_repo` and `update_repo`.

use std::path::Path;

use repose_cache::PackageCache;
use repose_types::{vercmp, Result};

use crate::filters::match_targets;
use crate::linker;

/// Removes every package in `repo` matching any target in `targets`,
/// unlinking its pool-link from `root` too.
///
/// An empty `targets` drops nothing, matching `drop_from_repo`'s
/// `if (!targets || !repo->cache) return;` guard: unlike the scanner's
/// "no targets" case, an empty target list here must never be read as
/// "drop everything".
///
/// Returns whether anything was removed.
pub fn drop_targets(repo: &mut PackageCache, targets: &[String], root: &Path) -> Result<bool> {
    if targets.is_empty() {
        return Ok(false);
    }

    let matching: Vec<String> = repo
        .iter()
        .filter(|pkg| match_targets(pkg, targets))
        .map(|pkg| pkg.name.clone())
        .collect();

    let mut dirty = false;
    for name in matching {
        if let Some(pkg) = repo.remove(&name) {
            log::debug!("dropped {} {}", pkg.name, pkg.version);
            linker::unlink_pkg(root, &pkg.filename)?;
            dirty = true;
        }
    }
    Ok(dirty)
}

/// Removes every package in `repo` whose archive is no longer present in
/// `pool`.
///
/// # Errors
///
/// Fails if a pool file's accessibility can't be determined for a reason
/// other than it not existing (e.g. a permissions error).
pub fn reduce(repo: &mut PackageCache, pool: &Path) -> Result<bool> {
    let mut stale = Vec::new();
    for pkg in repo.iter() {
        match std::fs::metadata(pool.join(&pkg.filename)) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => stale.push(pkg.name.clone()),
            Err(e) => return Err(e.into()),
        }
    }

    let mut dirty = false;
    for name in stale {
        if let Some(pkg) = repo.remove(&name) {
            log::debug!("removed {}: pool file {} is gone", pkg.name, pkg.filename);
            dirty = true;
        }
    }
    Ok(dirty)
}

/// Adds, replaces or keeps every package in `filecache` against `repo`,
/// per the vercmp/mtime/builddate/signature tie-break rules.
///
/// On replacement, the previous pool-link for the replaced package's
/// filename is unlinked from `root` (the original C's `update_repo`
/// actually unlinks the *new* package's filename instead, which is very
/// likely a quirk of that implementation's reuse of a loop variable rather
/// than an intentional policy — see `DESIGN.md`).
pub fn update(repo: &mut PackageCache, filecache: &PackageCache, root: &Path) -> Result<bool> {
    let mut dirty = false;

    for p in filecache.iter() {
        let existing = repo.find(&p.name).map(|q| {
            (
                q.version.clone(),
                q.mtime,
                q.builddate,
                q.base64sig.is_some(),
                q.filename.clone(),
                q.name.clone(),
            )
        });

        match existing {
            None => {
                log::debug!("adding {} {}", p.name, p.version);
                repo.add(p.clone());
                dirty = true;
            }
            Some((old_version, old_mtime, old_builddate, old_has_sig, old_filename, old_name)) => {
                let cmp = vercmp(&p.version, &old_version);
                let replace = match cmp.cmp(&0) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Equal => {
                        p.mtime > old_mtime
                            || p.builddate > old_builddate
                            || (!old_has_sig && p.base64sig.is_some())
                    }
                    std::cmp::Ordering::Less => false,
                };

                if replace {
                    log::debug!("replacing {} {} with {}", p.name, old_version, p.version);
                    repo.replace(p.clone(), &old_name);
                    linker::unlink_pkg(root, &old_filename)?;
                    dirty = true;
                }
            }
        }
    }

    Ok(dirty)
}

#[cfg(test)]
mod tests {
    use repose_types::Package;
    use testresult::TestResult;

    use super::*;

    fn pkg(name: &str, version: &str, mtime: i64, builddate: i64, sig: Option<&str>) -> Package {
        let mut p = Package::new(name, format!("{name}-{version}-any.pkg.tar.zst"));
        p.version = version.into();
        p.mtime = mtime;
        p.builddate = builddate;
        p.base64sig = sig.map(str::to_string);
        p
    }

    #[test]
    fn update_adds_new_and_upgrades_newer_version() -> TestResult {
        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 0, 0, None));

        let mut filecache = PackageCache::create(4);
        filecache.add(pkg("foo", "1.1-1", 0, 0, None));
        filecache.add(pkg("bar", "1.0-1", 0, 0, None));

        let dir = tempfile::tempdir()?;
        let dirty = update(&mut repo, &filecache, dir.path())?;

        assert!(dirty);
        assert_eq!(repo.find("foo").unwrap().version.to_string(), "1.1-1");
        assert!(repo.find("bar").is_some());
        Ok(())
    }

    #[test]
    fn update_keeps_strictly_older_pool_version() -> TestResult {
        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 0, 0, None));

        let mut filecache = PackageCache::create(4);
        filecache.add(pkg("foo", "0.9-1", 0, 0, None));

        let dir = tempfile::tempdir()?;
        let dirty = update(&mut repo, &filecache, dir.path())?;

        assert!(!dirty);
        assert_eq!(repo.find("foo").unwrap().version.to_string(), "1.0-1");
        Ok(())
    }

    #[test]
    fn equal_version_replaces_on_newer_builddate() -> TestResult {
        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 100, 50, None));

        let mut filecache = PackageCache::create(4);
        filecache.add(pkg("foo", "1.0-1", 100, 60, None));

        let dir = tempfile::tempdir()?;
        let dirty = update(&mut repo, &filecache, dir.path())?;
        assert!(dirty);
        assert_eq!(repo.find("foo").unwrap().builddate, 60);
        Ok(())
    }

    #[test]
    fn equal_version_replaces_when_signature_gained() -> TestResult {
        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 100, 50, None));

        let mut filecache = PackageCache::create(4);
        filecache.add(pkg("foo", "1.0-1", 100, 50, Some("ABC")));

        let dir = tempfile::tempdir()?;
        let dirty = update(&mut repo, &filecache, dir.path())?;
        assert!(dirty);
        assert!(repo.find("foo").unwrap().base64sig.is_some());
        Ok(())
    }

    #[test]
    fn equal_version_no_change_keeps_existing() -> TestResult {
        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 100, 50, None));

        let mut filecache = PackageCache::create(4);
        filecache.add(pkg("foo", "1.0-1", 100, 50, None));

        let dir = tempfile::tempdir()?;
        let dirty = update(&mut repo, &filecache, dir.path())?;
        assert!(!dirty);
        Ok(())
    }

    #[test]
    fn reduce_drops_entries_whose_pool_file_vanished() -> TestResult {
        let pool = tempfile::tempdir()?;
        std::fs::write(pool.path().join("foo-1.0-1-any.pkg.tar.zst"), b"x")?;

        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 0, 0, None));
        repo.add(pkg("bar", "1.0-1", 0, 0, None));

        let dirty = reduce(&mut repo, pool.path())?;
        assert!(dirty);
        assert!(repo.find("foo").is_some());
        assert!(repo.find("bar").is_none());
        Ok(())
    }

    #[test]
    fn drop_removes_matching_targets_and_keeps_others() -> TestResult {
        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 0, 0, None));
        repo.add(pkg("foo-devel", "2.0-1", 0, 0, None));
        repo.add(pkg("bar", "1.0-1", 0, 0, None));

        let root = tempfile::tempdir()?;
        let dirty = drop_targets(&mut repo, &["foo*".to_string()], root.path())?;

        assert!(dirty);
        assert!(repo.find("foo").is_none());
        assert!(repo.find("foo-devel").is_none());
        assert!(repo.find("bar").is_some());
        Ok(())
    }

    #[test]
    fn drop_with_empty_targets_removes_nothing() -> TestResult {
        let mut repo = PackageCache::create(4);
        repo.add(pkg("foo", "1.0-1", 0, 0, None));
        repo.add(pkg("bar", "1.0-1", 0, 0, None));

        let root = tempfile::tempdir()?;
        let dirty = drop_targets(&mut repo, &[], root.path())?;

        assert!(!dirty);
        assert!(repo.find("foo").is_some());
        assert!(repo.find("bar").is_some());
        Ok(())
    }
}
