//! Architecture and target matching.
//!
//! Ported from `original_source/src/filters.c`/`filters.h`: `match_arch` is
//! an exact-or-`any` comparison, `match_target`/`match_targets` try an
//! exact filename/name match before falling back to a POSIX glob against
//! `name-version`.

use repose_types::Package;

/// Whether `pkg.arch` equals `arch`, or is the special value `any`.
///
/// A package with no `arch` set never matches (mirrors the original's
/// `pkg->arch` being mandatory for anything actually loaded from a real
/// `.PKGINFO`).
pub fn match_arch(pkg: &Package, arch: &str) -> bool {
    match pkg.arch.as_deref() {
        Some(pkg_arch) => pkg_arch == arch || pkg_arch == "any",
        None => false,
    }
}

/// Whether `target` identifies `pkg`: by exact filename, by exact name, or
/// by glob match against `name-version`.
pub fn match_target(pkg: &Package, target: &str) -> bool {
    if target == pkg.filename || target == pkg.name {
        return true;
    }

    let fullname = pkg.name_version();
    match fnmatch_regex::glob_to_regex(target) {
        Ok(re) => re.is_match(&fullname),
        Err(e) => {
            log::warn!("invalid target pattern {target:?}: {e}");
            false
        }
    }
}

/// Whether any target in `targets` matches `pkg`. An empty target list
/// matches everything (the "no explicit targets" case).
pub fn match_targets(pkg: &Package, targets: &[String]) -> bool {
    targets.is_empty() || targets.iter().any(|t| match_target(pkg, t))
}
