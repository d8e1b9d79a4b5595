//! The SDBM string hash used to key [`crate::Package`] in the package cache.
//!
//! Ported verbatim (arithmetic and all) from the original `sdbm()` in
//! `pkgcache.c`: `h = c + 65599 * h`, computed with wrapping `u32` arithmetic.
//! A null/empty string hashes to `0`.

/// Computes the SDBM hash of `s`.
///
/// ```
/// use repose_types::sdbm;
///
/// assert_eq!(sdbm(""), 0);
/// assert_eq!(sdbm("pacman"), sdbm("pacman"));
/// assert_ne!(sdbm("pacman"), sdbm("repose"));
/// ```
pub fn sdbm(s: &str) -> u32 {
    let mut hash: u32 = 0;
    for c in s.bytes() {
        hash = (c as u32).wrapping_add(hash.wrapping_mul(65599));
    }
    hash
}
