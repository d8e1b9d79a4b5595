//! The pacman-compatible `vercmp` total order over `epoch:pkgver-pkgrel` strings.
//!
//! Unlike `alpm-types::Version`, which wraps validated `Epoch`/`Pkgver`/`Pkgrel`
//! newtypes that reject malformed input, [`Version`] here is permissive: a
//! repo desc file or a `.PKGINFO` can contain whatever string pacman itself
//! would happily accept, and this crate's job is to order it, not validate
//! it. The segment-walking comparison is the same algorithm as
//! `alpm-types::Pkgver`'s `Ord` impl, generalised to also drive the `pkgrel`
//! comparison (pacman's `rpmvercmp` is applied to both).

use std::cmp::Ordering;
use std::fmt;

/// A package version in `[epoch:]pkgver[-pkgrel]` form.
///
/// Comparison follows pacman's `vercmp`: epoch dominates, then `pkgver` is
/// compared segment by segment (alternating runs of digits and letters, with
/// numeric segments always outranking alpha segments), then `pkgrel` breaks
/// remaining ties using the same segment algorithm.
#[derive(Clone, Debug, Eq)]
pub struct Version {
    raw: String,
    epoch: Option<u64>,
    pkgver: String,
    pkgrel: Option<String>,
}

impl Version {
    /// Parses `s` into a [`Version`].
    ///
    /// The grammar is permissive by design: anything that doesn't parse as
    /// `epoch:` is simply treated as having no epoch, and anything after the
    /// first `-` is the release. Empty input produces a `Version` with an
    /// empty `pkgver`, matching the original's tolerance of malformed index
    /// entries.
    pub fn new(s: impl Into<String>) -> Self {
        let raw = s.into();
        let mut rest = raw.as_str();

        let epoch = if let Some((epoch_str, remainder)) = rest.split_once(':') {
            rest = remainder;
            epoch_str.parse::<u64>().ok()
        } else {
            None
        };

        let (pkgver, pkgrel) = match rest.split_once('-') {
            Some((pkgver, pkgrel)) => (pkgver.to_string(), Some(pkgrel.to_string())),
            None => (rest.to_string(), None),
        };

        Version {
            raw,
            epoch,
            pkgver,
            pkgrel,
        }
    }

    /// The epoch, if one was present and parsed as an integer.
    pub fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    /// The `pkgver` segment (between the epoch and the release).
    pub fn pkgver(&self) -> &str {
        &self.pkgver
    }

    /// The `pkgrel` segment, if present.
    pub fn pkgrel(&self) -> Option<&str> {
        self.pkgrel.as_deref()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Version::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Version::new(s)
    }
}

/// Compares two version segments (a `pkgver` or a `pkgrel`) the way pacman's
/// `rpmvercmp` does: walk alternating alpha/numeric runs left to right,
/// numeric runs always beat alpha runs, numeric runs compare by magnitude
/// (after stripping leading zeros), alpha runs compare lexically, and
/// whichever side runs out of segments first loses unless what remains on
/// the other side is alphabetic (trailing alpha never beats a shorter,
/// purely numeric-terminated string).
fn segment_cmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut a_rest = a;
    let mut b_rest = b;

    loop {
        // Skip non-alphanumeric separator runs on both sides; if the
        // separator lengths differ, that difference itself determines order.
        let a_sep_len = a_rest
            .chars()
            .take_while(|c| !c.is_ascii_alphanumeric())
            .count();
        let b_sep_len = b_rest
            .chars()
            .take_while(|c| !c.is_ascii_alphanumeric())
            .count();

        a_rest = skip_chars(a_rest, a_sep_len);
        b_rest = skip_chars(b_rest, b_sep_len);

        if a_rest.is_empty() || b_rest.is_empty() {
            break;
        }

        if a_sep_len != b_sep_len {
            return a_sep_len.cmp(&b_sep_len);
        }

        let a_numeric = a_rest.as_bytes()[0].is_ascii_digit();

        let (a_seg, a_after) = take_segment(a_rest, a_numeric);
        let (b_seg, b_after) = take_segment(b_rest, a_numeric);

        // A numeric segment always outranks an empty (alpha, by elimination)
        // counterpart segment.
        if b_seg.is_empty() {
            return if a_numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        if a_numeric {
            let a_trimmed = a_seg.trim_start_matches('0');
            let b_trimmed = b_seg.trim_start_matches('0');
            match a_trimmed.len().cmp(&b_trimmed.len()) {
                Ordering::Equal => {}
                other => return other,
            }
            match a_trimmed.cmp(b_trimmed) {
                Ordering::Equal => {}
                other => return other,
            }
        } else if a_seg != b_seg {
            return a_seg.cmp(b_seg);
        }

        a_rest = a_after;
        b_rest = b_after;
    }

    if a_rest.is_empty() && b_rest.is_empty() {
        return Ordering::Equal;
    }

    // One side ran out of segments. A remaining alpha segment never beats an
    // exhausted (or numeric) counterpart; anything else means the longer
    // side is newer.
    let a_alpha = a_rest.chars().next().is_some_and(|c| c.is_alphabetic());
    let b_alpha = b_rest.chars().next().is_some_and(|c| c.is_alphabetic());

    if (a_rest.is_empty() && !b_alpha) || (!a_rest.is_empty() && a_alpha) {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}

fn take_segment(s: &str, numeric: bool) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != numeric || !c.is_ascii_alphanumeric())
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.epoch.unwrap_or(0)).cmp(&other.epoch.unwrap_or(0)) {
            Ordering::Equal => {}
            other_order => return other_order,
        }

        match segment_cmp(&self.pkgver, &other.pkgver) {
            Ordering::Equal => {}
            other_order => return other_order,
        }

        segment_cmp(
            self.pkgrel.as_deref().unwrap_or(""),
            other.pkgrel.as_deref().unwrap_or(""),
        )
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

/// Compares `a` against `b` and returns pacman's three-way `vercmp` result:
/// `1` if `a` is newer, `0` if equal, `-1` if `a` is older.
///
/// ```
/// use repose_types::{vercmp, Version};
///
/// assert_eq!(vercmp(&Version::new("1.1-1"), &Version::new("1.0-1")), 1);
/// assert_eq!(vercmp(&Version::new("1:1.0-1"), &Version::new("2.0-5")), 1);
/// ```
pub fn vercmp(a: &Version, b: &Version) -> i8 {
    match a.cmp(b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}
