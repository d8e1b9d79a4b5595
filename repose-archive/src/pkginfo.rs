//! Parses `.PKGINFO` entries and builds a [`Package`] from a pool archive.
//!
//! The keyword table below is a direct port of `pkginfo_assignment` in
//! `package.c`: unknown keys are ignored, known keys dispatch to a typed
//! setter on [`Package`].

use std::io::Read;

use repose_types::Package;

use crate::reader::ArchiveReader;

/// Parses `.PKGINFO` text from `entry`, filling in `pkg`'s fields.
///
/// # Errors
///
/// Fails if a non-blank, non-comment line has no `=` separator, or if the
/// underlying read fails.
pub fn parse_pkginfo<R: Read>(entry: R, pkg: &mut Package) -> repose_types::Result<()> {
    let mut reader = ArchiveReader::new(entry);

    while let Some(raw) = reader.getline()? {
        let text = String::from_utf8_lossy(&raw);
        let text = match text.find('#') {
            Some(idx) => text[..idx].to_string(),
            None => text.into_owned(),
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match text.split_once('=') {
            Some((key, value)) => assign(pkg, key.trim(), value.trim()),
            None => {
                return Err(repose_types::ReposeError::Fatal(format!(
                    "malformed .PKGINFO line (missing '='): {text}"
                )));
            }
        }
    }

    Ok(())
}

fn assign(pkg: &mut Package, key: &str, value: &str) {
    match key {
        "pkgname" => pkg.set_name(value),
        "pkgbase" => pkg.base = Some(value.to_string()),
        "pkgver" => pkg.version = value.into(),
        "pkgdesc" => pkg.desc = Some(value.to_string()),
        "url" => pkg.url = Some(value.to_string()),
        "builddate" => pkg.builddate = value.parse().unwrap_or(0),
        "packager" => pkg.packager = Some(value.to_string()),
        "size" => pkg.isize = value.parse().unwrap_or(0),
        "arch" => pkg.arch = Some(value.to_string()),
        "group" => pkg.groups.push(value.to_string()),
        "license" => pkg.licenses.push(value.to_string()),
        "replaces" => pkg.replaces.push(value.to_string()),
        "depend" => pkg.depends.push(value.to_string()),
        "conflict" => pkg.conflicts.push(value.to_string()),
        "provides" => pkg.provides.push(value.to_string()),
        "optdepend" => pkg.optdepends.push(value.to_string()),
        "makedepend" => pkg.makedepends.push(value.to_string()),
        "checkdepend" => pkg.checkdepends.push(value.to_string()),
        // Unrecognised keys are ignored, matching the original's silent
        // fallthrough in `pkginfo_assignment`.
        _ => log::trace!("ignoring unknown .PKGINFO key: {key}"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_scalars_and_lists() {
        let data = b"\
pkgname = example
pkgbase = example
pkgver = 1:1.0.0-1
pkgdesc = An example package
url = https://example.org/
builddate = 1729181726
packager = Jane Doe <jane@example.org>
size = 181849963
arch = x86_64
license = MIT
license = Apache-2.0
depend = glibc
depend = gcc-libs
# a comment line
optdepend = python: for scripts
";
        let mut pkg = Package::default();
        parse_pkginfo(&data[..], &mut pkg).unwrap();

        assert_eq!(pkg.name, "example");
        assert_eq!(pkg.base.as_deref(), Some("example"));
        assert_eq!(pkg.version.to_string(), "1:1.0.0-1");
        assert_eq!(pkg.desc.as_deref(), Some("An example package"));
        assert_eq!(pkg.builddate, 1729181726);
        assert_eq!(pkg.isize, 181849963);
        assert_eq!(pkg.arch.as_deref(), Some("x86_64"));
        assert_eq!(pkg.licenses, vec!["MIT", "Apache-2.0"]);
        assert_eq!(pkg.depends, vec!["glibc", "gcc-libs"]);
        assert_eq!(pkg.optdepends, vec!["python: for scripts"]);
    }

    #[test]
    fn ignores_unknown_keys() {
        let data = b"pkgname = foo\nsomenewfield = whatever\n";
        let mut pkg = Package::default();
        parse_pkginfo(&data[..], &mut pkg).unwrap();
        assert_eq!(pkg.name, "foo");
    }

    #[test]
    fn errors_on_missing_equals() {
        let data = b"pkgname foo\n";
        let mut pkg = Package::default();
        assert!(parse_pkginfo(&data[..], &mut pkg).is_err());
    }

    #[test]
    fn blank_and_comment_only_lines_are_skipped() {
        let data = b"\n# just a comment\npkgname = foo\n";
        let mut pkg = Package::default();
        parse_pkginfo(&data[..], &mut pkg).unwrap();
        assert_eq!(pkg.name, "foo");
    }
}
