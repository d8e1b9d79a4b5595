//! Parses the `desc`/`depends`/`files` section format used inside index
//! archive entries.
//!
//! Grounded on `alpm-repo-db`'s `desc/parser.rs` for the low-level
//! `winnow` tokenising (a `%HEADER%` line, then value lines until a blank
//! line), but generalised: rather than building an intermediate
//! `RepoDescFileV1`-style struct of validated newtypes, each section is
//! dispatched straight onto a plain [`Package`] field, matching the
//! permissive "store what's there" semantics this format actually has on
//! disk (see `original_source/src/desc.c`'s header dispatch in
//! `read_desc`).

use repose_types::Package;
use winnow::ModalResult;
use winnow::Parser;
use winnow::ascii::{line_ending, till_line_ending};
use winnow::combinator::delimited;
use winnow::token::take_while;

/// One `%HEADER%` section and its (possibly empty) value lines.
type Section = (String, Vec<String>);

fn header(input: &mut &str) -> ModalResult<String> {
    let name = delimited("%", take_while(1.., |c: char| c != '%' && c != '\n'), "%").parse_next(input)?;
    line_ending.parse_next(input)?;
    Ok(name.to_string())
}

fn value_line(input: &mut &str) -> ModalResult<String> {
    let v: &str = till_line_ending.parse_next(input)?;
    // A bare entry (no trailing newline) is tolerated at EOF; an explicit
    // line_ending is consumed when present.
    if !input.is_empty() {
        line_ending.parse_next(input)?;
    }
    Ok(v.to_string())
}

/// Parses the full text of a `desc`/`depends`/`files` entry into a sequence
/// of `(header, values)` sections.
///
/// A blank line ends the current section. Consecutive blank lines, or a
/// blank line before the first section, are tolerated rather than required
/// to be singular, since foreign or hand-edited indexes may not emit the
/// single-trailing-blank-line convention this crate's own writer does.
pub fn parse_sections(text: &str) -> repose_types::Result<Vec<Section>> {
    let mut input = text;
    let mut sections = Vec::new();

    loop {
        while let Some(rest) = input.strip_prefix('\n') {
            input = rest;
        }
        if input.is_empty() {
            break;
        }

        let name = header(&mut input).map_err(|_| {
            repose_types::ReposeError::Fatal(format!(
                "malformed index entry: expected a %HEADER% line, found {:?}",
                &input[..input.len().min(32)]
            ))
        })?;

        let mut values = Vec::new();
        loop {
            if input.is_empty() || input.starts_with('\n') {
                if let Some(rest) = input.strip_prefix('\n') {
                    input = rest;
                }
                break;
            }
            if input.starts_with('%') {
                // Next header with no intervening blank line: tolerate it
                // as an implicit section boundary.
                break;
            }
            let line = value_line(&mut input)
                .map_err(|_| repose_types::ReposeError::Fatal("malformed value line".to_string()))?;
            values.push(line);
        }

        sections.push((name, values));
    }

    Ok(sections)
}

fn first(values: &[String]) -> Option<String> {
    values.first().cloned()
}

/// Applies one parsed `(header, values)` section onto `pkg`, per the
/// header-to-field table in `original_source/src/desc.c`'s `read_desc`.
/// Unknown headers are skipped, matching the original's tolerant fallback.
pub fn apply_section(pkg: &mut Package, header: &str, values: &[String]) {
    match header {
        "FILENAME" => {
            if let Some(v) = first(values) {
                pkg.filename = v;
            }
        }
        "NAME" => {
            if let Some(v) = first(values) {
                pkg.set_name(v);
            }
        }
        "BASE" => pkg.base = first(values),
        "VERSION" => {
            if let Some(v) = first(values) {
                pkg.version = v.into();
            }
        }
        "DESC" => pkg.desc = first(values),
        "URL" => pkg.url = first(values),
        "ARCH" => pkg.arch = first(values),
        "PACKAGER" => pkg.packager = first(values),
        "MD5SUM" => pkg.md5sum = first(values),
        "SHA256SUM" => pkg.sha256sum = first(values),
        "PGPSIG" => pkg.base64sig = first(values),
        "CSIZE" => pkg.size = first(values).and_then(|v| v.parse().ok()).unwrap_or(0),
        "ISIZE" => pkg.isize = first(values).and_then(|v| v.parse().ok()).unwrap_or(0),
        "BUILDDATE" => pkg.builddate = first(values).and_then(|v| v.parse().ok()).unwrap_or(0),
        "GROUPS" => pkg.groups = values.to_vec(),
        "LICENSE" => pkg.licenses = values.to_vec(),
        "REPLACES" => pkg.replaces = values.to_vec(),
        "DEPENDS" => pkg.depends = values.to_vec(),
        "CONFLICTS" => pkg.conflicts = values.to_vec(),
        "PROVIDES" => pkg.provides = values.to_vec(),
        "OPTDEPENDS" => pkg.optdepends = values.to_vec(),
        "MAKEDEPENDS" => pkg.makedepends = values.to_vec(),
        "CHECKDEPENDS" => pkg.checkdepends = values.to_vec(),
        "FILES" => pkg.files = values.to_vec(),
        other => log::trace!("skipping unknown index header: %{other}%"),
    }
}

/// Parses `text` and applies every section onto `pkg` in order.
pub fn parse_into(pkg: &mut Package, text: &str) -> repose_types::Result<()> {
    for (header, values) in parse_sections(text)? {
        apply_section(pkg, &header, &values);
    }
    Ok(())
}
