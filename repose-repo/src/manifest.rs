//! Loads the optional `<repo>.manifest` target list.
//!
//! Grounded on `original_source/src/repose.c`'s `load_manifest`: one target
//! per line, used as a target list fallback when none are given on the
//! command line.

use std::path::Path;

use repose_types::Result;

/// Reads `path` as a plain-text manifest, one target per line.
///
/// Blank lines are skipped. Returns an empty `Vec` (not an error) if `path`
/// does not exist, since a manifest is optional.
///
/// # Errors
///
/// Propagates any I/O error other than the file not existing.
pub fn load_manifest(path: &Path) -> Result<Vec<String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
