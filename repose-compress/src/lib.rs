//! Multi-backend tar compression shared by `repose-archive` and `repose-db`.
//!
//! Mirrors the structure of `alpm-compress`: a [`CompressionKind`] names the
//! algorithm, [`compression::CompressionEncoder`] and
//! [`decompression::CompressionDecoder`] wrap the matching `flate2`/`bzip2`/
//! `liblzma` backend behind a single `Read`/`Write` surface, and
//! [`tarball::TarballReader`]/[`tarball::TarballBuilder`] layer `tar` on top.
//!
//! Unlike `alpm-compress`, there is no zstd backend (this repository's
//! index format predates zstd) and the legacy Unix `compress` (`.Z`) format
//! is recognised but cannot be produced — no maintained Rust crate
//! implements its LZW variant.

#![deny(missing_docs)]

mod kind;

pub mod compression;
pub mod decompression;
pub mod tarball;

pub use kind::CompressionKind;
