//! Streaming parsers for package pool archives.
//!
//! Finds and reads a package archive's `.PKGINFO` entry into a
//! [`repose_types::Package`], collects its payload file list, and loads a
//! detached signature alongside it on disk. Everything here streams through
//! `std::io::Read` over a `repose_compress` decoder; nothing is memory
//! mapped.

#![deny(missing_docs)]

mod package;
mod pkginfo;
mod reader;

pub use package::{compute_digests, load_package, load_package_files, load_package_signature};
pub use pkginfo::parse_pkginfo;
pub use reader::ArchiveReader;
