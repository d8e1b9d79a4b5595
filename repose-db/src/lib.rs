//! Reads and writes the pacman-compatible `desc`/`depends`/`files` index
//! archive format.
//!
//! `desc` parses the per-entry section text into [`repose_types::Package`]
//! fields; `index` loads a whole archive into a [`repose_cache::PackageCache`];
//! `writer` serialises one back out.

#![deny(missing_docs)]

pub mod desc;
pub mod index;
pub mod writer;

pub use index::load_index;
pub use writer::{Contents, write_index};
