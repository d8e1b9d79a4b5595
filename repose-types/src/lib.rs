//! Core data types shared by every `repose` crate.
//!
//! This crate has no knowledge of archives, tar streams or the filesystem. It
//! defines the [`Package`] record, the [`Version`]/`vercmp` ordering, the
//! `sdbm` string hash used by [`repose-cache`](https://docs.rs/repose-cache),
//! and the crate-wide [`ReposeError`] type.

#![deny(missing_docs)]

mod error;
mod hash;
mod package;
mod version;

pub use error::{ArchiveLayerError, ReposeError, Result};
pub use hash::sdbm;
pub use package::Package;
pub use version::{vercmp, Version};
