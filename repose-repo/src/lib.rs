//! Pool scanning, reconciliation, linking and run orchestration for
//! `repose`.
//!
//! This crate sits above `repose-archive` (pool archive parsing) and
//! `repose-db` (index archive reading/writing), wiring both into the
//! filesystem: it walks the pool, decides what changed against an existing
//! index, writes the new one, and places the filename links back into the
//! repository root.

#![deny(missing_docs)]

pub mod config;
pub mod driver;
pub mod filters;
pub mod linker;
pub mod manifest;
pub mod reconciler;
pub mod scanner;
pub mod signing;

pub use config::Config;
pub use driver::{Driver, RunReport};
pub use manifest::load_manifest;
pub use signing::{NullSigner, Signer};

// `repose-cli` builds a `Config` directly and never depends on
// `repose-compress` itself, so the compression enum is re-exported here.
pub use repose_compress::CompressionKind;
