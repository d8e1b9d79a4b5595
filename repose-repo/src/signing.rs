//! The pluggable OpenPGP signing/verification back end.
//!
//! OpenPGP itself is an external collaborator this crate never implements:
//! [`Signer`] is the seam an embedder wires a real backend into.

use std::io::Read;

use repose_types::{ReposeError, Result};

/// Signs and verifies detached signatures over arbitrary byte streams.
pub trait Signer {
    /// Produces a detached signature over `data`.
    fn sign(&self, data: &mut dyn Read) -> Result<Vec<u8>>;

    /// Verifies `sig` as a detached signature over `data`.
    fn verify(&self, data: &mut dyn Read, sig: &mut dyn Read) -> Result<bool>;
}

/// The default [`Signer`]: fails any `sign` call, since no OpenPGP backend
/// ships with this crate. Used when `--sign` is requested without an
/// embedder-supplied backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSigner;

impl Signer for NullSigner {
    fn sign(&self, _data: &mut dyn Read) -> Result<Vec<u8>> {
        Err(ReposeError::Fatal(
            "signing backend not configured".to_string(),
        ))
    }

    fn verify(&self, _data: &mut dyn Read, _sig: &mut dyn Read) -> Result<bool> {
        Err(ReposeError::Fatal(
            "signing backend not configured".to_string(),
        ))
    }
}
