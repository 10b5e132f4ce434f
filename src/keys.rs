//! Ed25519 key material: random keypairs, expanded secret keys and
//! public key re-derivation from a stored scalar.

use std::fmt;

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::Scalar;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};

use crate::error::{Result, VanityError};

/// A freshly generated keypair. Only the public half is needed to test a
/// candidate address; the seed is expanded once the address matches.
#[derive(Clone)]
pub struct KeyPair {
    pub public_key: [u8; 32],
    pub seed: [u8; 32],
}

impl KeyPair {
    /// Derive the keypair for a 32-byte Ed25519 seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        Self {
            public_key: signing_key.verifying_key().to_bytes(),
            seed,
        }
    }

    /// Expand the seed into the 64-byte secret key stored by Tor
    pub fn expand(&self) -> ExpandedSecretKey {
        expand_secret_key(&self.seed)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

/// Clamped scalar (32 bytes) followed by the nonce prefix (32 bytes)
#[derive(Clone, PartialEq, Eq)]
pub struct ExpandedSecretKey([u8; 64]);

impl ExpandedSecretKey {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// The first 32 bytes, used directly as the signing scalar
    pub fn scalar_bytes(&self) -> [u8; 32] {
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&self.0[..32]);
        scalar
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Public key A = s * B for the stored scalar s
    pub fn public_key(&self) -> [u8; 32] {
        public_key_from_expanded(self)
    }
}

impl fmt::Debug for ExpandedSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExpandedSecretKey(<redacted>)")
    }
}

/// Expand a seed the way Ed25519 does: SHA-512, then clamp the scalar half.
pub fn expand_secret_key(seed: &[u8; 32]) -> ExpandedSecretKey {
    let hash = Sha512::digest(seed);
    let mut expanded = [0u8; 64];
    expanded.copy_from_slice(&hash);

    expanded[0] &= 248;
    expanded[31] &= 127;
    expanded[31] |= 64;
    ExpandedSecretKey(expanded)
}

/// Public key for an expanded secret key, taken from its scalar half
pub fn public_key_from_expanded(expanded: &ExpandedSecretKey) -> [u8; 32] {
    public_key_from_scalar(&expanded.scalar_bytes())
}

/// Multiply the basepoint by a stored scalar.
///
/// The bytes are taken as a ready-made scalar, not rehashed as a seed.
pub fn public_key_from_scalar(scalar_bytes: &[u8; 32]) -> [u8; 32] {
    let scalar = Scalar::from_bytes_mod_order(*scalar_bytes);
    let public_key_point = scalar * ED25519_BASEPOINT_POINT;
    public_key_point.compress().to_bytes()
}

/// Produces fresh random keypairs for the search workers.
pub trait KeyPairSource: Sync {
    fn next_keypair(&self) -> Result<KeyPair>;
}

/// Keypairs seeded straight from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeySource;

impl KeyPairSource for OsKeySource {
    fn next_keypair(&self) -> Result<KeyPair> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| VanityError::EntropyFailure(e.to_string()))?;
        Ok(KeyPair::from_seed(seed))
    }
}
