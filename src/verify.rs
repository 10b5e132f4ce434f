//! Integrity checks for a persisted key set.
//!
//! A key set is only trusted when the secret key, the public key file and
//! the hostname all describe the same identity. Any disagreement is an
//! [`IntegrityMismatch`](VanityError::IntegrityMismatch) and the identity
//! must not be served.

use std::path::Path;

use tracing::{error, info};

use crate::error::{Mismatch, Result, VanityError};
use crate::keyset::{self, PersistedKeySet, PUBLIC_KEY_HEADER, SECRET_KEY_HEADER};
use crate::onion;

/// An identity whose three artifacts agree with each other
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Address including the ".onion" suffix
    pub hostname: String,
    pub public_key: [u8; 32],
}

impl VerifiedIdentity {
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }
}

/// Cross-check the secret key, public key and hostname of a key set.
///
/// The public key is re-derived from the stored scalar as-is; the scalar is
/// never treated as a seed.
pub fn verify(key_set: &PersistedKeySet) -> Result<VerifiedIdentity> {
    let fail = |mismatch: Mismatch| {
        error!(dir = %key_set.dir.display(), %mismatch, "key set failed verification");
        Err(VanityError::IntegrityMismatch(mismatch))
    };

    if &key_set.secret_header != SECRET_KEY_HEADER {
        return fail(Mismatch::SecretHeader);
    }
    if &key_set.public_header != PUBLIC_KEY_HEADER {
        return fail(Mismatch::PublicHeader);
    }

    let derived = key_set.expanded_secret.public_key();
    if derived != key_set.public_key {
        return fail(Mismatch::SecretVsPublicKey);
    }

    let decoded = match onion::decode(&key_set.hostname) {
        Ok(decoded) => decoded,
        Err(_) => return fail(Mismatch::HostnameMalformed),
    };
    if decoded.version != onion::ONION_VERSION || !decoded.has_valid_checksum() {
        return fail(Mismatch::HostnameChecksum);
    }
    if decoded.public_key != key_set.public_key {
        return fail(Mismatch::HostnameVsPublicKey);
    }

    if let Some(record) = &key_set.metadata {
        let same_address = record.onion_address.eq_ignore_ascii_case(&key_set.hostname);
        let same_key = record
            .public_key
            .eq_ignore_ascii_case(&hex::encode(key_set.public_key));
        if !same_address || !same_key {
            return fail(Mismatch::Metadata);
        }
    }

    info!(hostname = %key_set.hostname, "key set verified");
    Ok(VerifiedIdentity {
        hostname: key_set.hostname.to_ascii_lowercase(),
        public_key: key_set.public_key,
    })
}

/// [`keyset::load`] followed by [`verify`]
pub fn load_and_verify(dir: &Path) -> Result<VerifiedIdentity> {
    let key_set = keyset::load(dir)?;
    verify(&key_set)
}
