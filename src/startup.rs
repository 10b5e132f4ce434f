//! Identity provisioning for a service about to start.
//!
//! ```text
//! NoPersistedKey  -> Searching -> Saved
//! HasPersistedKey -> Verifying -> Verified | Corrupt
//! ```
//!
//! `Corrupt` is fatal: the error is returned and the existing files are
//! left untouched for the operator to inspect.

use std::path::Path;

use tracing::{error, info};

use crate::error::{Result, VanityError};
use crate::keys::KeyPairSource;
use crate::keyset;
use crate::search::SearchCoordinator;
use crate::verify::{self, VerifiedIdentity};

/// States of the startup workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    NoPersistedKey,
    Searching,
    Saved,
    HasPersistedKey,
    Verifying,
    Verified,
    Corrupt,
}

impl IdentityState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            IdentityState::Saved | IdentityState::Verified | IdentityState::Corrupt
        )
    }
}

/// Identity ready to be handed to the network service
#[derive(Debug, Clone)]
pub struct ProvisionedIdentity {
    /// `Saved` for a freshly generated key set, `Verified` for an existing one
    pub state: IdentityState,
    pub identity: VerifiedIdentity,
    /// Search attempts, when the key set was generated by this call
    pub attempts: Option<u64>,
}

struct Tracker {
    state: IdentityState,
}

impl Tracker {
    fn start(state: IdentityState) -> Self {
        info!(state = ?state, "identity state");
        Self { state }
    }

    fn advance(&mut self, next: IdentityState) {
        info!(from = ?self.state, to = ?next, "identity state");
        self.state = next;
    }

    fn fail(&mut self, err: VanityError) -> VanityError {
        self.advance(IdentityState::Corrupt);
        error!(error = %err, "persisted identity rejected");
        err
    }
}

/// Make sure `dir` holds a verified key set, generating one when absent.
///
/// An existing set is loaded and verified; a missing one is searched for
/// with `prefix` and saved. A corrupt or inconsistent set is never
/// overwritten.
pub fn provision_identity<S: KeyPairSource>(
    dir: &Path,
    prefix: &str,
    coordinator: &SearchCoordinator<S>,
) -> Result<ProvisionedIdentity> {
    let key_set = match keyset::load(dir) {
        Ok(key_set) => Some(key_set),
        Err(VanityError::NotFound(_)) => None,
        Err(e) if e.is_integrity_failure() => {
            let mut tracker = Tracker::start(IdentityState::HasPersistedKey);
            return Err(tracker.fail(e));
        }
        Err(e) => return Err(e),
    };

    match key_set {
        Some(key_set) => {
            let mut tracker = Tracker::start(IdentityState::HasPersistedKey);
            tracker.advance(IdentityState::Verifying);
            let identity = verify::verify(&key_set).map_err(|e| tracker.fail(e))?;
            keyset::restrict_permissions(dir)?;
            tracker.advance(IdentityState::Verified);

            Ok(ProvisionedIdentity {
                state: tracker.state,
                identity,
                attempts: None,
            })
        }
        None => {
            let mut tracker = Tracker::start(IdentityState::NoPersistedKey);
            tracker.advance(IdentityState::Searching);
            let result = coordinator.search(prefix)?;
            let key_set = keyset::save(dir, &result)?;
            let identity = verify::verify(&key_set)?;
            tracker.advance(IdentityState::Saved);

            Ok(ProvisionedIdentity {
                state: tracker.state,
                identity,
                attempts: Some(result.attempts),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Mismatch;
    use std::fs;

    #[test]
    fn test_generates_then_verifies() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        let coordinator = SearchCoordinator::new(2).unwrap();

        let first = provision_identity(&dir, "a", &coordinator).unwrap();
        assert_eq!(first.state, IdentityState::Saved);
        assert!(first.identity.hostname.starts_with('a'));
        assert!(first.attempts.is_some());

        let second = provision_identity(&dir, "zz", &coordinator).unwrap();
        assert_eq!(second.state, IdentityState::Verified);
        assert_eq!(second.identity, first.identity);
        assert!(second.attempts.is_none());
    }

    #[test]
    fn test_tampered_set_is_fatal_and_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        let coordinator = SearchCoordinator::new(1).unwrap();
        provision_identity(&dir, "", &coordinator).unwrap();

        let path = dir.join(keyset::PUBLIC_KEY_FILE);
        let mut public = fs::read(&path).unwrap();
        public[40] ^= 0x01;
        fs::write(&path, &public).unwrap();

        match provision_identity(&dir, "", &coordinator) {
            Err(VanityError::IntegrityMismatch(Mismatch::SecretVsPublicKey)) => {}
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(fs::read(&path).unwrap(), public);
    }

    #[test]
    fn test_truncated_set_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        let coordinator = SearchCoordinator::new(1).unwrap();
        provision_identity(&dir, "", &coordinator).unwrap();
        fs::write(dir.join(keyset::SECRET_KEY_FILE), b"short").unwrap();

        let err = provision_identity(&dir, "", &coordinator).unwrap_err();
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn test_terminal_states() {
        assert!(IdentityState::Saved.is_terminal());
        assert!(IdentityState::Verified.is_terminal());
        assert!(IdentityState::Corrupt.is_terminal());
        assert!(!IdentityState::Verifying.is_terminal());
        assert!(!IdentityState::Searching.is_terminal());
    }
}
