//! Tor V3 Vanity Onion Identity Library
//!
//! This library searches for Ed25519 keys whose onion address starts with
//! a chosen prefix, writes them in the hidden service directory layout Tor
//! reads, and verifies a stored key set before a service uses it.
//!
//! - `onion`: address encoding and decoding
//! - `keys`: keypairs, expanded secret keys and scalar re-derivation
//! - `matcher`: address predicates
//! - `search`: the parallel search coordinator
//! - `keyset`: saving and loading key set directories
//! - `verify`: integrity checks for a loaded key set
//! - `startup`: verify-or-generate workflow for service startup

pub mod config;
pub mod error;
pub mod keys;
pub mod keyset;
pub mod logging;
pub mod matcher;
pub mod onion;
pub mod search;
pub mod startup;
pub mod verify;

pub use error::{Mismatch, Result, VanityError};
pub use keys::{
    expand_secret_key, public_key_from_expanded, ExpandedSecretKey, KeyPair, KeyPairSource,
    OsKeySource,
};
pub use keyset::{load, save, PersistedKeySet, PUBLIC_KEY_HEADER, SECRET_KEY_HEADER};
pub use matcher::{AddressMatcher, PrefixPattern};
pub use onion::pubkey_to_onion;
pub use search::{format_speed, CancelToken, Progress, SearchCoordinator, VanityResult};
pub use startup::{provision_identity, IdentityState, ProvisionedIdentity};
pub use verify::{load_and_verify, verify, VerifiedIdentity};
