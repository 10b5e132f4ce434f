//! Parallel vanity address search
//!
//! A [`SearchCoordinator`] runs a fixed pool of CPU workers. Each worker
//! draws keypairs from a [`KeyPairSource`](crate::keys::KeyPairSource),
//! encodes the onion address and tests it against an
//! [`AddressMatcher`](crate::matcher::AddressMatcher). The first match wins,
//! every other worker is stopped and joined before the search returns.

mod coordinator;
mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::keys::{ExpandedSecretKey, KeyPair};
use crate::onion::{self, ONION_SUFFIX};

pub use coordinator::{default_workers, SearchCoordinator, DEFAULT_PROGRESS_INTERVAL};

/// Progress update from the search
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub keys_checked: u64,
    pub keys_per_sec: f64,
    pub elapsed_secs: f64,
}

/// A successfully found vanity key
#[derive(Debug, Clone)]
pub struct VanityResult {
    /// Lowercase base32 address without the ".onion" suffix
    pub onion_address: String,
    pub public_key: [u8; 32],
    pub expanded_secret: ExpandedSecretKey,
    /// Combined attempts of all workers when the match was found
    pub attempts: u64,
}

impl VanityResult {
    /// Build the result for a matching keypair, expanding its secret key
    pub fn from_keypair(keypair: &KeyPair, attempts: u64) -> Self {
        Self {
            onion_address: onion::encode(&keypair.public_key),
            public_key: keypair.public_key,
            expanded_secret: keypair.expand(),
            attempts,
        }
    }

    /// The address with its ".onion" suffix, as written to the hostname file
    pub fn hostname(&self) -> String {
        format!("{}{}", self.onion_address, ONION_SUFFIX)
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    pub fn expanded_secret_hex(&self) -> String {
        self.expanded_secret.to_hex()
    }
}

/// Cloneable stop request shared with the caller (e.g. a Ctrl+C handler)
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Format speed for display
pub fn format_speed(speed: u64) -> String {
    if speed >= 1_000_000_000 {
        format!("{:.1}B", speed as f64 / 1_000_000_000.0)
    } else if speed >= 1_000_000 {
        format!("{:.1}M", speed as f64 / 1_000_000.0)
    } else if speed >= 1_000 {
        format!("{:.1}K", speed as f64 / 1_000.0)
    } else {
        format!("{}", speed)
    }
}
