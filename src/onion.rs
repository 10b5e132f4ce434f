//! Tor v3 onion address encoding and decoding
//!
//! The address format is: base32(pubkey || checksum || version)
//! where checksum = SHA3-256(".onion checksum" || pubkey || version)[0..2]
//! and version = 0x03. The hostname form appends ".onion".

use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// Onion service protocol version encoded in every v3 address
pub const ONION_VERSION: u8 = 3;

/// Domain separation string hashed into the address checksum
pub const CHECKSUM_PREFIX: &[u8] = b".onion checksum";

/// Hostname suffix appended to the base32 address
pub const ONION_SUFFIX: &str = ".onion";

/// Length of an address without the ".onion" suffix
pub const ADDRESS_LEN: usize = 56;

const RAW_LEN: usize = 35;
const ALPHABET: base32::Alphabet = base32::Alphabet::Rfc4648Lower { padding: false };

/// Errors produced when decoding an address string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("expected 56 base32 characters, got {0}")]
    WrongLength(usize),

    #[error("'{0}' is not in the base32 alphabet")]
    InvalidCharacter(char),

    #[error("base32 payload could not be decoded")]
    Undecodable,

    #[error("unsupported onion version {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch")]
    BadChecksum,
}

/// The three components packed into an onion address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddress {
    pub public_key: [u8; 32],
    pub checksum: [u8; 2],
    pub version: u8,
}

impl DecodedAddress {
    /// Whether the embedded checksum matches the one recomputed from the key
    pub fn has_valid_checksum(&self) -> bool {
        onion_checksum(&self.public_key, self.version) == self.checksum
    }
}

/// Whether `c` belongs to the lowercase address alphabet (`a-z`, `2-7`)
#[inline]
pub fn is_base32_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '2'..='7')
}

/// Compute the two checksum bytes for a public key and version
pub fn onion_checksum(pubkey: &[u8; 32], version: u8) -> [u8; 2] {
    let mut hasher = Sha3_256::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(pubkey);
    hasher.update([version]);

    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

/// Convert an Ed25519 public key to a v3 onion address (without ".onion")
pub fn encode(pubkey: &[u8; 32]) -> String {
    let mut raw = [0u8; RAW_LEN];
    raw[..32].copy_from_slice(pubkey);
    raw[32..34].copy_from_slice(&onion_checksum(pubkey, ONION_VERSION));
    raw[34] = ONION_VERSION;

    let address = base32::encode(ALPHABET, &raw);
    assert_eq!(address.len(), ADDRESS_LEN, "encoded onion address length");
    address
}

/// Convert an Ed25519 public key to its hostname, e.g. `xxxx...xxxx.onion`
pub fn pubkey_to_onion(pubkey: &[u8; 32]) -> String {
    format!("{}{}", encode(pubkey), ONION_SUFFIX)
}

/// Split an address into public key, checksum and version.
///
/// Accepts either case and an optional ".onion" suffix. The checksum and
/// version are returned as found; use [`parse`] to also validate them.
pub fn decode(address: &str) -> Result<DecodedAddress, AddressError> {
    let folded = address.to_ascii_lowercase();
    let lower = folded.strip_suffix(ONION_SUFFIX).unwrap_or(&folded);

    if let Some(c) = lower.chars().find(|c| !is_base32_char(*c)) {
        return Err(AddressError::InvalidCharacter(c));
    }
    if lower.len() != ADDRESS_LEN {
        return Err(AddressError::WrongLength(lower.len()));
    }

    let raw = base32::decode(ALPHABET, lower).ok_or(AddressError::Undecodable)?;
    if raw.len() != RAW_LEN {
        return Err(AddressError::Undecodable);
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&raw[..32]);
    Ok(DecodedAddress {
        public_key,
        checksum: [raw[32], raw[33]],
        version: raw[34],
    })
}

/// Decode an address and require version 3 with a matching checksum
pub fn parse(address: &str) -> Result<DecodedAddress, AddressError> {
    let decoded = decode(address)?;
    if decoded.version != ONION_VERSION {
        return Err(AddressError::UnsupportedVersion(decoded.version));
    }
    if !decoded.has_valid_checksum() {
        return Err(AddressError::BadChecksum);
    }
    Ok(decoded)
}
