//! Cryptographic operations for the ledger
//!
//! This module provides:
//! - Ed25519 key pairs for genesis tooling and clients
//! - Signature verification against an account key
//! - SHA-256 transaction ids and the Merkle app hash

use crate::types::{PubKey, Signature};
use crate::{Error, Result};
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};

/// Ed25519 key pair for signing
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Public key
    pub fn public_key(&self) -> PubKey {
        PubKey::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_bytes(self.signing_key.sign(message).to_bytes())
    }

    /// Verify a signature made by this key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        if verify_signature(&self.public_key(), message, signature) {
            Ok(())
        } else {
            Err(Error::InvalidSignature("verification failed".to_string()))
        }
    }
}

/// Verify a signature with a public key
pub fn verify_signature(public_key: &PubKey, message: &[u8], signature: &Signature) -> bool {
    signature.verify(message, public_key)
}

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Transaction id: SHA-256 of the sign-bytes
pub fn tx_id(sign_bytes: &[u8]) -> [u8; 32] {
    hash_bytes(sign_bytes)
}

/// Lowercase hex, for logs and query output
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Leaf hash of one store entry: `sha256(len(key) || key || value)`
///
/// The length prefix keeps `("ab", "c")` and `("a", "bc")` apart.
pub fn leaf_hash(key: &[u8], value: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((key.len() as u64).to_be_bytes());
    hasher.update(key);
    hasher.update(value);
    hasher.finalize().into()
}

/// Create a Merkle root from leaf hashes
///
/// If a level has odd length, its last hash is duplicated.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut current_level: Vec<[u8; 32]> = leaves.to_vec();

    while current_level.len() > 1 {
        current_level = current_level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut hasher = Sha256::new();
                hasher.update(left);
                hasher.update(right);
                let parent: [u8; 32] = hasher.finalize().into();
                parent
            })
            .collect();
    }

    current_level[0]
}
