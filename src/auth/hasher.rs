// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential hashing.
//!
//! Passwords are reduced to a deterministic HMAC-SHA256 digest keyed with the
//! server-wide salt. Determinism lets sign-in re-derive the digest and look the
//! user up by login and digest together. There is no per-user salt, so equal
//! passwords produce equal digests.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hashing key: {0}")]
    InvalidKey(#[from] hmac::digest::InvalidLength),
}

/// One-way transform from a plaintext password to the stored digest.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;
}

/// HMAC-SHA256 keyed with a server-wide salt, hex-encoded.
#[derive(Clone)]
pub struct SaltedHasher {
    salt: Vec<u8>,
}

impl SaltedHasher {
    pub fn new(salt: impl AsRef<[u8]>) -> Self {
        Self {
            salt: salt.as_ref().to_vec(),
        }
    }
}

impl std::fmt::Debug for SaltedHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltedHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher for SaltedHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let mut mac = HmacSha256::new_from_slice(&self.salt)?;
        mac.update(password.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
