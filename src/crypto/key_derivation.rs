//! Key derivation using Argon2id
//!
//! Passphrase-protected archives carry their own salt and cost parameters
//! in the envelope header, so every archive can be opened with nothing but
//! the passphrase.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use argon2::{Algorithm, Argon2, Params, Version};

use super::secure_memory::KeyBytes;
use crate::error::{StashError, StashResult};

/// Salt length in bytes
pub const SALT_SIZE: usize = 16;

/// Argon2id cost parameters plus the salt they were used with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    pub salt: [u8; SALT_SIZE],
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Iterations (default: 3)
    pub time_cost: u32,
    /// Lanes (default: 4)
    pub parallelism: u32,
}

/// Largest costs accepted from an archive header
pub const MAX_MEMORY_COST: u32 = 1024 * 1024;
pub const MAX_TIME_COST: u32 = 16;
pub const MAX_PARALLELISM: u32 = 16;

impl KdfParams {
    /// Default costs with a fresh random salt
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        Self {
            salt,
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Whether every cost is within the accepted maximums
    pub fn within_limits(&self) -> bool {
        self.memory_cost <= MAX_MEMORY_COST
            && self.time_cost <= MAX_TIME_COST
            && self.parallelism <= MAX_PARALLELISM
    }

    /// Cheap parameters, for tests only
    #[cfg(test)]
    pub fn insecure_for_tests() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            ..Self::generate()
        }
    }
}

/// Derive a 256-bit key from a passphrase
pub fn derive_key(passphrase: &str, params: &KdfParams) -> StashResult<KeyBytes> {
    if passphrase.is_empty() {
        return Err(StashError::Encryption(
            "malformed key: passphrase is empty".to_string(),
        ));
    }

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| StashError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(passphrase.as_bytes(), &params.salt, &mut key)
        .map_err(|e| StashError::Encryption(format!("Key derivation failed: {}", e)))?;

    let derived = KeyBytes::new(key);
    key.iter_mut().for_each(|b| *b = 0);
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_passphrase_same_key() {
        let params = KdfParams::insecure_for_tests();
        let key1 = derive_key("correct horse", &params).unwrap();
        let key2 = derive_key("correct horse", &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let params1 = KdfParams::insecure_for_tests();
        let params2 = KdfParams::insecure_for_tests();
        let key1 = derive_key("same", &params1).unwrap();
        let key2 = derive_key("same", &params2).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_empty_passphrase_is_malformed() {
        let params = KdfParams::insecure_for_tests();
        let err = derive_key("", &params).unwrap_err();
        assert!(err.to_string().contains("malformed key"));
    }

    #[test]
    fn test_invalid_costs_rejected() {
        let params = KdfParams {
            memory_cost: 1,
            ..KdfParams::insecure_for_tests()
        };
        assert!(derive_key("pass", &params).is_err());
    }
}
