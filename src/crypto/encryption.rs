//! AES-256-GCM archive envelope
//!
//! Layout of a sealed archive:
//!
//! ```text
//! magic "CSTASH01" | mode (1 byte) | kdf block (passphrase mode only) | nonce (12) | ciphertext+tag
//! kdf block = salt (16) | memory_cost u32 BE | time_cost u32 BE | parallelism u32 BE
//! ```
//!
//! Everything before the ciphertext is bound as associated data, so a
//! tampered header fails authentication just like a tampered body.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::key_derivation::{derive_key, KdfParams, SALT_SIZE};
use super::secure_memory::{KeyBytes, SecureString};
use crate::error::{StashError, StashResult};

/// Leading bytes of every sealed archive
pub const MAGIC: &[u8; 8] = b"CSTASH01";

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

const MODE_RAW: u8 = 0;
const MODE_PASSPHRASE: u8 = 1;

const KDF_BLOCK_SIZE: usize = SALT_SIZE + 12;

/// Symmetric key an archive is sealed with
#[derive(Debug, Clone)]
pub enum ArchiveKey {
    /// Passphrase, stretched with Argon2id per archive
    Passphrase(SecureString),
    /// Raw 256-bit key
    Raw(KeyBytes),
}

impl ArchiveKey {
    /// Wrap a passphrase; an empty passphrase is malformed
    pub fn passphrase(passphrase: impl Into<SecureString>) -> StashResult<Self> {
        let passphrase = passphrase.into();
        if passphrase.is_empty() {
            return Err(StashError::Encryption(
                "malformed key: passphrase is empty".into(),
            ));
        }
        Ok(Self::Passphrase(passphrase))
    }

    /// Parse a base64 raw key; it must decode to exactly 32 bytes
    pub fn from_base64(encoded: &str) -> StashResult<Self> {
        let mut decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| StashError::Encryption(format!("malformed key: {}", e)))?;

        if decoded.len() != 32 {
            let len = decoded.len();
            decoded.iter_mut().for_each(|b| *b = 0);
            return Err(StashError::Encryption(format!(
                "malformed key: expected 32 bytes, got {}",
                len
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded);
        decoded.iter_mut().for_each(|b| *b = 0);
        Ok(Self::Raw(KeyBytes::new(key)))
    }

    /// Generate a random raw key
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::Raw(KeyBytes::new(key))
    }

    /// Base64 form of a raw key
    pub fn to_base64(&self) -> Option<String> {
        match self {
            Self::Raw(bytes) => Some(STANDARD.encode(bytes.as_bytes())),
            Self::Passphrase(_) => None,
        }
    }
}

/// Check whether bytes start with the envelope magic
pub fn is_sealed(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

/// Seal plaintext with fresh key-derivation parameters
pub fn seal(plaintext: &[u8], key: &ArchiveKey) -> StashResult<Vec<u8>> {
    seal_with_kdf(plaintext, key, KdfParams::generate())
}

/// Seal plaintext, using `kdf` when the key is a passphrase
pub fn seal_with_kdf(plaintext: &[u8], key: &ArchiveKey, kdf: KdfParams) -> StashResult<Vec<u8>> {
    let mut header = Vec::with_capacity(MAGIC.len() + 1 + KDF_BLOCK_SIZE + NONCE_SIZE);
    header.extend_from_slice(MAGIC);

    let derived = match key {
        ArchiveKey::Raw(bytes) => {
            header.push(MODE_RAW);
            bytes.clone()
        }
        ArchiveKey::Passphrase(passphrase) => {
            header.push(MODE_PASSPHRASE);
            header.extend_from_slice(&kdf.salt);
            header.extend_from_slice(&kdf.memory_cost.to_be_bytes());
            header.extend_from_slice(&kdf.time_cost.to_be_bytes());
            header.extend_from_slice(&kdf.parallelism.to_be_bytes());
            derive_key(passphrase, &kdf)?
        }
    };

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    header.extend_from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(derived.as_bytes())
        .map_err(|e| StashError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|e| StashError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut sealed = header;
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a sealed archive
pub fn open(sealed: &[u8], key: &ArchiveKey) -> StashResult<Vec<u8>> {
    if !is_sealed(sealed) {
        return Err(StashError::Encryption("not an encrypted archive".into()));
    }

    let mut offset = MAGIC.len();
    let mode = *sealed
        .get(offset)
        .ok_or_else(|| StashError::Corrupted("truncated encryption header".into()))?;
    offset += 1;

    let derived = match (mode, key) {
        (MODE_RAW, ArchiveKey::Raw(bytes)) => bytes.clone(),
        (MODE_PASSPHRASE, ArchiveKey::Passphrase(passphrase)) => {
            let block = sealed
                .get(offset..offset + KDF_BLOCK_SIZE)
                .ok_or_else(|| StashError::Corrupted("truncated encryption header".into()))?;
            offset += KDF_BLOCK_SIZE;
            derive_key(passphrase, &parse_kdf_block(block)?)?
        }
        (MODE_RAW, ArchiveKey::Passphrase(_)) => {
            return Err(StashError::Encryption(
                "archive was sealed with a raw key, not a passphrase".into(),
            ))
        }
        (MODE_PASSPHRASE, ArchiveKey::Raw(_)) => {
            return Err(StashError::Encryption(
                "archive was sealed with a passphrase, not a raw key".into(),
            ))
        }
        (other, _) => {
            return Err(StashError::Encryption(format!(
                "Unsupported key mode: {}",
                other
            )))
        }
    };

    let nonce_end = offset + NONCE_SIZE;
    if sealed.len() < nonce_end {
        return Err(StashError::Corrupted("truncated encryption header".into()));
    }
    let (header, ciphertext) = sealed.split_at(nonce_end);
    let nonce = Nonce::from_slice(&header[offset..]);

    let cipher = Aes256Gcm::new_from_slice(derived.as_bytes())
        .map_err(|e| StashError::Encryption(format!("Failed to create cipher: {}", e)))?;

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| StashError::Authentication("wrong key or corrupted archive".into()))
}

fn parse_kdf_block(block: &[u8]) -> StashResult<KdfParams> {
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&block[..SALT_SIZE]);
    let word = |at: usize| {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&block[at..at + 4]);
        u32::from_be_bytes(buf)
    };
    let params = KdfParams {
        salt,
        memory_cost: word(SALT_SIZE),
        time_cost: word(SALT_SIZE + 4),
        parallelism: word(SALT_SIZE + 8),
    };
    if !params.within_limits() {
        return Err(StashError::Corrupted(format!(
            "key derivation costs out of range (m={}, t={}, p={})",
            params.memory_cost, params.time_cost, params.parallelism
        )));
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_raw_key() {
        let key = ArchiveKey::generate();
        let sealed = seal(b"Hello, World!", &key).unwrap();

        assert!(is_sealed(&sealed));
        assert_eq!(open(&sealed, &key).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_seal_open_passphrase() {
        let key = ArchiveKey::passphrase("correct horse").unwrap();
        let sealed = seal_with_kdf(b"payload", &key, KdfParams::insecure_for_tests()).unwrap();

        let reopened = ArchiveKey::passphrase("correct horse").unwrap();
        assert_eq!(open(&sealed, &reopened).unwrap(), b"payload");
    }

    #[test]
    fn test_wrong_passphrase_fails_authentication() {
        let key = ArchiveKey::passphrase("right").unwrap();
        let sealed = seal_with_kdf(b"payload", &key, KdfParams::insecure_for_tests()).unwrap();

        let wrong = ArchiveKey::passphrase("wrong").unwrap();
        assert!(open(&sealed, &wrong).unwrap_err().is_authentication());
    }

    #[test]
    fn test_different_nonces() {
        let key = ArchiveKey::generate();
        let a = seal(b"same", &key).unwrap();
        let b = seal(b"same", &key).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_header_fails() {
        let key = ArchiveKey::generate();
        let mut sealed = seal(b"payload", &key).unwrap();
        // flip a nonce bit
        sealed[MAGIC.len() + 2] ^= 0x01;
        assert!(open(&sealed, &key).is_err());
    }

    #[test]
    fn test_oversized_kdf_costs_are_corrupted() {
        let key = ArchiveKey::passphrase("right").unwrap();
        let mut sealed =
            seal_with_kdf(b"payload", &key, KdfParams::insecure_for_tests()).unwrap();
        let memory_at = MAGIC.len() + 1 + SALT_SIZE;
        sealed[memory_at..memory_at + 4].copy_from_slice(&u32::MAX.to_be_bytes());

        assert!(matches!(
            open(&sealed, &key),
            Err(StashError::Corrupted(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = ArchiveKey::generate();
        let mut sealed = seal(b"payload", &key).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(open(&sealed, &key).unwrap_err().is_authentication());
    }

    #[test]
    fn test_key_mode_mismatch() {
        let raw = ArchiveKey::generate();
        let sealed = seal(b"payload", &raw).unwrap();
        let passphrase = ArchiveKey::passphrase("pw").unwrap();
        assert!(matches!(
            open(&sealed, &passphrase),
            Err(StashError::Encryption(_))
        ));
    }

    #[test]
    fn test_malformed_raw_key() {
        assert!(ArchiveKey::from_base64("not base64!!").is_err());
        let short = STANDARD.encode([1u8; 16]);
        let err = ArchiveKey::from_base64(&short).unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn test_raw_key_base64_roundtrip() {
        let key = ArchiveKey::generate();
        let encoded = key.to_base64().unwrap();
        let parsed = ArchiveKey::from_base64(&encoded).unwrap();
        let sealed = seal(b"x", &key).unwrap();
        assert_eq!(open(&sealed, &parsed).unwrap(), b"x");
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(ArchiveKey::passphrase("").is_err());
    }
}
