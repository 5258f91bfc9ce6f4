//! Cryptographic functions for coldstash
//!
//! AES-256-GCM archive envelopes keyed either by a raw 256-bit key or by a
//! passphrase stretched with Argon2id.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{is_sealed, open, seal, ArchiveKey};
pub use key_derivation::{derive_key, KdfParams};
pub use secure_memory::{KeyBytes, SecureString};
