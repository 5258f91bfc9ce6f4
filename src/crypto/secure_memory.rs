//! Secure memory handling for passphrases and key bytes
//!
//! Both wrappers wipe their contents on drop and never print them.

use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that is zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

/// A fixed 256-bit key that is zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyBytes {
    inner: [u8; 32],
}

impl KeyBytes {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { inner: bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.inner
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyBytes([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_deref() {
        let s = SecureString::new("hunter22");
        assert_eq!(s.len(), 8);
        assert_eq!(s.as_str(), "hunter22");
    }

    #[test]
    fn test_secure_string_is_redacted() {
        let s = SecureString::new("secret");
        assert!(!format!("{:?}", s).contains("secret"));
        assert!(format!("{}", s).contains("REDACTED"));
    }

    #[test]
    fn test_explicit_zeroize_clears_contents() {
        let mut s = SecureString::new("secret");
        s.zeroize();
        assert!(s.is_empty());
    }

    #[test]
    fn test_key_bytes_debug_is_redacted() {
        let key = KeyBytes::new([7u8; 32]);
        assert_eq!(key.as_bytes()[0], 7);
        assert!(!format!("{:?}", key).contains('7'));
    }
}
