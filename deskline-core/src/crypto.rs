//! Message-content encryption.
//!
//! AES-256-GCM with the key derived from a configured secret via SHA-256.
//! The wire form is base64(nonce || ciphertext); the nonce is random per
//! message.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_SIZE: usize = 12;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptFailed,

    #[error("Decryption failed: {reason}")]
    DecryptFailed { reason: String },
}

/// Symmetric encryptor for stored message content.
#[derive(Clone)]
pub struct MessageEncryptor {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for MessageEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageEncryptor").finish_non_exhaustive()
    }
}

impl MessageEncryptor {
    /// Derive a 32-byte AES key from an arbitrary-length secret.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        MessageEncryptor {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt `plaintext` into base64(nonce || ciphertext).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptFailed)?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let combined = BASE64.decode(encoded).map_err(|e| CryptoError::DecryptFailed {
            reason: format!("invalid base64: {e}"),
        })?;
        if combined.len() <= NONCE_SIZE {
            return Err(CryptoError::DecryptFailed {
                reason: "payload shorter than nonce".to_string(),
            });
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptFailed {
                reason: "authentication failed".to_string(),
            })?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptFailed {
            reason: "plaintext is not utf-8".to_string(),
        })
    }

    /// Heuristic for values already in the encrypted wire form: valid base64
    /// decoding to at least nonce + one ciphertext byte + 16-byte tag.
    pub fn is_encrypted(value: &str) -> bool {
        if value.len() < 24 || value.contains(char::is_whitespace) {
            return false;
        }
        match BASE64.decode(value) {
            Ok(bytes) => bytes.len() > NONCE_SIZE + 16,
            Err(_) => false,
        }
    }

    /// Encrypt unless the value already looks encrypted.
    pub fn encrypt_if_needed(&self, value: &str) -> Result<String, CryptoError> {
        if Self::is_encrypted(value) {
            Ok(value.to_string())
        } else {
            self.encrypt(value)
        }
    }

    /// Decrypt when the value looks encrypted; pass plaintext through.
    /// Values that look encrypted but fail authentication are returned
    /// unchanged rather than erroring, so legacy plaintext rows stay
    /// readable.
    pub fn decrypt_if_needed(&self, value: &str) -> String {
        if Self::is_encrypted(value) {
            self.decrypt(value).unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let encryptor = MessageEncryptor::new("test-secret");
        let plaintext = "where is my order?";
        let encrypted = encryptor.encrypt(plaintext).unwrap();
        assert_ne!(encrypted, plaintext);
        assert_eq!(encryptor.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn test_nonce_varies_per_message() {
        let encryptor = MessageEncryptor::new("test-secret");
        let a = encryptor.encrypt("same text").unwrap();
        let b = encryptor.encrypt("same text").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let encrypted = MessageEncryptor::new("key-a").encrypt("secret").unwrap();
        let err = MessageEncryptor::new("key-b").decrypt(&encrypted).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptFailed { .. }));
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        let encryptor = MessageEncryptor::new("test-secret");
        assert!(encryptor.decrypt("not base64!!!").is_err());
        assert!(encryptor.decrypt("c2hvcnQ=").is_err());
    }

    #[test]
    fn test_encrypt_if_needed_is_idempotent() {
        let encryptor = MessageEncryptor::new("test-secret");
        let once = encryptor.encrypt_if_needed("hello there, support").unwrap();
        let twice = encryptor.encrypt_if_needed(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(encryptor.decrypt_if_needed(&twice), "hello there, support");
    }

    #[test]
    fn test_decrypt_if_needed_passes_plaintext_through() {
        let encryptor = MessageEncryptor::new("test-secret");
        assert_eq!(encryptor.decrypt_if_needed("plain words"), "plain words");
    }

    #[test]
    fn test_unicode_round_trip() {
        let encryptor = MessageEncryptor::new("test-secret");
        let plaintext = "退款 réclamation ♥";
        let encrypted = encryptor.encrypt(plaintext).unwrap();
        assert_eq!(encryptor.decrypt(&encrypted).unwrap(), plaintext);
    }
}
