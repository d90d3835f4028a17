//! Production crypto provider: AES-128-GCM with a detached tag.
//!
//! Key size: 16 bytes.  IV: 12 bytes (random, supplied by caller).
//! Tag: 16 bytes, returned separately from the ciphertext.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes128Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::error::CryptoError;
use crate::provider::{AeadOutput, CryptoProvider, IV_LEN, KEY_LEN, TAG_LEN};

/// Stateless provider over the OS RNG and the `aes-gcm` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmProvider;

impl AesGcmProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for AesGcmProvider {
    fn random_bytes(&self, n: usize) -> Result<Vec<u8>, CryptoError> {
        let mut buf = vec![0u8; n];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|_| CryptoError::Randomness)?;
        Ok(buf)
    }

    fn aead_encrypt(
        &self,
        plaintext: &[u8],
        iv: &[u8],
        key: &[u8],
        tag_len: usize,
    ) -> Result<AeadOutput, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {KEY_LEN}-byte AES-128 key, got {}",
                key.len()
            )));
        }
        if iv.len() != IV_LEN {
            return Err(CryptoError::InvalidIvLength {
                expected: IV_LEN,
                got: iv.len(),
            });
        }
        // GCM tags are always 128-bit here; shorter truncated tags are not
        // accepted by the protocol.
        if tag_len != TAG_LEN {
            return Err(CryptoError::UnsupportedTagLength(tag_len));
        }

        let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadEncrypt)?;
        let nonce = Nonce::from_slice(iv);

        let mut buf = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(nonce, b"", &mut buf)
            .map_err(|_| CryptoError::AeadEncrypt)?;

        Ok(AeadOutput {
            ciphertext: buf,
            tag: tag.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_have_requested_length() {
        let provider = AesGcmProvider::new();
        let a = provider.random_bytes(IV_LEN).unwrap();
        let b = provider.random_bytes(IV_LEN).unwrap();
        assert_eq!(a.len(), IV_LEN);
        assert_ne!(a, b, "two draws must not collide");
    }

    #[test]
    fn encrypt_keeps_tag_detached() {
        let provider = AesGcmProvider::new();
        let key = provider.random_bytes(KEY_LEN).unwrap();
        let iv = provider.random_bytes(IV_LEN).unwrap();

        let out = provider
            .aead_encrypt(b"attack at dawn", &iv, &key, TAG_LEN)
            .unwrap();
        assert_eq!(out.ciphertext.len(), b"attack at dawn".len());
        assert_eq!(out.tag.len(), TAG_LEN);
    }

    #[test]
    fn rejects_wrong_key_length() {
        let provider = AesGcmProvider::new();
        let iv = [0u8; IV_LEN];
        let err = provider.aead_encrypt(b"x", &iv, &[0u8; 32], TAG_LEN);
        assert!(matches!(err, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn rejects_truncated_tag_request() {
        let provider = AesGcmProvider::new();
        let err = provider.aead_encrypt(b"x", &[0u8; IV_LEN], &[0u8; KEY_LEN], 8);
        assert!(matches!(err, Err(CryptoError::UnsupportedTagLength(8))));
    }
}
