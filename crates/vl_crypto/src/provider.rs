//! The injectable crypto capability.
//!
//! A `CryptoProvider` is bound to a crypto context once, at construction
//! time, and never swapped afterwards. The message pipeline and the account
//! registry only ever see this trait, never a concrete cipher.

use crate::error::CryptoError;

/// AES-128 key length in bytes. Protocol constant, not configurable.
pub const KEY_LEN: usize = 16;
/// GCM IV length in bytes (96-bit, per the AEAD scheme's convention).
pub const IV_LEN: usize = 12;
/// GCM authentication tag length in bytes (128-bit).
pub const TAG_LEN: usize = 16;

/// Output of a detached-tag AEAD encryption.
///
/// Ciphertext and tag stay separate so the tag can be appended to the
/// per-message key buffer instead of the payload.
pub struct AeadOutput {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Capability interface for randomness and AEAD encryption.
pub trait CryptoProvider {
    /// Produce `n` cryptographically secure random bytes.
    fn random_bytes(&self, n: usize) -> Result<Vec<u8>, CryptoError>;

    /// AEAD-encrypt `plaintext` under `key`/`iv`, producing a detached tag
    /// of `tag_len` bytes.
    fn aead_encrypt(
        &self,
        plaintext: &[u8],
        iv: &[u8],
        key: &[u8],
        tag_len: usize,
    ) -> Result<AeadOutput, CryptoError>;
}
