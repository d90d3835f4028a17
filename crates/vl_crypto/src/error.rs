use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("random byte generation failed")]
    Randomness,

    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid nonce/IV length: expected {expected}, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error("unsupported tag length: {0}")]
    UnsupportedTagLength(usize),
}
