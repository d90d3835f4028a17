//! vl_crypto — Veil messaging extension cryptographic capability boundary
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - The rest of the workspace talks to crypto through the [`CryptoProvider`]
//!   trait only, so test doubles can stand in for the real cipher.
//!
//! # Module layout
//! - `provider` — the injectable crypto capability (randomness + AEAD encrypt)
//! - `aead`     — production provider over AES-128-GCM with detached tags
//! - `key`      — structured per-message key + tag buffer
//! - `error`    — unified error type

pub mod aead;
pub mod error;
pub mod key;
pub mod provider;

pub use aead::AesGcmProvider;
pub use error::CryptoError;
pub use key::MessageKey;
pub use provider::{AeadOutput, CryptoProvider, IV_LEN, KEY_LEN, TAG_LEN};
