//! Per-message symmetric key material.
//!
//! The wire protocol transports the message key and the GCM tag as one
//! contiguous 32-byte blob, but the two are distinct values: the first 16
//! bytes are key material, the trailing 16 are the authentication tag set
//! after encryption. Keeping them as named fields prevents the tag bytes
//! from ever being mistaken for key material.

use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::provider::{KEY_LEN, TAG_LEN};

/// A message key plus its (initially unset) authentication tag.
#[derive(ZeroizeOnDrop)]
pub struct MessageKey {
    key: [u8; KEY_LEN],
    tag: [u8; TAG_LEN],
    #[zeroize(skip)]
    tag_set: bool,
}

impl MessageKey {
    /// Build from `KEY_LEN + TAG_LEN` freshly drawn random bytes.
    ///
    /// The trailing bytes are random filler until [`set_tag`](Self::set_tag)
    /// overwrites them; they must never be used as key material.
    pub fn from_random(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN + TAG_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} random bytes, got {}",
                KEY_LEN + TAG_LEN,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        let mut tag = [0u8; TAG_LEN];
        key.copy_from_slice(&bytes[..KEY_LEN]);
        tag.copy_from_slice(&bytes[KEY_LEN..]);
        Ok(Self {
            key,
            tag,
            tag_set: false,
        })
    }

    /// The 16 bytes of actual key material.
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Whether the tag slot holds a real authentication tag yet.
    pub fn tag_set(&self) -> bool {
        self.tag_set
    }

    /// Store the authentication tag produced by encryption.
    pub fn set_tag(&mut self, tag: &[u8]) -> Result<(), CryptoError> {
        if tag.len() != TAG_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {TAG_LEN}-byte tag, got {}",
                tag.len()
            )));
        }
        self.tag.copy_from_slice(tag);
        self.tag_set = true;
        Ok(())
    }

    /// Total length of the contiguous wire representation.
    pub fn len(&self) -> usize {
        KEY_LEN + TAG_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The contiguous `key || tag` blob handed to the key-wrapping step.
    /// Zeroized when the returned buffer drops.
    pub fn to_contiguous(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Vec::with_capacity(KEY_LEN + TAG_LEN);
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.tag);
        Zeroizing::new(out)
    }
}

impl std::fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key bytes.
        f.debug_struct("MessageKey")
            .field("tag_set", &self.tag_set)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        assert!(MessageKey::from_random(&[0u8; KEY_LEN]).is_err());
    }

    #[test]
    fn tag_starts_unset_and_sticks_once_written() {
        let mut mk = MessageKey::from_random(&[7u8; KEY_LEN + TAG_LEN]).unwrap();
        assert!(!mk.tag_set());

        mk.set_tag(&[9u8; TAG_LEN]).unwrap();
        assert!(mk.tag_set());

        let blob = mk.to_contiguous();
        assert_eq!(blob.len(), KEY_LEN + TAG_LEN);
        assert_eq!(&blob[..KEY_LEN], &[7u8; KEY_LEN]);
        assert_eq!(&blob[KEY_LEN..], &[9u8; TAG_LEN]);
    }

    #[test]
    fn rejects_wrong_tag_length() {
        let mut mk = MessageKey::from_random(&[0u8; KEY_LEN + TAG_LEN]).unwrap();
        assert!(mk.set_tag(&[0u8; 8]).is_err());
        assert!(!mk.tag_set());
    }
}
