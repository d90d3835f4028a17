//! Staged construction of an outgoing encrypted message envelope.
//!
//! An [`OmemoMessage`] walks through a fixed stage sequence:
//!
//! 1. [`OmemoMessage::new_bare`] — allocate the header subtree
//! 2. [`OmemoMessage::init_key`] — draw IV + message key from the provider
//! 3. [`OmemoMessage::set_sender_device_id`]
//! 4. [`OmemoMessage::set_plain_text_body`] — parse the plaintext XML body
//! 5. [`OmemoMessage::pre_encrypt`] — AEAD-encrypt the body text, replace it
//!    with a base64 `<payload>` node
//!
//! Every stage checks its preconditions and either completes fully or leaves
//! the message exactly as it was. The symmetric key + tag buffer never leaves
//! this crate except through [`OmemoMessage::key_with_tag`], which feeds the
//! per-recipient key-wrapping step; it is never placed on the wire.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;
use zeroize::Zeroizing;

use vl_crypto::{CryptoProvider, MessageKey, IV_LEN, KEY_LEN, TAG_LEN};

use crate::error::ProtoError;
use crate::xml::Element;

const HEADER_NODE: &str = "header";
const IV_NODE: &str = "iv";
const PAYLOAD_NODE: &str = "payload";
const BODY_NODE: &str = "body";
const SID_ATTR: &str = "sid";

/// An outgoing envelope under construction. Single-owner, consumed by the
/// caller once the payload is in place.
pub struct OmemoMessage {
    header: Element,
    iv: Option<Vec<u8>>,
    key: Option<MessageKey>,
    /// Parsed plaintext body tree; replaced by `payload` at pre-encryption.
    body: Option<Element>,
    payload: Option<Element>,
}

impl OmemoMessage {
    /// Stage 1: a bare message with an empty `<header>` and nothing else.
    pub fn new_bare() -> Self {
        Self {
            header: Element::new(HEADER_NODE),
            iv: None,
            key: None,
            body: None,
            payload: None,
        }
    }

    /// Stage 2: draw a fresh IV and message key from the provider.
    ///
    /// The IV lands in the header as a base64 `<iv>` node; the key buffer is
    /// `KEY_LEN + TAG_LEN` bytes with the trailing bytes reserved for the
    /// authentication tag written by [`pre_encrypt`](Self::pre_encrypt).
    pub fn init_key(&mut self, provider: &dyn CryptoProvider) -> Result<(), ProtoError> {
        let iv = provider.random_bytes(IV_LEN)?;
        let key_bytes = Zeroizing::new(provider.random_bytes(KEY_LEN + TAG_LEN)?);
        let key = MessageKey::from_random(&key_bytes)?;

        let mut iv_node = Element::new(IV_NODE);
        iv_node.push_text(BASE64.encode(&iv));
        self.header.remove_child(IV_NODE);
        self.header.push_element(iv_node);
        self.iv = Some(iv);
        self.key = Some(key);
        Ok(())
    }

    /// Stage 3: record the sending device id as a header attribute.
    pub fn set_sender_device_id(&mut self, device_id: u32) {
        self.header.set_attr(SID_ATTR, device_id.to_string());
    }

    /// Stage 4: parse the plaintext XML body into the message.
    pub fn set_plain_text_body(&mut self, xml_body: &str) -> Result<(), ProtoError> {
        self.body = Some(Element::parse(xml_body)?);
        Ok(())
    }

    /// Stage 5: encrypt the body text and swap it for a `<payload>` node.
    ///
    /// Requires stages 2 and 4 to have completed; fails without touching the
    /// message otherwise. May be invoked at most once.
    pub fn pre_encrypt(&mut self, provider: &dyn CryptoProvider) -> Result<(), ProtoError> {
        if self.payload.is_some() || self.key.as_ref().is_some_and(|k| k.tag_set()) {
            return Err(ProtoError::AlreadyEncrypted);
        }

        let (ciphertext, tag) = {
            let iv = self.iv.as_deref().ok_or(ProtoError::MissingState("iv"))?;
            let key = self.key.as_ref().ok_or(ProtoError::MissingState("key"))?;
            let body_tree = self
                .body
                .as_ref()
                .ok_or(ProtoError::MissingState("plaintext body"))?;

            let body = body_tree.find(BODY_NODE).ok_or(ProtoError::MissingBody)?;
            let text = body.text().ok_or(ProtoError::MissingBody)?;

            let out = provider.aead_encrypt(text.as_bytes(), iv, key.key(), TAG_LEN)?;
            (out.ciphertext, out.tag)
        };

        // Point of no return: everything below is infallible apart from a
        // provider returning a wrong-sized tag, which is caught before any
        // other mutation.
        if let Some(key) = self.key.as_mut() {
            key.set_tag(&tag)?;
        }

        match self.body.as_mut() {
            Some(tree) if tree.name() == BODY_NODE => {
                self.body = None;
            }
            Some(tree) => {
                tree.take_descendant(BODY_NODE);
            }
            None => {}
        }

        let mut payload = Element::new(PAYLOAD_NODE);
        payload.push_text(BASE64.encode(&ciphertext));
        debug!(ciphertext_len = ciphertext.len(), "message payload encrypted");
        self.payload = Some(payload);
        Ok(())
    }

    /// Cheap readiness probe: true iff the key buffer and IV are in place and
    /// the header carries a non-empty IV node. Never fails, even on a bare
    /// message.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
            && self.iv.is_some()
            && self
                .header
                .child(IV_NODE)
                .and_then(|n| n.text())
                .is_some_and(|t| !t.is_empty())
    }

    pub fn header(&self) -> &Element {
        &self.header
    }

    /// The encrypted `<payload>` node, once stage 5 has run.
    pub fn payload(&self) -> Option<&Element> {
        self.payload.as_ref()
    }

    /// The contiguous `key || tag` blob for the per-recipient key-wrapping
    /// step. Zeroized when the returned buffer drops; never emitted on the
    /// wire by this crate.
    pub fn key_with_tag(&self) -> Option<Zeroizing<Vec<u8>>> {
        self.key.as_ref().map(|k| k.to_contiguous())
    }
}

impl Default for OmemoMessage {
    fn default() -> Self {
        Self::new_bare()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vl_crypto::AesGcmProvider;
    use vl_crypto::{AeadOutput, CryptoError};

    /// Provider whose randomness always fails.
    struct NoEntropy;

    impl CryptoProvider for NoEntropy {
        fn random_bytes(&self, _n: usize) -> Result<Vec<u8>, CryptoError> {
            Err(CryptoError::Randomness)
        }

        fn aead_encrypt(
            &self,
            _plaintext: &[u8],
            _iv: &[u8],
            _key: &[u8],
            _tag_len: usize,
        ) -> Result<AeadOutput, CryptoError> {
            Err(CryptoError::AeadEncrypt)
        }
    }

    #[test]
    fn full_pipeline_produces_ready_envelope() {
        let provider = AesGcmProvider::new();
        let mut msg = OmemoMessage::new_bare();
        msg.init_key(&provider).unwrap();
        msg.set_sender_device_id(42);
        msg.set_plain_text_body("<body>hi</body>").unwrap();
        msg.pre_encrypt(&provider).unwrap();

        assert!(msg.has_key());
        assert_eq!(msg.header().attr("sid"), Some("42"));

        let iv_b64 = msg.header().child("iv").and_then(|n| n.text()).unwrap();
        assert!(!iv_b64.is_empty());
        assert_eq!(BASE64.decode(&iv_b64).unwrap().len(), IV_LEN);

        let payload_b64 = msg.payload().and_then(|p| p.text()).unwrap();
        let ciphertext = BASE64.decode(&payload_b64).unwrap();
        assert_eq!(ciphertext.len(), "hi".len());

        assert_eq!(msg.key_with_tag().unwrap().len(), KEY_LEN + TAG_LEN);
    }

    #[test]
    fn bare_message_reports_no_key() {
        let msg = OmemoMessage::new_bare();
        assert!(!msg.has_key());
        assert!(msg.key_with_tag().is_none());
    }

    #[test]
    fn init_key_failure_leaves_message_bare() {
        let mut msg = OmemoMessage::new_bare();
        assert!(matches!(
            msg.init_key(&NoEntropy),
            Err(ProtoError::Crypto(CryptoError::Randomness))
        ));
        assert!(!msg.has_key());
        assert!(msg.header().child("iv").is_none());
    }

    #[test]
    fn pre_encrypt_without_key_is_rejected() {
        let provider = AesGcmProvider::new();
        let mut msg = OmemoMessage::new_bare();
        msg.set_plain_text_body("<body>hi</body>").unwrap();
        assert!(matches!(
            msg.pre_encrypt(&provider),
            Err(ProtoError::MissingState("iv"))
        ));
    }

    #[test]
    fn pre_encrypt_without_body_is_rejected() {
        let provider = AesGcmProvider::new();
        let mut msg = OmemoMessage::new_bare();
        msg.init_key(&provider).unwrap();
        assert!(matches!(
            msg.pre_encrypt(&provider),
            Err(ProtoError::MissingState("plaintext body"))
        ));
    }

    #[test]
    fn body_without_text_is_malformed() {
        let provider = AesGcmProvider::new();
        let mut msg = OmemoMessage::new_bare();
        msg.init_key(&provider).unwrap();
        msg.set_plain_text_body("<message><body/></message>").unwrap();
        assert!(matches!(
            msg.pre_encrypt(&provider),
            Err(ProtoError::MissingBody)
        ));
        // Failure must not consume the body tree.
        assert!(msg.payload().is_none());
    }

    #[test]
    fn malformed_body_xml_is_rejected() {
        let mut msg = OmemoMessage::new_bare();
        assert!(matches!(
            msg.set_plain_text_body("<body>broken"),
            Err(ProtoError::MalformedXml(_))
        ));
    }

    #[test]
    fn pre_encrypt_twice_is_rejected() {
        let provider = AesGcmProvider::new();
        let mut msg = OmemoMessage::new_bare();
        msg.init_key(&provider).unwrap();
        msg.set_sender_device_id(1);
        msg.set_plain_text_body("<body>once</body>").unwrap();
        msg.pre_encrypt(&provider).unwrap();
        assert!(matches!(
            msg.pre_encrypt(&provider),
            Err(ProtoError::AlreadyEncrypted)
        ));
    }

    #[test]
    fn body_nested_in_message_stanza_is_found_and_removed() {
        let provider = AesGcmProvider::new();
        let mut msg = OmemoMessage::new_bare();
        msg.init_key(&provider).unwrap();
        msg.set_plain_text_body("<message to='bob@example.org'><body>nested</body></message>")
            .unwrap();
        msg.pre_encrypt(&provider).unwrap();
        assert!(msg.payload().is_some());
    }
}
