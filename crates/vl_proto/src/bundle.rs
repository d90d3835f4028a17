//! Published pre-key bundle carrier.
//!
//! The bundle contents belong to the key-exchange engine's own schema; this
//! crate only moves them around. `material` stays opaque base64 so the core
//! never depends on the engine's byte layout.

use serde::{Deserialize, Serialize};

/// One device's published bundle, fetched over pub-sub for an offline
/// handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreKeyBundle {
    /// Owner of the bundle.
    pub bare_jid: String,
    /// Publishing device (faux id as seen on the wire).
    pub device_id: u32,
    /// The device's real registration id, as asserted by the bundle.
    pub registration_id: u32,
    /// Engine-defined serialized bundle content, base64.
    pub material: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_serialization_with_material_untouched() {
        let bundle = PreKeyBundle {
            bare_jid: "bob@example.org".into(),
            device_id: 12,
            registration_id: 4242,
            material: "AAECAw==".into(),
        };

        let json = serde_json::to_string(&bundle).unwrap();
        let back: PreKeyBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bare_jid, "bob@example.org");
        assert_eq!(back.device_id, 12);
        assert_eq!(back.registration_id, 4242);
        assert_eq!(back.material, "AAECAw==");
    }
}
