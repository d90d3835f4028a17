//! Peer device addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies exactly one remote device instance: a bare JID plus the
/// device id it negotiates under. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddress {
    bare_jid: String,
    device_id: u32,
}

impl PeerAddress {
    pub fn new(bare_jid: impl Into<String>, device_id: u32) -> Self {
        Self {
            bare_jid: bare_jid.into(),
            device_id,
        }
    }

    pub fn bare_jid(&self) -> &str {
        &self.bare_jid
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bare_jid, self.device_id)
    }
}

/// Strip the resource qualifier from a JID: `alice@example.org/mobile`
/// becomes `alice@example.org`.
pub fn strip_resource(jid: &str) -> &str {
    jid.split('/').next().unwrap_or(jid)
}
