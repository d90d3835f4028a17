//! External key-exchange engine boundary.
//!
//! The asymmetric handshake math (bundle exchange, ratcheting, the DAKE
//! message schema) belongs to a signal-protocol-style library outside this
//! workspace. The ledger only needs four operations from it, and the wire
//! bytes stay opaque: the sole contract is "decode succeeds or fails".

use vl_proto::PreKeyBundle;

use crate::address::PeerAddress;
use crate::error::SessionError;

/// What one handshake step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DakeStep {
    /// A next-step message to hand to the transport.
    Reply(Vec<u8>),
    /// The final authenticated confirmation; the session is now usable.
    Established { real_registration_id: u32 },
}

/// One engine instance is bound per crypto context at construction time.
pub trait DakeEngine {
    /// Begin an interactive handshake towards `address`; returns the
    /// initiation message to transmit.
    fn start_handshake(&self, address: &PeerAddress) -> Result<Vec<u8>, SessionError>;

    /// Feed one opaque length-delimited handshake blob to the engine.
    /// Fails with [`SessionError::MalformedHandshake`] if the bytes do not
    /// decode into a valid handshake-step structure.
    fn handshake_step(
        &self,
        address: &PeerAddress,
        message: &[u8],
    ) -> Result<DakeStep, SessionError>;

    /// Offline variant: derive a session from a published bundle.
    /// Returns the peer's real registration id on success.
    fn create_session_from_bundle(
        &self,
        address: &PeerAddress,
        bundle: &PreKeyBundle,
    ) -> Result<u32, SessionError>;

    /// Whether an initiated session already exists for `address` in the
    /// engine's own store.
    fn session_exists(&self, address: &PeerAddress) -> bool;
}
