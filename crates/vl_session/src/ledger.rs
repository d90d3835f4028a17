//! Authenticated-session ledger.
//!
//! One [`AuthNode`] per peer device address, owned exclusively by the ledger
//! of the account that negotiated it. The ledger drives both handshake
//! variants through the [`DakeEngine`] and answers the session queries the
//! command layer needs.
//!
//! Handshake steps for a given address must be fed in transport delivery
//! order; the single-threaded event-loop model makes that a sequencing
//! concern for the caller, not a locking concern here.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info};

use vl_proto::{DeviceList, PreKeyBundle};

use crate::address::PeerAddress;
use crate::engine::{DakeEngine, DakeStep};
use crate::error::SessionError;

/// Handshake progress for one peer device.
///
/// A node only exists once handshake activity has produced state, so the
/// not-mid-handshake case is named for what it actually means: an
/// established session. The never-started case is the absence of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    HandshakeInProgress,
    Established,
}

/// Per-peer-device handshake record.
#[derive(Debug, Clone)]
pub struct AuthNode {
    address: PeerAddress,
    state: AuthState,
    /// Known only once the handshake has concluded.
    real_registration_id: Option<u32>,
}

impl AuthNode {
    pub fn address(&self) -> &PeerAddress {
        &self.address
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// The peer's real registration id, masked on the wire by the faux id.
    pub fn real_registration_id(&self) -> Option<u32> {
        self.real_registration_id
    }

    /// The synthetic device id the peer negotiates under; identical to the
    /// device id of the node's address.
    pub fn faux_registration_id(&self) -> u32 {
        self.address.device_id()
    }
}

/// What the caller must do after feeding the ledger a handshake event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Transmit this handshake message to the peer.
    Send(Vec<u8>),
    /// The handshake concluded; the session is usable.
    Established { real_registration_id: u32 },
}

/// Result of feeding a fetched bundle to the offline flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineOutcome {
    /// A fresh session was derived from the bundle.
    Initiated { real_registration_id: u32 },
    /// An initiated session already existed; the bundle was ignored.
    AlreadyEstablished,
}

/// Owned map from peer address to handshake state.
pub struct SessionLedger {
    engine: Rc<dyn DakeEngine>,
    nodes: HashMap<PeerAddress, AuthNode>,
}

impl SessionLedger {
    pub fn new(engine: Rc<dyn DakeEngine>) -> Self {
        Self {
            engine,
            nodes: HashMap::new(),
        }
    }

    /// Drive the interactive handshake for `address`.
    ///
    /// With `message` absent this is a locally initiated handshake: the
    /// engine produces the initiation message and the ledger stays untouched
    /// until the peer's response arrives. With `message` present, the opaque
    /// bytes are one handshake step; the node's state is created or updated
    /// according to what the engine makes of them.
    pub fn handle_incoming(
        &mut self,
        address: &PeerAddress,
        message: Option<&[u8]>,
    ) -> Result<HandshakeOutcome, SessionError> {
        let Some(bytes) = message else {
            debug!(%address, "starting interactive handshake");
            let first = self.engine.start_handshake(address)?;
            return Ok(HandshakeOutcome::Send(first));
        };

        match self.engine.handshake_step(address, bytes)? {
            DakeStep::Reply(next) => {
                debug!(%address, "handshake step advanced");
                self.upsert(address, AuthState::HandshakeInProgress, None);
                Ok(HandshakeOutcome::Send(next))
            }
            DakeStep::Established {
                real_registration_id,
            } => {
                info!(%address, real_registration_id, "interactive handshake completed");
                self.upsert(address, AuthState::Established, Some(real_registration_id));
                Ok(HandshakeOutcome::Established {
                    real_registration_id,
                })
            }
        }
    }

    /// First half of the offline flow: a peer's device list arrived, so
    /// every listed device needs its bundle fetched. Returns the addresses
    /// to request bundles for.
    pub fn bundle_targets(&self, list: &DeviceList) -> Vec<PeerAddress> {
        list.ids()
            .iter()
            .map(|&id| PeerAddress::new(list.bare_jid(), id))
            .collect()
    }

    /// Second half of the offline flow: a fetched bundle arrived. Creates a
    /// session unless the engine already holds an initiated one for this
    /// address.
    pub fn establish_from_bundle(
        &mut self,
        address: &PeerAddress,
        bundle: &PreKeyBundle,
    ) -> Result<OfflineOutcome, SessionError> {
        if self.engine.session_exists(address) {
            debug!(%address, "bundle ignored, session already initiated");
            return Ok(OfflineOutcome::AlreadyEstablished);
        }

        let real_registration_id = self.engine.create_session_from_bundle(address, bundle)?;
        info!(%address, real_registration_id, "offline session initiated");
        self.upsert(address, AuthState::Established, Some(real_registration_id));
        Ok(OfflineOutcome::Initiated {
            real_registration_id,
        })
    }

    /// Faux device ids of every established session with `bare_jid`.
    /// Incomplete handshakes are ignored. No ordering guarantee.
    pub fn active_faux_ids_for(&self, bare_jid: &str) -> Vec<u32> {
        self.established_for(bare_jid)
            .map(AuthNode::faux_registration_id)
            .collect()
    }

    /// Real-to-faux registration id pairs for every established session with
    /// `bare_jid`, or `None` when there is none. Callers distinguish "no
    /// sessions" from an empty-but-present map by the `Option`.
    pub fn id_pairs_with_session(&self, bare_jid: &str) -> Option<HashMap<u32, u32>> {
        let pairs: HashMap<u32, u32> = self
            .established_for(bare_jid)
            .filter_map(|node| {
                node.real_registration_id
                    .map(|real| (real, node.faux_registration_id()))
            })
            .collect();
        (!pairs.is_empty()).then_some(pairs)
    }

    /// The real registration id behind a faux device address; used to report
    /// the peer's identity before terminating.
    pub fn real_registration_id_for(&self, address: &PeerAddress) -> Result<u32, SessionError> {
        self.nodes
            .get(address)
            .and_then(|node| node.real_registration_id)
            .ok_or_else(|| SessionError::NoSession(address.clone()))
    }

    /// Drop the node for `address`. Does not notify the peer; callers send
    /// their termination notice through the message pipeline before or after
    /// this call.
    pub fn terminate(&mut self, address: &PeerAddress) -> Result<AuthNode, SessionError> {
        let node = self
            .nodes
            .remove(address)
            .ok_or_else(|| SessionError::NoSession(address.clone()))?;
        info!(%address, "session terminated");
        Ok(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn established_for<'a>(&'a self, bare_jid: &'a str) -> impl Iterator<Item = &'a AuthNode> {
        self.nodes.values().filter(move |node| {
            node.address.bare_jid() == bare_jid && node.state == AuthState::Established
        })
    }

    fn upsert(&mut self, address: &PeerAddress, state: AuthState, real: Option<u32>) {
        let node = self
            .nodes
            .entry(address.clone())
            .or_insert_with(|| AuthNode {
                address: address.clone(),
                state,
                real_registration_id: real,
            });
        node.state = state;
        node.real_registration_id = real;
    }
}
