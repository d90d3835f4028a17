//! Backend persistence capability.
//!
//! The core implements no persistence itself; identity trust material,
//! session records and pre-key state live behind this trait, implemented by
//! an adapter over whatever store the host application uses. [`MemoryStore`]
//! is the in-crate implementation for tests and ephemeral accounts.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::address::PeerAddress;
use crate::error::SessionError;

pub trait BackendStore {
    /// Provisioning hook run once during context construction (key
    /// generation, schema checks, whatever the backend needs before use).
    fn prepare(&self, account: &str) -> Result<(), SessionError>;

    /// Persist or replace trust material for `address`.
    ///
    /// `None` is the revocation signal: saving an absent key deletes the
    /// identity without a destructive row-delete.
    fn save_identity(&self, address: &PeerAddress, key: Option<&[u8]>)
        -> Result<(), SessionError>;

    fn load_identity(&self, address: &PeerAddress) -> Result<Option<Vec<u8>>, SessionError>;

    /// Known device ids for a bare JID, from backend session state.
    /// An empty list is a valid answer, not an error.
    fn device_ids(&self, bare_jid: &str) -> Result<Vec<u32>, SessionError>;
}

/// Non-persistent store backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: RefCell<HashMap<PeerAddress, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackendStore for MemoryStore {
    fn prepare(&self, _account: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn save_identity(
        &self,
        address: &PeerAddress,
        key: Option<&[u8]>,
    ) -> Result<(), SessionError> {
        let mut identities = self.identities.borrow_mut();
        match key {
            Some(key) => {
                identities.insert(address.clone(), key.to_vec());
            }
            None => {
                identities.remove(address);
            }
        }
        Ok(())
    }

    fn load_identity(&self, address: &PeerAddress) -> Result<Option<Vec<u8>>, SessionError> {
        Ok(self.identities.borrow().get(address).cloned())
    }

    fn device_ids(&self, bare_jid: &str) -> Result<Vec<u32>, SessionError> {
        let mut ids: Vec<u32> = self
            .identities
            .borrow()
            .keys()
            .filter(|addr| addr.bare_jid() == bare_jid)
            .map(|addr| addr.device_id())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_absent_deletes() {
        let store = MemoryStore::new();
        let addr = PeerAddress::new("bob@example.org", 3);

        store.save_identity(&addr, Some(b"pubkey")).unwrap();
        assert_eq!(store.load_identity(&addr).unwrap().as_deref(), Some(&b"pubkey"[..]));

        store.save_identity(&addr, None).unwrap();
        assert_eq!(store.load_identity(&addr).unwrap(), None);
    }

    #[test]
    fn device_ids_partition_by_bare_jid() {
        let store = MemoryStore::new();
        store
            .save_identity(&PeerAddress::new("bob@example.org", 2), Some(b"k"))
            .unwrap();
        store
            .save_identity(&PeerAddress::new("bob@example.org", 1), Some(b"k"))
            .unwrap();
        store
            .save_identity(&PeerAddress::new("eve@example.org", 9), Some(b"k"))
            .unwrap();

        assert_eq!(store.device_ids("bob@example.org").unwrap(), vec![1, 2]);
        assert_eq!(store.device_ids("mallory@example.org").unwrap(), Vec::<u32>::new());
    }
}
