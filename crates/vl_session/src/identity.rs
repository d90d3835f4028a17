//! Identity-key bookkeeping over the backend store.

use std::rc::Rc;

use vl_proto::DeviceList;

use crate::address::PeerAddress;
use crate::error::SessionError;
use crate::store::BackendStore;

/// Thin adapter bridging identity save/delete and device enumeration to the
/// backend session/identity store capability.
pub struct IdentityAdapter {
    store: Rc<dyn BackendStore>,
}

impl IdentityAdapter {
    pub fn new(store: Rc<dyn BackendStore>) -> Self {
        Self { store }
    }

    /// Persist or replace the public identity key trusted for `address`.
    pub fn save_identity(
        &self,
        address: &PeerAddress,
        public_key: &[u8],
    ) -> Result<(), SessionError> {
        self.store.save_identity(address, Some(public_key))
    }

    /// Revoke the identity bound to `address` by saving an absent key.
    pub fn delete_identity(&self, address: &PeerAddress) -> Result<(), SessionError> {
        self.store.save_identity(address, None)
    }

    /// Enumerate the device ids known for `bare_jid`. A user without devices
    /// yields an empty list.
    pub fn device_ids_for(&self, bare_jid: &str) -> Result<DeviceList, SessionError> {
        let mut list = DeviceList::new(bare_jid);
        for id in self.store.device_ids(bare_jid)? {
            list.add(id);
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn adapter() -> IdentityAdapter {
        IdentityAdapter::new(Rc::new(MemoryStore::new()))
    }

    #[test]
    fn save_then_delete_roundtrip() {
        let adapter = adapter();
        let addr = PeerAddress::new("bob@example.org", 5);

        adapter.save_identity(&addr, b"identity-key").unwrap();
        assert_eq!(adapter.device_ids_for("bob@example.org").unwrap().ids(), &[5]);

        adapter.delete_identity(&addr).unwrap();
        assert!(adapter.device_ids_for("bob@example.org").unwrap().is_empty());
    }

    #[test]
    fn unknown_user_gives_empty_list_not_error() {
        let list = adapter().device_ids_for("nobody@example.org").unwrap();
        assert_eq!(list.bare_jid(), "nobody@example.org");
        assert!(list.is_empty());
    }
}
