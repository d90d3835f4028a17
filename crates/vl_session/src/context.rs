//! Per-account crypto context.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use vl_crypto::CryptoProvider;
use vl_proto::DeviceList;

use crate::address::PeerAddress;
use crate::engine::DakeEngine;
use crate::error::SessionError;
use crate::identity::IdentityAdapter;
use crate::ledger::SessionLedger;
use crate::store::BackendStore;

/// Everything one local account needs for encrypted messaging: the crypto
/// provider binding, the backend store, the identity adapter over it, the
/// session ledger, and the account's faux registration id.
///
/// Created once per account by the registry on first use; destroyed when the
/// account logs out or the registry is reset.
pub struct CryptoContext {
    account: String,
    faux_registration_id: u32,
    provider: Rc<dyn CryptoProvider>,
    store: Rc<dyn BackendStore>,
    identity: IdentityAdapter,
    ledger: RefCell<SessionLedger>,
}

impl CryptoContext {
    pub(crate) fn new(
        account: impl Into<String>,
        faux_registration_id: u32,
        provider: Rc<dyn CryptoProvider>,
        store: Rc<dyn BackendStore>,
        engine: Rc<dyn DakeEngine>,
    ) -> Self {
        Self {
            account: account.into(),
            faux_registration_id,
            provider,
            identity: IdentityAdapter::new(Rc::clone(&store)),
            store,
            ledger: RefCell::new(SessionLedger::new(engine)),
        }
    }

    /// The normalized (resource-stripped) account name this context is
    /// keyed by.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Stable synthetic id masking the account's real registration id in
    /// faux/offline flows.
    pub fn faux_registration_id(&self) -> u32 {
        self.faux_registration_id
    }

    pub fn crypto_provider(&self) -> &dyn CryptoProvider {
        self.provider.as_ref()
    }

    pub fn backend(&self) -> &dyn BackendStore {
        self.store.as_ref()
    }

    pub fn identity(&self) -> &IdentityAdapter {
        &self.identity
    }

    pub fn ledger(&self) -> Ref<'_, SessionLedger> {
        self.ledger.borrow()
    }

    pub fn ledger_mut(&self) -> RefMut<'_, SessionLedger> {
        self.ledger.borrow_mut()
    }

    /// Delete the identity rows behind faux ids this account once published,
    /// after the corresponding bundles have been withdrawn from the server.
    pub fn retire_faux_ids(&self, published: &DeviceList) -> Result<(), SessionError> {
        for &id in published.ids() {
            self.identity
                .delete_identity(&PeerAddress::new(published.bare_jid(), id))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DakeStep;
    use crate::store::MemoryStore;
    use vl_crypto::AesGcmProvider;
    use vl_proto::PreKeyBundle;

    struct NullEngine;

    impl DakeEngine for NullEngine {
        fn start_handshake(&self, _address: &PeerAddress) -> Result<Vec<u8>, SessionError> {
            Ok(Vec::new())
        }

        fn handshake_step(
            &self,
            _address: &PeerAddress,
            _message: &[u8],
        ) -> Result<DakeStep, SessionError> {
            Err(SessionError::MalformedHandshake)
        }

        fn create_session_from_bundle(
            &self,
            _address: &PeerAddress,
            _bundle: &PreKeyBundle,
        ) -> Result<u32, SessionError> {
            Ok(0)
        }

        fn session_exists(&self, _address: &PeerAddress) -> bool {
            false
        }
    }

    #[test]
    fn retire_faux_ids_clears_identity_rows() {
        let store = Rc::new(MemoryStore::new());
        let ctx = CryptoContext::new(
            "alice@example.org",
            1234,
            Rc::new(AesGcmProvider::new()),
            Rc::clone(&store) as Rc<dyn BackendStore>,
            Rc::new(NullEngine),
        );

        for id in [100, 200] {
            ctx.identity()
                .save_identity(&PeerAddress::new("alice@example.org", id), b"k")
                .unwrap();
        }
        assert_eq!(ctx.identity().device_ids_for("alice@example.org").unwrap().len(), 2);

        let published = ctx.identity().device_ids_for("alice@example.org").unwrap();
        ctx.retire_faux_ids(&published).unwrap();
        assert!(ctx.identity().device_ids_for("alice@example.org").unwrap().is_empty());
    }
}
