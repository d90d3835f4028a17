//! Process-wide cache of per-account crypto contexts.
//!
//! Modeled as an explicit object with init-at-startup and
//! teardown-at-shutdown lifecycle, passed by reference to call sites.
//! Entries are keyed by the normalized account name and built lazily on
//! first lookup.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info};

use vl_crypto::{CryptoError, CryptoProvider};

use crate::address::strip_resource;
use crate::context::CryptoContext;
use crate::engine::DakeEngine;
use crate::error::SessionError;
use crate::store::BackendStore;

/// Factory for the capabilities a new context binds at construction.
///
/// `backend` failures surface as [`SessionError::BackendInit`],
/// `crypto_provider` failures as [`SessionError::CryptoProviderInit`];
/// implementations return those variants directly.
pub trait ContextBindings {
    fn backend(&self, account: &str) -> Result<Rc<dyn BackendStore>, SessionError>;

    fn crypto_provider(&self, account: &str) -> Result<Rc<dyn CryptoProvider>, SessionError>;

    fn engine(
        &self,
        account: &str,
        store: Rc<dyn BackendStore>,
    ) -> Result<Rc<dyn DakeEngine>, SessionError>;
}

pub struct AccountRegistry {
    bindings: Box<dyn ContextBindings>,
    contexts: HashMap<String, Rc<CryptoContext>>,
}

impl AccountRegistry {
    pub fn new(bindings: Box<dyn ContextBindings>) -> Self {
        Self {
            bindings,
            contexts: HashMap::new(),
        }
    }

    /// Look up the context for `name`, constructing it on first use.
    ///
    /// `name` may carry a resource suffix; the registry key is always the
    /// bare account name. When construction fails, every partially built
    /// capability is dropped before the error returns, so a later call
    /// starts from a clean slate.
    pub fn get_or_create(&mut self, name: &str) -> Result<Rc<CryptoContext>, SessionError> {
        let account = strip_resource(name);
        if let Some(ctx) = self.contexts.get(account) {
            return Ok(Rc::clone(ctx));
        }

        let ctx = self.build_context(account)?;
        self.contexts.insert(account.to_string(), Rc::clone(&ctx));
        Ok(ctx)
    }

    /// The context for `name` if one already exists; never constructs.
    pub fn get(&self, name: &str) -> Option<Rc<CryptoContext>> {
        self.contexts.get(strip_resource(name)).cloned()
    }

    /// Destroy every context and clear the cache. Run at shutdown or
    /// account-set reload; must not be called while a lookup for this
    /// process is logically in flight.
    pub fn reset(&mut self) {
        info!(contexts = self.contexts.len(), "resetting account registry");
        self.contexts.clear();
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn build_context(&self, account: &str) -> Result<Rc<CryptoContext>, SessionError> {
        debug!(account, "constructing crypto context");
        let store = self.bindings.backend(account)?;
        let provider = self.bindings.crypto_provider(account)?;

        store
            .prepare(account)
            .map_err(|e| SessionError::BackendInit(e.to_string()))?;

        let engine = self.bindings.engine(account, Rc::clone(&store))?;

        let faux_registration_id = generate_registration_id(provider.as_ref())
            .map_err(|e| SessionError::CryptoProviderInit(e.to_string()))?;

        info!(account, faux_registration_id, "crypto context ready");
        Ok(Rc::new(CryptoContext::new(
            account,
            faux_registration_id,
            provider,
            store,
            engine,
        )))
    }
}

/// Draw a fresh registration id from the provider, in the same 14-bit range
/// the signal key helpers use (1..=0x3FFE).
fn generate_registration_id(provider: &dyn CryptoProvider) -> Result<u32, CryptoError> {
    let bytes = provider.random_bytes(4)?;
    let raw: [u8; 4] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Randomness)?;
    Ok((u32::from_be_bytes(raw) % 0x3FFE) + 1)
}
