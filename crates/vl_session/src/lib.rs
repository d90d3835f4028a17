//! vl_session — per-account session bookkeeping for the Veil messaging
//! extension.
//!
//! One [`CryptoContext`] exists per local account, cached in an
//! [`AccountRegistry`] keyed by the normalized (resource-stripped) account
//! name. Each context owns a [`SessionLedger`] tracking authenticated
//! key-exchange state with every remote peer device, an [`IdentityAdapter`]
//! over the backend store, and the crypto provider binding used by the
//! envelope pipeline in `vl_proto`.
//!
//! The key-exchange math itself lives behind the [`DakeEngine`] trait;
//! persistence lives behind [`BackendStore`]. Both are injected at context
//! construction and are trivially substitutable by test doubles.
//!
//! The whole crate is single-threaded by contract: it is driven serially by
//! one external event loop, so `Rc`/`RefCell` stand in where shared ownership
//! and interior mutability are needed.
//!
//! # Modules
//! - `address`  — peer device addressing and JID normalization
//! - `ledger`   — handshake state per peer device, session queries
//! - `engine`   — external key-exchange engine boundary
//! - `store`    — backend persistence capability + in-memory implementation
//! - `identity` — identity-key save/delete and device enumeration
//! - `context`  — per-account crypto context
//! - `registry` — process-wide context cache
//! - `error`    — unified error type

pub mod address;
pub mod context;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod registry;
pub mod store;

pub use address::PeerAddress;
pub use context::CryptoContext;
pub use engine::{DakeEngine, DakeStep};
pub use error::SessionError;
pub use identity::IdentityAdapter;
pub use ledger::{AuthNode, AuthState, HandshakeOutcome, OfflineOutcome, SessionLedger};
pub use registry::{AccountRegistry, ContextBindings};
pub use store::{BackendStore, MemoryStore};
