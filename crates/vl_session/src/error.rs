use thiserror::Error;
use vl_crypto::CryptoError;

use crate::address::PeerAddress;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Query or termination aimed at an address the ledger does not know.
    #[error("no session for {0}")]
    NoSession(PeerAddress),

    /// Handshake bytes could not be decoded into a valid handshake step.
    #[error("malformed handshake message")]
    MalformedHandshake,

    #[error("backend store failure: {0}")]
    Backend(String),

    #[error("backend store initialisation failed: {0}")]
    BackendInit(String),

    #[error("crypto provider initialisation failed: {0}")]
    CryptoProviderInit(String),

    #[error("crypto provider failure: {0}")]
    Crypto(#[from] CryptoError),
}
