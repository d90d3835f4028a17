use thiserror::Error;
use vl_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum ProtoError {
    /// A pipeline stage was invoked before its preconditions were met.
    #[error("required message state missing: {0}")]
    MissingState(&'static str),

    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("message body has no text content")]
    MissingBody,

    #[error("message payload is already encrypted")]
    AlreadyEncrypted,

    #[error("crypto provider failure: {0}")]
    Crypto(#[from] CryptoError),
}
