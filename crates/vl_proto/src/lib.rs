//! vl_proto — envelope construction and wire-facing types for the Veil
//! messaging extension.
//!
//! # Modules
//! - `message`     — staged construction of an outgoing encrypted envelope
//!                   (header + AEAD payload)
//! - `xml`         — minimal owned XML tree for the envelope subtrees
//! - `device_list` — per-user device id collections from pub-sub payloads
//! - `bundle`      — published pre-key bundle carrier (offline handshakes)
//! - `error`       — unified error type

pub mod bundle;
pub mod device_list;
pub mod error;
pub mod message;
pub mod xml;

pub use bundle::PreKeyBundle;
pub use device_list::DeviceList;
pub use error::ProtoError;
pub use message::OmemoMessage;
