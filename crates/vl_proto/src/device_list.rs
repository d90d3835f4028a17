//! Per-user device id collections.
//!
//! A device list names every device id one bare JID has published. Lists are
//! transient: produced either from a pub-sub `<list>` payload or from backend
//! session state, then consumed by session queries and the offline handshake
//! flow.

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::xml::Element;

const LIST_NODE: &str = "list";
const DEVICE_NODE: &str = "device";
const ID_ATTR: &str = "id";

/// Ordered, duplicate-free device ids belonging to one bare JID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceList {
    bare_jid: String,
    ids: Vec<u32>,
}

impl DeviceList {
    pub fn new(bare_jid: impl Into<String>) -> Self {
        Self {
            bare_jid: bare_jid.into(),
            ids: Vec::new(),
        }
    }

    pub fn bare_jid(&self) -> &str {
        &self.bare_jid
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Append an id, keeping the list duplicate-free. Insertion order is
    /// preserved but carries no protocol meaning.
    pub fn add(&mut self, id: u32) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Import a pub-sub device list payload:
    /// `<list><device id='123'/>...</list>`.
    ///
    /// Devices with a missing or unparseable id attribute make the whole
    /// payload malformed; a well-formed empty `<list/>` yields an empty list.
    pub fn from_pubsub_payload(bare_jid: &str, xml: &str) -> Result<Self, ProtoError> {
        let root = Element::parse(xml)?;
        let list = root
            .find(LIST_NODE)
            .ok_or_else(|| ProtoError::MalformedXml("no <list> node in payload".into()))?;

        let mut out = Self::new(bare_jid);
        for dev in list.children_named(DEVICE_NODE) {
            let id = dev
                .attr(ID_ATTR)
                .ok_or_else(|| ProtoError::MalformedXml("<device> without id attribute".into()))?;
            let id: u32 = id
                .parse()
                .map_err(|_| ProtoError::MalformedXml(format!("bad device id '{id}'")))?;
            out.add(id);
        }
        Ok(out)
    }

    /// Serialize to the pub-sub wire shape.
    pub fn to_pubsub_payload(&self) -> String {
        let mut list = Element::new(LIST_NODE);
        for id in &self.ids {
            let mut dev = Element::new(DEVICE_NODE);
            dev.set_attr(ID_ATTR, id.to_string());
            list.push_element(dev);
        }
        list.to_string()
    }
}
