//! Instance metadata and the durable identity it carries.
//!
//! # Invariants
//! - On the wire the identity is the ordinary metadata entry `UniqueId`.
//! - In memory it lives in a dedicated slot that only the sync layer writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Metadata key under which the identity is stored in a scene entry.
pub const UNIQUE_ID_KEY: &str = "UniqueId";

/// Identity of a scene entry, stable for the lifetime of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UniqueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// User metadata of a scene entry plus its identity slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct InstanceMetadata {
    entries: BTreeMap<String, String>,
    unique_id: Option<UniqueId>,
}

impl InstanceMetadata {
    /// Builds metadata from user entries. A `UniqueId` entry is dropped;
    /// identities cannot be injected from user input.
    pub fn from_entries(mut entries: BTreeMap<String, String>) -> Self {
        entries.remove(UNIQUE_ID_KEY);
        Self {
            entries,
            unique_id: None,
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Inserts a user entry. Returns `false` for the reserved identity key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if key == UNIQUE_ID_KEY {
            return false;
        }
        self.entries.insert(key, value.into());
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn unique_id(&self) -> Option<&UniqueId> {
        self.unique_id.as_ref()
    }

    pub(crate) fn set_unique_id(&mut self, unique_id: Option<UniqueId>) {
        self.unique_id = unique_id;
    }
}

impl From<BTreeMap<String, String>> for InstanceMetadata {
    fn from(mut entries: BTreeMap<String, String>) -> Self {
        let unique_id = entries
            .remove(UNIQUE_ID_KEY)
            .filter(|value| !value.is_empty())
            .map(UniqueId);
        Self { entries, unique_id }
    }
}

impl From<InstanceMetadata> for BTreeMap<String, String> {
    fn from(value: InstanceMetadata) -> Self {
        let mut entries = value.entries;
        if let Some(unique_id) = value.unique_id {
            entries.insert(UNIQUE_ID_KEY.to_string(), unique_id.0);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::{InstanceMetadata, UniqueId, UNIQUE_ID_KEY};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn identity_travels_as_plain_metadata_entry() {
        let mut metadata = InstanceMetadata::default();
        metadata.insert("owner", "lab");
        metadata.set_unique_id(Some(UniqueId::generate()));

        let wire = serde_json::to_value(&metadata).expect("encode metadata");
        assert_eq!(wire["owner"], json!("lab"));
        assert!(wire[UNIQUE_ID_KEY].is_string());

        let decoded: InstanceMetadata = serde_json::from_value(wire).expect("decode metadata");
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn user_entries_cannot_forge_identity() {
        let mut metadata = InstanceMetadata::from_entries(BTreeMap::from([(
            UNIQUE_ID_KEY.to_string(),
            "forged".to_string(),
        )]));
        assert!(metadata.unique_id().is_none());
        assert!(!metadata.insert(UNIQUE_ID_KEY, "forged"));
        assert!(metadata.entries().is_empty());
    }

    #[test]
    fn empty_wire_identity_reads_as_absent() {
        let decoded: InstanceMetadata =
            serde_json::from_value(json!({ UNIQUE_ID_KEY: "" })).expect("decode metadata");
        assert!(decoded.unique_id().is_none());
    }
}
