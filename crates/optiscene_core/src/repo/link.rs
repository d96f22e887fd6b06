//! Handle to one stored document.

use super::{DocumentStore, StoreResult};
use crate::model::{decode, encode, Document, DocumentKey, DocumentKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Store plus key. Cloning shares the store.
#[derive(Clone)]
pub struct DocumentLink {
    store: Arc<dyn DocumentStore>,
    key: DocumentKey,
}

impl DocumentLink {
    /// Attaches to an existing key without touching the store.
    pub fn attach(store: Arc<dyn DocumentStore>, key: DocumentKey) -> Self {
        Self { store, key }
    }

    pub fn create(
        store: Arc<dyn DocumentStore>,
        kind: DocumentKind,
        body: &Value,
    ) -> StoreResult<Self> {
        let key = store.create(kind, body)?;
        Ok(Self { store, key })
    }

    pub fn create_from<T: Document>(store: Arc<dyn DocumentStore>, document: &T) -> StoreResult<Self> {
        let body = encode(document)?;
        Self::create(store, T::KIND, &body)
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn get(&self) -> StoreResult<Value> {
        Ok(self.store.read(&self.key)?.body)
    }

    pub fn get_as<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(decode(self.get()?)?)
    }

    pub fn revision(&self) -> StoreResult<u64> {
        Ok(self.store.read(&self.key)?.revision)
    }

    pub fn set(&self, body: &Value) -> StoreResult<()> {
        self.store.update(&self.key, body)
    }

    pub fn set_as<T: Serialize>(&self, document: &T) -> StoreResult<()> {
        self.set(&encode(document)?)
    }

    pub fn delete(&self) -> StoreResult<()> {
        self.store.delete(&self.key)
    }
}

impl Debug for DocumentLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentLink").field("key", &self.key).finish()
    }
}

impl PartialEq for DocumentLink {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
