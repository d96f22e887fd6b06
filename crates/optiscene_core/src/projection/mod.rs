//! Read-side projection of stored documents.
//!
//! # Responsibility
//! - Turn a scene entry or template into one nested, human-readable tree:
//!   references resolved inline, `_properties` blocks hoisted.
//! - Find keys in such trees by exact key, prefix, suffix or similarity.
//!
//! # Invariants
//! - Projection never writes to the store.
//! - A tree without references or `_properties` keys projects to itself.

use crate::config::ProjectionOptions;
use crate::repo::{DocumentStore, StoreResult};
use serde_json::Value;

mod properties;
mod references;
mod search;
mod similarity;

pub use properties::{hoist_properties, PROPERTIES_SUFFIX};
pub use references::{resolve_references, GUIDS_SUFFIX, GUID_SUFFIX};
pub use search::{
    best_match, find_by_key, find_by_key_prefix, find_by_key_suffix, flatten, lookup, KeyHit,
    Lookup,
};
pub use similarity::similarity;

/// Store and options bound together for one projection pass.
#[derive(Clone, Copy)]
pub struct Projector<'a> {
    store: &'a dyn DocumentStore,
    options: &'a ProjectionOptions,
}

impl<'a> Projector<'a> {
    pub fn new(store: &'a dyn DocumentStore, options: &'a ProjectionOptions) -> Self {
        Self { store, options }
    }

    pub fn resolve(&self, tree: &mut Value) -> StoreResult<()> {
        resolve_references(self.store, tree, &self.options.ignore_references)
    }

    pub fn hoist(&self, tree: &mut Value) {
        hoist_properties(tree, &self.options.hoist_denylist);
    }

    /// Resolves then hoists.
    pub fn project(&self, mut tree: Value) -> StoreResult<Value> {
        self.resolve(&mut tree)?;
        self.hoist(&mut tree);
        Ok(tree)
    }
}
