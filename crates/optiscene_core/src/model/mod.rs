//! Typed documents of an optical scene.
//!
//! # Responsibility
//! - Define the template, instance and scene shapes exchanged with a
//!   `DocumentStore`.
//! - Keep the wire shape (snake_case keys, `_guid`/`_guids` references,
//!   `_properties` blocks) in one place.
//!
//! # Invariants
//! - Sub-modes are externally tagged enums, so a document holds exactly
//!   one active sub-mode.
//! - Documents reference each other only through `_guid`/`_guids` keys.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

pub mod document;
pub mod geometry;
pub mod intensity;
pub mod material;
pub mod metadata;
pub mod part;
pub mod scene;
pub mod sensor;
pub mod simulation;
pub mod source;
pub mod spectrum;
pub mod validation;

pub use document::{
    decode, encode, to_pretty_string, CodecError, CodecResult, DocumentKey, DocumentKind,
};
pub use geometry::{GeoPaths, GeoRef, OrientedGeoPath, ORIGIN_AXIS_SYSTEM};
pub use metadata::{InstanceMetadata, UniqueId, UNIQUE_ID_KEY};
pub use scene::{SceneCollection, SceneDocument, SceneEntry};
pub use validation::{validate_document, ValidationError};

/// A document stored under its own key.
pub trait Document: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + 'static {
    const KIND: DocumentKind;

    fn name(&self) -> &str;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
