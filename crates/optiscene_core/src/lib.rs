//! Core of the optical scene client.
//! Features move between local drafts and a shared scene document; this crate
//! owns that lifecycle, the scene reconciliation and the read-side projection.

pub mod config;
pub mod db;
pub mod feature;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ProjectionOptions, SessionOptions};
pub use feature::{
    Body, Descriptor, Face, Feature, FeatureError, FeatureResult, GeometryLevel, Intensity,
    Material, Part, Sensor, Simulation, Source, Spectrum, SubPart, TemplateWrite, UsageError,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{DocumentKey, DocumentKind, GeoRef, SceneDocument, UniqueId};
pub use projection::{best_match, find_by_key, find_by_key_prefix, find_by_key_suffix, Lookup};
pub use repo::{DocumentLink, DocumentStore, SqliteDocumentStore, StoreError, StoreResult};
pub use service::{FeatureRef, FeatureType, Project, ProjectError, ProjectResult, Shared};
pub use sync::{Reconciliation, SceneReconciler, SceneSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
