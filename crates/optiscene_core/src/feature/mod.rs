//! Feature lifecycle: local draft to durable scene entry and back.
//!
//! # Responsibility
//! - Give every feature kind one `commit`/`reset`/`delete`/`get` contract
//!   through the generic `Feature<K>` engine.
//! - Keep per-kind knowledge (template shape, reference binding, extra
//!   documents, sub-mode accessors) in small `FeatureKind` tables.
//!
//! # Invariants
//! - A feature never changes its `UniqueId` once assigned; `delete` clears it.
//! - A failed `commit` leaves the local template and instance untouched.
//! - Templates and scenes are written only when their content changed.

use crate::model::{
    CodecError, Document, DocumentKey, InstanceMetadata, SceneCollection, SceneEntry, UniqueId,
};
use crate::projection::Projector;
use crate::repo::{DocumentLink, DocumentStore, StoreError};
use crate::sync::SyncError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod descriptor;
mod engine;
pub mod geometry;
pub mod intensity;
pub mod material;
pub mod sensor;
pub mod simulation;
pub mod source;
pub mod spectrum;

pub use descriptor::{Descriptor, TemplateWrite};
pub use engine::Feature;
pub use geometry::{Body, Face, GeometryLevel, GeometryNode, Part, SubPart};
pub use intensity::Intensity;
pub use material::{Material, MaterialKind};
pub use sensor::{Sensor, SensorKind};
pub use simulation::{Simulation, SimulationKind};
pub use source::{Source, SourceKind};
pub use spectrum::Spectrum;

pub type FeatureResult<T> = Result<T, FeatureError>;

#[derive(Debug)]
pub enum FeatureError {
    Store(StoreError),
    Codec(CodecError),
    IdentityMismatch {
        collection: SceneCollection,
        unique_id: UniqueId,
    },
    Usage(UsageError),
}

impl Display for FeatureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::IdentityMismatch {
                collection,
                unique_id,
            } => write!(
                f,
                "scene {collection} holds no entry with UniqueId {unique_id}; local and remote state diverged"
            ),
            Self::Usage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FeatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::IdentityMismatch { .. } => None,
            Self::Usage(err) => Some(err),
        }
    }
}

impl From<StoreError> for FeatureError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<CodecError> for FeatureError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<UsageError> for FeatureError {
    fn from(value: UsageError) -> Self {
        Self::Usage(value)
    }
}

impl From<SyncError> for FeatureError {
    fn from(value: SyncError) -> Self {
        match value {
            SyncError::Store(err) => Self::Store(err),
            SyncError::IdentityMismatch {
                collection,
                unique_id,
            } => Self::IdentityMismatch {
                collection,
                unique_id,
            },
        }
    }
}

/// A field of one sub-mode was used while another sub-mode is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError {
    pub operation: &'static str,
    pub expected: &'static str,
    pub actual: &'static str,
}

impl UsageError {
    pub(crate) fn wrong_mode(
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self {
            operation,
            expected,
            actual,
        }
    }
}

impl Display for UsageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` needs {} mode but {} mode is selected",
            self.operation, self.expected, self.actual
        )
    }
}

impl Error for UsageError {}

/// Per-kind table plugged into `Feature<K>`.
pub trait FeatureKind: Sized + Send + 'static {
    type Template: Document;
    type Instance: SceneEntry;
    /// Documents owned besides the primary template.
    type Extra: Send;

    /// Log label.
    const LABEL: &'static str;
    /// Projection key of the template once its reference is resolved.
    const TEMPLATE_FIELD: &'static str;

    fn new_template(name: &str, description: &str) -> Self::Template;
    fn new_instance(name: &str, description: &str, metadata: InstanceMetadata) -> Self::Instance;
    fn new_extra(store: &Arc<dyn DocumentStore>, name: &str) -> Self::Extra;

    fn template_key(instance: &Self::Instance) -> Option<DocumentKey>;
    fn bind_template(instance: &mut Self::Instance, key: Option<&DocumentKey>);

    /// Re-links extra documents of a loaded scene entry.
    fn load_extra(
        store: &Arc<dyn DocumentStore>,
        instance: &Self::Instance,
        _template: &Self::Template,
    ) -> FeatureResult<Self::Extra> {
        Ok(Self::new_extra(store, instance.name()))
    }

    /// Commits extra documents and binds their keys. Runs on copies of the
    /// template and instance before the template is pushed.
    fn commit_extra(
        _extra: &mut Self::Extra,
        _template: &mut Self::Template,
        _instance: &mut Self::Instance,
    ) -> FeatureResult<()> {
        Ok(())
    }

    /// Deletes documents the committed template no longer references. Runs
    /// only after the template and the scene entry were both written.
    fn after_commit(_extra: &mut Self::Extra, _template: &Self::Template) -> FeatureResult<()> {
        Ok(())
    }

    fn reset_extra(_extra: &mut Self::Extra) -> FeatureResult<()> {
        Ok(())
    }

    fn delete_extra(
        _extra: &mut Self::Extra,
        _template: &mut Self::Template,
        _instance: &mut Self::Instance,
    ) -> FeatureResult<()> {
        Ok(())
    }

    /// Fills in drafts for references the projected instance cannot resolve
    /// yet. The default inserts the template under `TEMPLATE_FIELD`.
    fn project_drafts(
        tree: &mut Map<String, Value>,
        template: &Descriptor<Self::Template>,
        _extra: &Self::Extra,
        projector: &Projector<'_>,
    ) -> FeatureResult<()> {
        if !tree.contains_key(Self::TEMPLATE_FIELD) {
            tree.insert(
                Self::TEMPLATE_FIELD.to_string(),
                template.resolved(projector)?,
            );
        }
        Ok(())
    }
}

/// Deletes a released document; an already missing document is fine.
pub(crate) fn delete_released(link: &DocumentLink) -> FeatureResult<()> {
    match link.delete() {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::SessionOptions;
    use crate::repo::{DocumentStore, SqliteDocumentStore};
    use crate::sync::SceneSession;
    use std::sync::Arc;

    pub(crate) fn store() -> Arc<dyn DocumentStore> {
        SqliteDocumentStore::open_in_memory()
            .expect("in-memory store")
            .into_shared()
    }

    pub(crate) fn session() -> Arc<SceneSession> {
        let session = SceneSession::create(store(), "Scene", SessionOptions::default())
            .expect("scene session");
        Arc::new(session)
    }
}
