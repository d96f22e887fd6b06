//! Scene synchronization primitives.
//!
//! # Responsibility
//! - Own the scene document link shared by every feature of a project.
//! - Keep scene collections consistent with local feature state by
//!   `UniqueId`, writing the scene only when something changed.
//!
//! # Invariants
//! - Scene mutations are fetch, mutate, set cycles run under the session
//!   write lock when `serialize_scene_writes` is enabled.
//! - No scene collection ever holds two entries with the same `UniqueId`.

use crate::model::{SceneCollection, UniqueId};
use crate::repo::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod diff;
mod reconciler;
mod session;

pub use diff::differs;
pub use reconciler::{position_of, remove_entry, upsert_entry, Reconciliation, SceneReconciler};
pub use session::{SceneSession, SceneWrite};

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug)]
pub enum SyncError {
    Store(StoreError),
    /// Local identity has no matching entry in the scene.
    IdentityMismatch {
        collection: SceneCollection,
        unique_id: UniqueId,
    },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::IdentityMismatch {
                collection,
                unique_id,
            } => write!(
                f,
                "no entry with UniqueId {unique_id} in scene {collection}"
            ),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::IdentityMismatch { .. } => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
