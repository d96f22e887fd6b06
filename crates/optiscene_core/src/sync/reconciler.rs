//! Reconciliation of local instances with scene collections.

use super::session::{SceneSession, SceneWrite};
use super::{SyncError, SyncResult};
use crate::model::{SceneEntry, UniqueId};
use log::{debug, info};

/// What a reconcile did to the scene collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Appended,
    Replaced,
    Unchanged,
}

impl Reconciliation {
    pub fn wrote_scene(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Appended => "appended",
            Self::Replaced => "replaced",
            Self::Unchanged => "unchanged",
        }
    }
}

pub fn position_of<I: SceneEntry>(entries: &[I], unique_id: &UniqueId) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.unique_id() == Some(unique_id))
}

/// Replaces the entry sharing `instance`'s identity, or appends it.
pub fn upsert_entry<I: SceneEntry>(entries: &mut Vec<I>, instance: &I) -> Reconciliation {
    let position = instance
        .unique_id()
        .and_then(|unique_id| position_of(entries, unique_id));
    match position {
        Some(index) if entries[index] == *instance => Reconciliation::Unchanged,
        Some(index) => {
            entries[index] = instance.clone();
            Reconciliation::Replaced
        }
        None => {
            entries.push(instance.clone());
            Reconciliation::Appended
        }
    }
}

pub fn remove_entry<I: SceneEntry>(entries: &mut Vec<I>, unique_id: &UniqueId) -> Option<I> {
    position_of(entries, unique_id).map(|index| entries.remove(index))
}

/// Typed view over the scene collections of one session.
pub struct SceneReconciler<'s> {
    session: &'s SceneSession,
}

impl<'s> SceneReconciler<'s> {
    pub fn new(session: &'s SceneSession) -> Self {
        Self { session }
    }

    /// Upserts `instance` into its collection; writes only on change.
    pub fn reconcile<I: SceneEntry>(&self, instance: &I) -> SyncResult<Reconciliation> {
        let outcome = self.session.modify_scene(|scene| {
            let outcome = upsert_entry(I::collection_mut(scene), instance);
            let write = if outcome.wrote_scene() {
                SceneWrite::Required
            } else {
                SceneWrite::Skip
            };
            Ok::<_, SyncError>((outcome, write))
        })?;

        info!(
            "event=scene_reconcile module=sync status=ok collection={} name={} outcome={}",
            I::COLLECTION,
            instance.name(),
            outcome.as_str()
        );
        Ok(outcome)
    }

    /// Scene entry carrying `unique_id`, if any.
    pub fn lookup<I: SceneEntry>(&self, unique_id: &UniqueId) -> SyncResult<Option<I>> {
        let scene = self.session.read_scene()?;
        let entry = I::collection(&scene)
            .iter()
            .find(|entry| entry.unique_id() == Some(unique_id))
            .cloned();
        debug!(
            "event=scene_lookup module=sync status={} collection={} unique_id={unique_id}",
            if entry.is_some() { "hit" } else { "miss" },
            I::COLLECTION
        );
        Ok(entry)
    }

    /// Removes the entry carrying `unique_id` in one scene write.
    ///
    /// `release` runs after the entry is found and before the scene is
    /// written; an error from it aborts without touching the scene.
    /// A missing entry fails with `IdentityMismatch` before `release` runs.
    pub fn detach<I, E>(
        &self,
        unique_id: &UniqueId,
        release: impl FnOnce(&I) -> Result<(), E>,
    ) -> Result<I, E>
    where
        I: SceneEntry,
        E: From<SyncError> + From<crate::repo::StoreError>,
    {
        let removed = self.session.modify_scene(|scene| {
            let entries = I::collection_mut(scene);
            let Some(index) = position_of(entries, unique_id) else {
                return Err(E::from(SyncError::IdentityMismatch {
                    collection: I::COLLECTION,
                    unique_id: unique_id.clone(),
                }));
            };
            release(&entries[index])?;
            Ok((entries.remove(index), SceneWrite::Required))
        })?;

        info!(
            "event=scene_detach module=sync status=ok collection={} name={} unique_id={unique_id}",
            I::COLLECTION,
            removed.name()
        );
        Ok(removed)
    }
}
