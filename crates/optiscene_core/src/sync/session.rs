//! Scene session shared by all features of one project.

use crate::config::SessionOptions;
use crate::model::{decode, encode, DocumentKey, SceneDocument};
use crate::projection::Projector;
use crate::repo::{DocumentLink, DocumentStore, StoreError, StoreResult};
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};

/// Whether a scene mutation must be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneWrite {
    Required,
    Skip,
}

pub struct SceneSession {
    store: Arc<dyn DocumentStore>,
    scene: DocumentLink,
    write_lock: Mutex<()>,
    options: SessionOptions,
}

impl SceneSession {
    /// Creates an empty scene document and a session over it.
    pub fn create(
        store: Arc<dyn DocumentStore>,
        name: &str,
        options: SessionOptions,
    ) -> StoreResult<Self> {
        let scene = DocumentLink::create_from(Arc::clone(&store), &SceneDocument::new(name))?;
        info!(
            "event=scene_create module=sync status=ok key={} name={name}",
            scene.key()
        );
        Ok(Self::from_link(store, scene, options))
    }

    /// Attaches to an existing scene document.
    pub fn attach(store: Arc<dyn DocumentStore>, key: DocumentKey, options: SessionOptions) -> Self {
        let scene = DocumentLink::attach(Arc::clone(&store), key);
        Self::from_link(store, scene, options)
    }

    fn from_link(store: Arc<dyn DocumentStore>, scene: DocumentLink, options: SessionOptions) -> Self {
        Self {
            store,
            scene,
            write_lock: Mutex::new(()),
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn scene_link(&self) -> &DocumentLink {
        &self.scene
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn projector(&self) -> Projector<'_> {
        Projector::new(self.store.as_ref(), &self.options.projection)
    }

    pub fn read_scene(&self) -> StoreResult<SceneDocument> {
        Ok(decode(self.scene.get()?)?)
    }

    /// Runs one fetch, mutate, set cycle on the scene.
    ///
    /// The scene is written only when `mutate` returns `SceneWrite::Required`.
    /// An error from `mutate` leaves the stored scene untouched.
    pub fn modify_scene<R, E>(
        &self,
        mutate: impl FnOnce(&mut SceneDocument) -> Result<(R, SceneWrite), E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let _guard = self
            .options
            .serialize_scene_writes
            .then(|| self.write_lock.lock().unwrap_or_else(PoisonError::into_inner));

        let mut scene = self.read_scene()?;
        let (result, write) = mutate(&mut scene)?;
        match write {
            SceneWrite::Required => {
                self.scene.set(&encode(&scene).map_err(StoreError::from)?)?;
                debug!(
                    "event=scene_write module=sync status=ok key={}",
                    self.scene.key()
                );
            }
            SceneWrite::Skip => {
                debug!(
                    "event=scene_write module=sync status=skipped key={}",
                    self.scene.key()
                );
            }
        }
        Ok(result)
    }
}
