//! Scene aggregate and the typed collections it holds.
//!
//! # Invariants
//! - Within one collection no two entries share a `UniqueId`.
//! - Only the root part reference lives on the scene itself.

use super::document::DocumentKind;
use super::material::MaterialInstance;
use super::metadata::{InstanceMetadata, UniqueId};
use super::sensor::SensorInstance;
use super::simulation::SimulationInstance;
use super::source::SourceInstance;
use super::validation::ValidationError;
use super::Document;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_guid: Option<String>,
    #[serde(default)]
    pub materials: Vec<MaterialInstance>,
    #[serde(default)]
    pub sensors: Vec<SensorInstance>,
    #[serde(default)]
    pub sources: Vec<SourceInstance>,
    #[serde(default)]
    pub simulations: Vec<SimulationInstance>,
}

impl SceneDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            part_guid: None,
            materials: Vec::new(),
            sensors: Vec::new(),
            sources: Vec::new(),
            simulations: Vec::new(),
        }
    }

    /// Stamps a fresh identity on every entry lacking one.
    /// Returns the number of entries stamped.
    pub(crate) fn stamp_missing_identities(&mut self) -> usize {
        stamp_collection(&mut self.materials)
            + stamp_collection(&mut self.sensors)
            + stamp_collection(&mut self.sources)
            + stamp_collection(&mut self.simulations)
    }
}

fn stamp_collection<I: SceneEntry>(entries: &mut [I]) -> usize {
    let mut stamped = 0;
    for entry in entries.iter_mut() {
        if entry.unique_id().is_none() {
            entry.metadata_mut().set_unique_id(Some(UniqueId::generate()));
            stamped += 1;
        }
    }
    stamped
}

fn ensure_unique_ids<I: SceneEntry>(entries: &[I]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in entries.iter().filter_map(SceneEntry::unique_id) {
        if !seen.insert(id) {
            return Err(ValidationError::Malformed(format!(
                "duplicate UniqueId `{id}` in `{}`",
                I::COLLECTION
            )));
        }
    }
    Ok(())
}

impl Document for SceneDocument {
    const KIND: DocumentKind = DocumentKind::Scene;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ensure_unique_ids(&self.materials)?;
        ensure_unique_ids(&self.sensors)?;
        ensure_unique_ids(&self.sources)?;
        ensure_unique_ids(&self.simulations)?;
        self.sensors.iter().try_for_each(SensorInstance::validate)?;
        self.sources.iter().try_for_each(SourceInstance::validate)
    }
}

/// Typed collection of scene entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneCollection {
    Materials,
    Sensors,
    Sources,
    Simulations,
}

impl SceneCollection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Sensors => "sensors",
            Self::Sources => "sources",
            Self::Simulations => "simulations",
        }
    }
}

impl Display for SceneCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a scene collection.
pub trait SceneEntry:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + 'static
{
    const COLLECTION: SceneCollection;

    fn collection(scene: &SceneDocument) -> &Vec<Self>;
    fn collection_mut(scene: &mut SceneDocument) -> &mut Vec<Self>;
    fn name(&self) -> &str;
    fn metadata(&self) -> &InstanceMetadata;
    fn metadata_mut(&mut self) -> &mut InstanceMetadata;

    fn unique_id(&self) -> Option<&UniqueId> {
        self.metadata().unique_id()
    }
}

macro_rules! scene_entry {
    ($instance:ty, $collection:ident, $field:ident) => {
        impl SceneEntry for $instance {
            const COLLECTION: SceneCollection = SceneCollection::$collection;

            fn collection(scene: &SceneDocument) -> &Vec<Self> {
                &scene.$field
            }

            fn collection_mut(scene: &mut SceneDocument) -> &mut Vec<Self> {
                &mut scene.$field
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn metadata(&self) -> &InstanceMetadata {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut InstanceMetadata {
                &mut self.metadata
            }
        }
    };
}

scene_entry!(MaterialInstance, Materials, materials);
scene_entry!(SensorInstance, Sensors, sensors);
scene_entry!(SourceInstance, Sources, sources);
scene_entry!(SimulationInstance, Simulations, simulations);

#[cfg(test)]
mod tests {
    use super::{SceneDocument, SceneEntry};
    use crate::model::material::MaterialInstance;
    use crate::model::{Document, ValidationError};

    #[test]
    fn stamping_only_touches_entries_without_identity() {
        let mut scene = SceneDocument::new("Scene");
        scene.materials.push(MaterialInstance::new("Mirror"));
        scene.materials.push(MaterialInstance::new("Glass"));
        assert_eq!(scene.stamp_missing_identities(), 2);
        let first = scene.materials[0].unique_id().cloned();
        assert_eq!(scene.stamp_missing_identities(), 0);
        assert_eq!(scene.materials[0].unique_id().cloned(), first);
    }

    #[test]
    fn duplicate_identities_are_rejected() {
        let mut scene = SceneDocument::new("Scene");
        scene.materials.push(MaterialInstance::new("Mirror"));
        scene.stamp_missing_identities();
        let duplicate = scene.materials[0].clone();
        scene.materials.push(duplicate);
        assert!(matches!(
            scene.validate(),
            Err(ValidationError::Malformed(_))
        ));
    }
}
