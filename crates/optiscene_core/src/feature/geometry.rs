//! Geometry hierarchy: root part, sub-parts, bodies and faces.
//!
//! # Invariants
//! - Commit is bottom-up: children are stored before the parent lists
//!   their keys.
//! - Only the root part touches the scene's `part_guid`.

use super::{Descriptor, FeatureResult, TemplateWrite};
use crate::model::part::{BodyDocument, FaceDocument, PartDocument, PartInstance};
use crate::model::{DocumentKey, GeoRef};
use crate::repo::{DocumentStore, StoreError, StoreResult};
use crate::sync::{differs, SceneSession, SceneWrite};
use log::info;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Level of a node in the geometry hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryLevel {
    Part,
    SubPart,
    Body,
    Face,
}

impl GeometryLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Part => "part",
            Self::SubPart => "sub_part",
            Self::Body => "body",
            Self::Face => "face",
        }
    }
}

/// One node met by `Part::walk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryNode {
    pub level: GeometryLevel,
    pub name: String,
    /// Path below the root part; empty for the root itself.
    pub path: GeoRef,
}

impl GeometryNode {
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

fn key_string(key: Option<&DocumentKey>) -> Option<String> {
    key.map(DocumentKey::to_string)
}

pub struct Face {
    descriptor: Descriptor<FaceDocument>,
}

impl Face {
    fn new(store: &Arc<dyn DocumentStore>, name: &str, description: &str) -> Self {
        let mut document = FaceDocument::new(name);
        document.description = description.to_string();
        Self {
            descriptor: Descriptor::new(Arc::clone(store), document),
        }
    }

    fn load(store: &Arc<dyn DocumentStore>, key: &str) -> StoreResult<Self> {
        Ok(Self {
            descriptor: Descriptor::load(Arc::clone(store), DocumentKey::from_raw(key))?,
        })
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Descriptor<FaceDocument> {
        &self.descriptor
    }

    pub fn set_vertices(&mut self, vertices: Vec<f64>) -> &mut Self {
        self.descriptor.value_mut().vertices = vertices;
        self
    }

    pub fn set_facets(&mut self, facets: Vec<u32>) -> &mut Self {
        self.descriptor.value_mut().facets = facets;
        self
    }

    pub fn set_normals(&mut self, normals: Vec<f64>) -> &mut Self {
        self.descriptor.value_mut().normals = normals;
        self
    }

    fn commit(&mut self) -> StoreResult<TemplateWrite> {
        self.descriptor.commit()
    }
}

pub struct Body {
    store: Arc<dyn DocumentStore>,
    descriptor: Descriptor<BodyDocument>,
    faces: Vec<Face>,
}

impl Body {
    fn new(
        store: &Arc<dyn DocumentStore>,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        let mut document = BodyDocument::new(name);
        document.description = description.to_string();
        document.metadata = metadata;
        Self {
            store: Arc::clone(store),
            descriptor: Descriptor::new(Arc::clone(store), document),
            faces: Vec::new(),
        }
    }

    fn load(store: &Arc<dyn DocumentStore>, key: &str) -> StoreResult<Self> {
        let descriptor: Descriptor<BodyDocument> =
            Descriptor::load(Arc::clone(store), DocumentKey::from_raw(key))?;
        let faces = descriptor
            .value()
            .face_guids
            .iter()
            .map(|face_key| Face::load(store, face_key))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self {
            store: Arc::clone(store),
            descriptor,
            faces,
        })
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Descriptor<BodyDocument> {
        &self.descriptor
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn create_face(&mut self, name: &str, description: &str) -> &mut Face {
        self.faces.push(Face::new(&self.store, name, description));
        let index = self.faces.len() - 1;
        &mut self.faces[index]
    }

    pub fn face_mut(&mut self, name: &str) -> Option<&mut Face> {
        self.faces.iter_mut().find(|face| face.name() == name)
    }

    fn commit(&mut self) -> StoreResult<TemplateWrite> {
        let mut face_guids = Vec::with_capacity(self.faces.len());
        for face in &mut self.faces {
            face.commit()?;
            face_guids.extend(key_string(face.descriptor.key()));
        }
        let mut document = self.descriptor.value().clone();
        document.face_guids = face_guids;
        self.descriptor.push(document)
    }

    fn reset(&mut self) -> StoreResult<()> {
        self.descriptor.reset()?;
        self.faces
            .iter_mut()
            .try_for_each(|face| face.descriptor.reset())
    }

    fn delete(&mut self) -> FeatureResult<()> {
        self.descriptor.delete()?;
        for face in &mut self.faces {
            face.descriptor.delete()?;
        }
        self.descriptor.value_mut().face_guids.clear();
        Ok(())
    }
}

/// Bodies and nested sub-parts of one part document.
struct PartContent {
    store: Arc<dyn DocumentStore>,
    descriptor: Descriptor<PartDocument>,
    bodies: Vec<Body>,
    sub_parts: Vec<SubPart>,
}

impl PartContent {
    fn new(store: &Arc<dyn DocumentStore>, document: PartDocument) -> Self {
        Self {
            store: Arc::clone(store),
            descriptor: Descriptor::new(Arc::clone(store), document),
            bodies: Vec::new(),
            sub_parts: Vec::new(),
        }
    }

    fn load(store: &Arc<dyn DocumentStore>, key: &str) -> StoreResult<Self> {
        let descriptor: Descriptor<PartDocument> =
            Descriptor::load(Arc::clone(store), DocumentKey::from_raw(key))?;
        let bodies = descriptor
            .value()
            .body_guids
            .iter()
            .map(|body_key| Body::load(store, body_key))
            .collect::<StoreResult<Vec<_>>>()?;
        let sub_parts = descriptor
            .value()
            .parts
            .iter()
            .map(|instance| SubPart::load(store, instance.clone()))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self {
            store: Arc::clone(store),
            descriptor,
            bodies,
            sub_parts,
        })
    }

    fn create_body(
        &mut self,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> &mut Body {
        self.bodies
            .push(Body::new(&self.store, name, description, metadata));
        let index = self.bodies.len() - 1;
        &mut self.bodies[index]
    }

    fn create_sub_part(&mut self, name: &str, description: &str) -> &mut SubPart {
        self.sub_parts
            .push(SubPart::new(&self.store, name, description));
        let index = self.sub_parts.len() - 1;
        &mut self.sub_parts[index]
    }

    fn commit(&mut self) -> StoreResult<TemplateWrite> {
        let mut body_guids = Vec::with_capacity(self.bodies.len());
        for body in &mut self.bodies {
            body.commit()?;
            body_guids.extend(key_string(body.descriptor.key()));
        }
        let mut parts = Vec::with_capacity(self.sub_parts.len());
        for sub_part in &mut self.sub_parts {
            sub_part.content.commit()?;
            sub_part.instance.part_guid = key_string(sub_part.content.descriptor.key());
            parts.push(sub_part.instance.clone());
        }

        let mut document = self.descriptor.value().clone();
        document.body_guids = body_guids;
        document.parts = parts;
        self.descriptor.push(document)
    }

    fn reset(&mut self) -> StoreResult<()> {
        self.descriptor.reset()?;
        self.bodies.iter_mut().try_for_each(Body::reset)?;
        self.sub_parts
            .iter_mut()
            .try_for_each(|sub_part| sub_part.content.reset())
    }

    fn delete(&mut self) -> FeatureResult<()> {
        self.descriptor.delete()?;
        for body in &mut self.bodies {
            body.delete()?;
        }
        for sub_part in &mut self.sub_parts {
            sub_part.content.delete()?;
            sub_part.instance.part_guid = None;
        }
        let document = self.descriptor.value_mut();
        document.body_guids.clear();
        document.parts.iter_mut().for_each(|part| part.part_guid = None);
        Ok(())
    }

    fn walk(&self, path: &GeoRef, nodes: &mut Vec<GeometryNode>) {
        for body in &self.bodies {
            let body_path = path.child(body.name());
            for face in &body.faces {
                nodes.push(GeometryNode {
                    level: GeometryLevel::Face,
                    name: face.name().to_string(),
                    path: body_path.child(face.name()),
                });
            }
            nodes.push(GeometryNode {
                level: GeometryLevel::Body,
                name: body.name().to_string(),
                path: body_path,
            });
        }
        for sub_part in &self.sub_parts {
            let sub_path = path.child(&sub_part.instance.name);
            sub_part.content.walk(&sub_path, nodes);
            nodes.push(GeometryNode {
                level: GeometryLevel::SubPart,
                name: sub_part.instance.name.clone(),
                path: sub_path,
            });
        }
    }

    /// Follows `segments` through sub-parts, then at most one body and one face.
    fn locate<'c>(&'c self, segments: &[&str]) -> Option<Located<'c>> {
        let (first, rest) = segments.split_first()?;
        if let Some(sub_part) = self
            .sub_parts
            .iter()
            .find(|sub_part| sub_part.instance.name == *first)
        {
            return if rest.is_empty() {
                Some(Located::SubPart(sub_part))
            } else {
                sub_part.content.locate(rest)
            };
        }
        let body = self.bodies.iter().find(|body| body.name() == *first)?;
        match rest {
            [] => Some(Located::Body(body)),
            [face] => body
                .faces
                .iter()
                .find(|candidate| candidate.name() == *face)
                .map(Located::Face),
            _ => None,
        }
    }
}

enum Located<'c> {
    SubPart(&'c SubPart),
    Body(&'c Body),
    Face(&'c Face),
}

/// Part placed inside another part.
pub struct SubPart {
    instance: PartInstance,
    content: PartContent,
}

impl SubPart {
    fn new(store: &Arc<dyn DocumentStore>, name: &str, description: &str) -> Self {
        let mut instance = PartInstance::new(name);
        instance.description = description.to_string();
        let mut document = PartDocument::new(name);
        document.description = description.to_string();
        Self {
            instance,
            content: PartContent::new(store, document),
        }
    }

    fn load(store: &Arc<dyn DocumentStore>, instance: PartInstance) -> StoreResult<Self> {
        let content = match &instance.part_guid {
            Some(key) => PartContent::load(store, key)?,
            None => PartContent::new(store, PartDocument::new(instance.name.as_str())),
        };
        Ok(Self { instance, content })
    }

    pub fn name(&self) -> &str {
        &self.instance.name
    }

    pub fn instance(&self) -> &PartInstance {
        &self.instance
    }

    pub fn descriptor(&self) -> &Descriptor<PartDocument> {
        &self.content.descriptor
    }

    pub fn set_axis_system(&mut self, axis_system: Vec<f64>) -> &mut Self {
        self.instance.axis_system = axis_system;
        self
    }

    pub fn bodies(&self) -> &[Body] {
        &self.content.bodies
    }

    pub fn sub_parts(&self) -> &[SubPart] {
        &self.content.sub_parts
    }

    pub fn create_body(&mut self, name: &str, description: &str) -> &mut Body {
        self.content.create_body(name, description, BTreeMap::new())
    }

    pub fn create_sub_part(&mut self, name: &str, description: &str) -> &mut SubPart {
        self.content.create_sub_part(name, description)
    }
}

/// Root geometry of a scene.
pub struct Part {
    session: Arc<SceneSession>,
    content: PartContent,
}

impl Part {
    pub(crate) fn new(
        session: Arc<SceneSession>,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        let mut document = PartDocument::new(name);
        document.description = description.to_string();
        document.metadata = metadata;
        let content = PartContent::new(session.store(), document);
        Self { session, content }
    }

    /// Loads the whole hierarchy below the part stored under `key`.
    pub(crate) fn load(session: Arc<SceneSession>, key: &str) -> StoreResult<Self> {
        let content = PartContent::load(session.store(), key)?;
        Ok(Self { session, content })
    }

    pub fn name(&self) -> &str {
        self.content.descriptor.name()
    }

    pub fn descriptor(&self) -> &Descriptor<PartDocument> {
        &self.content.descriptor
    }

    pub fn key(&self) -> Option<&DocumentKey> {
        self.content.descriptor.key()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.content.bodies
    }

    pub fn sub_parts(&self) -> &[SubPart] {
        &self.content.sub_parts
    }

    pub fn create_body(
        &mut self,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> &mut Body {
        self.content.create_body(name, description, metadata)
    }

    pub fn create_sub_part(&mut self, name: &str, description: &str) -> &mut SubPart {
        self.content.create_sub_part(name, description)
    }

    /// Stores the hierarchy bottom-up, then points the scene at this part.
    pub fn commit(&mut self) -> FeatureResult<()> {
        let write = self.content.commit()?;
        let key = key_string(self.key());
        let scene_write = self.session.modify_scene(|scene| {
            if differs(&scene.part_guid, &key) {
                scene.part_guid = key.clone();
                Ok::<_, StoreError>((true, SceneWrite::Required))
            } else {
                Ok((false, SceneWrite::Skip))
            }
        })?;
        info!(
            "event=part_commit module=feature status=ok name={} write={} scene_write={scene_write}",
            self.name(),
            write.as_str()
        );
        Ok(())
    }

    /// Pulls stored values for every committed node.
    pub fn reset(&mut self) -> FeatureResult<()> {
        self.content.reset()?;
        Ok(())
    }

    /// Deletes every stored node and detaches the scene from this part.
    /// Local values stay for a fresh commit.
    pub fn delete(&mut self) -> FeatureResult<()> {
        let key = key_string(self.key());
        self.content.delete()?;
        if key.is_some() {
            self.session.modify_scene(|scene| {
                if scene.part_guid == key {
                    scene.part_guid = None;
                    Ok::<_, StoreError>(((), SceneWrite::Required))
                } else {
                    Ok(((), SceneWrite::Skip))
                }
            })?;
        }
        info!(
            "event=part_delete module=feature status=ok name={}",
            self.name()
        );
        Ok(())
    }

    /// Every node below the root, children before their parent, then the
    /// root itself.
    pub fn walk(&self) -> Vec<GeometryNode> {
        let mut nodes = Vec::new();
        self.content.walk(&GeoRef::from_native_link(""), &mut nodes);
        nodes.push(GeometryNode {
            level: GeometryLevel::Part,
            name: self.name().to_string(),
            path: GeoRef::from_native_link(""),
        });
        nodes
    }

    pub fn level_of(&self, path: &GeoRef) -> Option<GeometryLevel> {
        let segments = path.segments().collect::<Vec<_>>();
        if segments.is_empty() {
            return Some(GeometryLevel::Part);
        }
        self.content.locate(&segments).map(|located| match located {
            Located::SubPart(_) => GeometryLevel::SubPart,
            Located::Body(_) => GeometryLevel::Body,
            Located::Face(_) => GeometryLevel::Face,
        })
    }

    pub fn body(&self, path: &GeoRef) -> Option<&Body> {
        match self.content.locate(&path.segments().collect::<Vec<_>>())? {
            Located::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn face(&self, path: &GeoRef) -> Option<&Face> {
        match self.content.locate(&path.segments().collect::<Vec<_>>())? {
            Located::Face(face) => Some(face),
            _ => None,
        }
    }

    pub fn sub_part(&self, path: &GeoRef) -> Option<&SubPart> {
        match self.content.locate(&path.segments().collect::<Vec<_>>())? {
            Located::SubPart(sub_part) => Some(sub_part),
            _ => None,
        }
    }

    pub fn describe(&self) -> StoreResult<String> {
        self.content.descriptor.describe()
    }
}

impl Display for Part {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.content.descriptor, f)
    }
}
