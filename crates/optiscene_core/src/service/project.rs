//! Project aggregate: one scene plus every feature created on it or
//! discovered in it.
//!
//! # Responsibility
//! - Own the scene session and the shared feature handles.
//! - Seed features from an existing scene, stamping missing identities once.
//! - Answer `find` queries by name, kind and geometry level.
//!
//! # Invariants
//! - Only the root part handed out by `create_root_part` (or loaded from
//!   `part_guid`) mutates the scene's part reference.
//! - `find` orders hits by kind, then scene position (uncommitted features
//!   follow in creation order), then geometry depth.

use crate::config::SessionOptions;
use crate::feature::{
    Feature, FeatureError, FeatureKind, GeometryLevel, GeometryNode, Intensity, Material, Part,
    Sensor, Simulation, Source, Spectrum,
};
use crate::model::intensity::IntensityTemplate;
use crate::model::spectrum::SpectrumTemplate;
use crate::model::{to_pretty_string, DocumentKey, GeoRef, SceneDocument, SceneEntry};
use crate::projection::Projector;
use crate::repo::{DocumentStore, StoreError, StoreResult};
use crate::sync::{position_of, SceneSession, SceneWrite};
use log::{debug, info};
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Scene field that holds the root geometry reference.
const PART_REFERENCE: &str = "part_guid";

/// Feature handle shared between the project and its callers.
pub type Shared<T> = Arc<Mutex<T>>;

fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Locks a shared handle, recovering from poisoning.
pub fn lock<T>(handle: &Shared<T>) -> MutexGuard<'_, T> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(Debug)]
pub enum ProjectError {
    /// `find` received a pattern that is not a valid regular expression.
    InvalidPattern(regex::Error),
    Feature(FeatureError),
    Store(StoreError),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern(err) => write!(f, "invalid name pattern: {err}"),
            Self::Feature(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPattern(err) => Some(err),
            Self::Feature(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<regex::Error> for ProjectError {
    fn from(value: regex::Error) -> Self {
        Self::InvalidPattern(value)
    }
}

impl From<FeatureError> for ProjectError {
    fn from(value: FeatureError) -> Self {
        Self::Feature(value)
    }
}

impl From<StoreError> for ProjectError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Kind filter accepted by `Project::find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Material,
    Sensor,
    Source,
    Simulation,
    Part,
    SubPart,
    Body,
    Face,
}

impl FeatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Sensor => "sensor",
            Self::Source => "source",
            Self::Simulation => "simulation",
            Self::Part => "part",
            Self::SubPart => "sub_part",
            Self::Body => "body",
            Self::Face => "face",
        }
    }
}

impl From<GeometryLevel> for FeatureType {
    fn from(value: GeometryLevel) -> Self {
        match value {
            GeometryLevel::Part => Self::Part,
            GeometryLevel::SubPart => Self::SubPart,
            GeometryLevel::Body => Self::Body,
            GeometryLevel::Face => Self::Face,
        }
    }
}

/// One `find` hit.
#[derive(Clone)]
pub enum FeatureRef {
    Material(Shared<Material>),
    Sensor(Shared<Sensor>),
    Source(Shared<Source>),
    Simulation(Shared<Simulation>),
    /// Node of the root part; `path` is empty for the part itself.
    Geometry {
        part: Shared<Part>,
        level: GeometryLevel,
        path: GeoRef,
    },
}

impl FeatureRef {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            Self::Material(_) => FeatureType::Material,
            Self::Sensor(_) => FeatureType::Sensor,
            Self::Source(_) => FeatureType::Source,
            Self::Simulation(_) => FeatureType::Simulation,
            Self::Geometry { level, .. } => (*level).into(),
        }
    }

    /// Locks the underlying handle to read its name.
    pub fn name(&self) -> String {
        match self {
            Self::Material(material) => lock(material).name().to_string(),
            Self::Sensor(sensor) => lock(sensor).name().to_string(),
            Self::Source(source) => lock(source).name().to_string(),
            Self::Simulation(simulation) => lock(simulation).name().to_string(),
            Self::Geometry { part, path, .. } if path.depth() == 0 => {
                lock(part).name().to_string()
            }
            Self::Geometry { path, .. } => path.name().to_string(),
        }
    }
}

impl Debug for FeatureRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geometry { level, path, .. } => f
                .debug_struct("Geometry")
                .field("level", level)
                .field("path", path)
                .finish(),
            other => f
                .debug_tuple(other.feature_type().as_str())
                .field(&other.name())
                .finish(),
        }
    }
}

enum NameMatcher {
    Exact(String),
    /// Anchored: the pattern must match the whole name.
    Pattern(Regex),
}

impl NameMatcher {
    fn new(name: &str, name_regex: bool) -> ProjectResult<Self> {
        if name_regex {
            Ok(Self::Pattern(Regex::new(&format!("^(?:{name})$"))?))
        } else {
            Ok(Self::Exact(name.to_string()))
        }
    }

    fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == name,
            Self::Pattern(pattern) => pattern.is_match(name),
        }
    }
}

pub struct Project {
    session: Arc<SceneSession>,
    materials: Vec<Shared<Material>>,
    sensors: Vec<Shared<Sensor>>,
    sources: Vec<Shared<Source>>,
    simulations: Vec<Shared<Simulation>>,
    root_part: Option<Shared<Part>>,
}

impl Project {
    /// Creates a project over a fresh, empty scene.
    pub fn new(store: Arc<dyn DocumentStore>, name: &str) -> ProjectResult<Self> {
        Self::with_options(store, name, SessionOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn DocumentStore>,
        name: &str,
        options: SessionOptions,
    ) -> ProjectResult<Self> {
        let session = SceneSession::create(store, name, options)?;
        Ok(Self::empty(Arc::new(session)))
    }

    /// Opens the scene stored under `key` and seeds one feature per entry.
    pub fn open(store: Arc<dyn DocumentStore>, key: DocumentKey) -> ProjectResult<Self> {
        Self::open_with_options(store, key, SessionOptions::default())
    }

    pub fn open_with_options(
        store: Arc<dyn DocumentStore>,
        key: DocumentKey,
        options: SessionOptions,
    ) -> ProjectResult<Self> {
        let session = Arc::new(SceneSession::attach(store, key, options));
        let (scene, stamped) = session.modify_scene(|scene| {
            let stamped = scene.stamp_missing_identities();
            let write = if stamped > 0 {
                SceneWrite::Required
            } else {
                SceneWrite::Skip
            };
            Ok::<_, StoreError>(((scene.clone(), stamped), write))
        })?;

        let mut project = Self::empty(Arc::clone(&session));
        let SceneDocument {
            part_guid,
            materials,
            sensors,
            sources,
            simulations,
            ..
        } = scene;
        project.materials = load_features(&session, materials)?;
        project.sensors = load_features(&session, sensors)?;
        project.sources = load_features(&session, sources)?;
        project.simulations = load_features(&session, simulations)?;
        if let Some(part_key) = part_guid {
            project.root_part = Some(shared(Part::load(Arc::clone(&session), &part_key)?));
        }

        info!(
            "event=project_open module=service status=ok key={} materials={} sensors={} sources={} simulations={} part={} stamped={stamped}",
            session.scene_link().key(),
            project.materials.len(),
            project.sensors.len(),
            project.sources.len(),
            project.simulations.len(),
            project.root_part.is_some()
        );
        Ok(project)
    }

    fn empty(session: Arc<SceneSession>) -> Self {
        Self {
            session,
            materials: Vec::new(),
            sensors: Vec::new(),
            sources: Vec::new(),
            simulations: Vec::new(),
            root_part: None,
        }
    }

    pub fn session(&self) -> &Arc<SceneSession> {
        &self.session
    }

    pub fn scene_key(&self) -> &DocumentKey {
        self.session.scene_link().key()
    }

    pub fn materials(&self) -> &[Shared<Material>] {
        &self.materials
    }

    pub fn sensors(&self) -> &[Shared<Sensor>] {
        &self.sensors
    }

    pub fn sources(&self) -> &[Shared<Source>] {
        &self.sources
    }

    pub fn simulations(&self) -> &[Shared<Simulation>] {
        &self.simulations
    }

    pub fn root_part(&self) -> Option<&Shared<Part>> {
        self.root_part.as_ref()
    }

    pub fn create_material(
        &mut self,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Shared<Material> {
        let material = shared(Material::new(
            Arc::clone(&self.session),
            name,
            description,
            metadata,
        ));
        self.materials.push(Arc::clone(&material));
        material
    }

    pub fn create_sensor(
        &mut self,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Shared<Sensor> {
        let sensor = shared(Sensor::new(
            Arc::clone(&self.session),
            name,
            description,
            metadata,
        ));
        self.sensors.push(Arc::clone(&sensor));
        sensor
    }

    pub fn create_source(
        &mut self,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Shared<Source> {
        let source = shared(Source::new(
            Arc::clone(&self.session),
            name,
            description,
            metadata,
        ));
        self.sources.push(Arc::clone(&source));
        source
    }

    pub fn create_simulation(
        &mut self,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Shared<Simulation> {
        let simulation = shared(Simulation::new(
            Arc::clone(&self.session),
            name,
            description,
            metadata,
        ));
        self.simulations.push(Arc::clone(&simulation));
        simulation
    }

    /// Replaces the project's root part. The scene follows on the next
    /// `Part::commit`.
    pub fn create_root_part(
        &mut self,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Shared<Part> {
        let part = shared(Part::new(
            Arc::clone(&self.session),
            name,
            description,
            metadata,
        ));
        self.root_part = Some(Arc::clone(&part));
        part
    }

    /// Standalone spectrum, not referenced by the scene.
    pub fn create_spectrum(&self, name: &str, description: &str) -> Spectrum {
        let mut template = SpectrumTemplate::new(name);
        template.description = description.to_string();
        Spectrum::new(Arc::clone(self.session.store()), template)
    }

    /// Standalone intensity distribution, not referenced by the scene.
    pub fn create_intensity(&self, name: &str, description: &str) -> Intensity {
        let mut template = IntensityTemplate::new(name);
        template.description = description.to_string();
        Intensity::new(Arc::clone(self.session.store()), template)
    }

    /// Features whose name equals `name`, or fully matches it when
    /// `name_regex` is set, optionally restricted to one `feature_type`.
    ///
    /// Locks each handle briefly; callers must not hold a feature lock.
    pub fn find(
        &self,
        name: &str,
        name_regex: bool,
        feature_type: Option<FeatureType>,
    ) -> ProjectResult<Vec<FeatureRef>> {
        let matcher = NameMatcher::new(name, name_regex)?;
        let wanted = |kind: FeatureType| feature_type.map_or(true, |filter| filter == kind);
        let scene = self.session.read_scene()?;

        let mut hits = Vec::new();
        if wanted(FeatureType::Material) {
            hits.extend(
                ordered(&self.materials, &scene, &matcher)
                    .into_iter()
                    .map(FeatureRef::Material),
            );
        }
        if wanted(FeatureType::Sensor) {
            hits.extend(
                ordered(&self.sensors, &scene, &matcher)
                    .into_iter()
                    .map(FeatureRef::Sensor),
            );
        }
        if wanted(FeatureType::Source) {
            hits.extend(
                ordered(&self.sources, &scene, &matcher)
                    .into_iter()
                    .map(FeatureRef::Source),
            );
        }
        if wanted(FeatureType::Simulation) {
            hits.extend(
                ordered(&self.simulations, &scene, &matcher)
                    .into_iter()
                    .map(FeatureRef::Simulation),
            );
        }
        if let Some(part) = &self.root_part {
            let mut nodes = lock(part)
                .walk()
                .into_iter()
                .filter(|node| wanted(node.level.into()) && matcher.is_match(&node.name))
                .collect::<Vec<_>>();
            nodes.sort_by_key(GeometryNode::depth);
            hits.extend(nodes.into_iter().map(|node| FeatureRef::Geometry {
                part: Arc::clone(part),
                level: node.level,
                path: node.path,
            }));
        }

        debug!(
            "event=project_find module=service status=ok name={name} regex={name_regex} type={} hits={}",
            feature_type.map_or("any", FeatureType::as_str),
            hits.len()
        );
        Ok(hits)
    }

    /// Scene with references resolved; geometry is left as its key.
    pub fn describe(&self) -> StoreResult<String> {
        let options = self
            .session
            .options()
            .projection
            .clone()
            .ignoring(PART_REFERENCE);
        let projector = Projector::new(self.session.store().as_ref(), &options);
        let tree = projector.project(self.session.scene_link().get()?)?;
        Ok(to_pretty_string(&tree))
    }
}

impl Display for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.describe() {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "<project {}: {err}>", self.scene_key()),
        }
    }
}

fn load_features<K: FeatureKind>(
    session: &Arc<SceneSession>,
    entries: Vec<K::Instance>,
) -> Result<Vec<Shared<Feature<K>>>, FeatureError> {
    entries
        .into_iter()
        .map(|entry| Feature::<K>::load(Arc::clone(session), entry).map(shared))
        .collect()
}

/// Matching features, committed ones first by scene position, then the
/// rest in creation order.
fn ordered<K: FeatureKind>(
    features: &[Shared<Feature<K>>],
    scene: &SceneDocument,
    matcher: &NameMatcher,
) -> Vec<Shared<Feature<K>>> {
    let entries = <K::Instance as SceneEntry>::collection(scene);
    let mut ranked = features
        .iter()
        .enumerate()
        .filter_map(|(created, handle)| {
            let feature = lock(handle);
            if !matcher.is_match(feature.name()) {
                return None;
            }
            let rank = feature
                .unique_id()
                .and_then(|unique_id| position_of(entries, unique_id))
                .map_or((1, created), |position| (0, position));
            Some((rank, Arc::clone(handle)))
        })
        .collect::<Vec<_>>();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, handle)| handle).collect()
}
