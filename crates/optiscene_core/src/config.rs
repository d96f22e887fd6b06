//! Runtime options for projections and scene sessions.

/// `_properties` blocks that are never hoisted into their container.
pub const DEFAULT_HOIST_DENYLIST: &[&str] = &["lxp_properties"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Reference fields left unresolved, e.g. `part_guid` to skip geometry.
    pub ignore_references: Vec<String>,
    pub hoist_denylist: Vec<String>,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            ignore_references: Vec::new(),
            hoist_denylist: DEFAULT_HOIST_DENYLIST
                .iter()
                .map(|key| (*key).to_string())
                .collect(),
        }
    }
}

impl ProjectionOptions {
    pub fn ignoring(mut self, reference: impl Into<String>) -> Self {
        self.ignore_references.push(reference.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Serializes scene read-modify-write cycles within this process.
    pub serialize_scene_writes: bool,
    pub projection: ProjectionOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            serialize_scene_writes: true,
            projection: ProjectionOptions::default(),
        }
    }
}
