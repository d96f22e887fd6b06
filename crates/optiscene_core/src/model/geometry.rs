//! Geometry paths and placement shared by scene entries.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Origin frame: origin, then x, y and z directions.
pub const ORIGIN_AXIS_SYSTEM: [f64; 12] = [0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 0., 1.];

pub fn default_axis_system() -> Vec<f64> {
    ORIGIN_AXIS_SYSTEM.to_vec()
}

pub(crate) fn default_axis_plane() -> Vec<f64> {
    ORIGIN_AXIS_SYSTEM[..9].to_vec()
}

/// Slash separated path to a geometry node below the root part,
/// e.g. `Body.1/Face.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeoRef {
    path: String,
}

impl GeoRef {
    pub fn from_native_link(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn to_native_link(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|segment| !segment.is_empty())
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    pub fn child(&self, name: &str) -> Self {
        if self.path.is_empty() {
            Self::from_native_link(name)
        } else {
            Self::from_native_link(format!("{}/{name}", self.path))
        }
    }
}

impl Display for GeoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Geometry selection. An empty list selects every geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPaths {
    #[serde(default)]
    pub geo_paths: Vec<String>,
}

impl GeoPaths {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_refs<'a>(refs: impl IntoIterator<Item = &'a GeoRef>) -> Self {
        Self {
            geo_paths: refs
                .into_iter()
                .map(|geo| geo.to_native_link().to_string())
                .collect(),
        }
    }

    pub fn refs(&self) -> Vec<GeoRef> {
        self.geo_paths
            .iter()
            .map(|path| GeoRef::from_native_link(path.as_str()))
            .collect()
    }
}

/// One face selection with orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedGeoPath {
    pub geo_path: String,
    #[serde(default)]
    pub reverse_normal: bool,
}

impl OrientedGeoPath {
    pub fn new(geo: &GeoRef, reverse_normal: bool) -> Self {
        Self {
            geo_path: geo.to_native_link().to_string(),
            reverse_normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoPaths, GeoRef};

    #[test]
    fn geo_ref_exposes_segments() {
        let face = GeoRef::from_native_link("Body.1").child("Face.1");
        assert_eq!(face.to_native_link(), "Body.1/Face.1");
        assert_eq!(face.name(), "Face.1");
        assert_eq!(face.depth(), 2);
    }

    #[test]
    fn geo_paths_keep_order() {
        let refs = [
            GeoRef::from_native_link("Body.2"),
            GeoRef::from_native_link("Body.1"),
        ];
        let paths = GeoPaths::from_refs(&refs);
        assert_eq!(paths.geo_paths, vec!["Body.2", "Body.1"]);
        assert_eq!(paths.refs(), refs);
    }
}
