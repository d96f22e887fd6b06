//! Geometry documents: part, body and tessellated face.
//!
//! # Invariants
//! - A part references bodies through `body_guids` and sub-parts through
//!   `parts[].part_guid`; the hierarchy is acyclic by construction.

use super::document::DocumentKind;
use super::geometry::default_axis_system;
use super::validation::{ensure_axis_system, ValidationError};
use super::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub body_guids: Vec<String>,
    #[serde(default)]
    pub parts: Vec<PartInstance>,
}

impl PartDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            body_guids: Vec::new(),
            parts: Vec::new(),
        }
    }
}

impl Document for PartDocument {
    const KIND: DocumentKind = DocumentKind::Part;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.parts
            .iter()
            .try_for_each(|part| ensure_axis_system("parts.axis_system", &part.axis_system))
    }
}

/// Placement of a sub-part inside its parent part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartInstance {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_guid: Option<String>,
    pub axis_system: Vec<f64>,
}

impl PartInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            part_guid: None,
            axis_system: default_axis_system(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub face_guids: Vec<String>,
}

impl BodyDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            face_guids: Vec::new(),
        }
    }
}

impl Document for BodyDocument {
    const KIND: DocumentKind = DocumentKind::Body;

    fn name(&self) -> &str {
        &self.name
    }
}

/// Triangle mesh: `vertices` and `normals` are flat xyz triples,
/// `facets` are vertex index triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub vertices: Vec<f64>,
    #[serde(default)]
    pub facets: Vec<u32>,
    #[serde(default)]
    pub normals: Vec<f64>,
}

impl FaceDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            vertices: Vec::new(),
            facets: Vec::new(),
            normals: Vec::new(),
        }
    }
}

impl Document for FaceDocument {
    const KIND: DocumentKind = DocumentKind::Face;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.vertices.len() % 3 != 0 {
            return Err(ValidationError::LengthMismatch {
                field: "vertices",
                expected: self.vertices.len() / 3 * 3,
                actual: self.vertices.len(),
            });
        }
        if self.normals.len() != self.vertices.len() {
            return Err(ValidationError::LengthMismatch {
                field: "normals",
                expected: self.vertices.len(),
                actual: self.normals.len(),
            });
        }
        if self.facets.len() % 3 != 0 {
            return Err(ValidationError::LengthMismatch {
                field: "facets",
                expected: self.facets.len() / 3 * 3,
                actual: self.facets.len(),
            });
        }
        let vertex_count = self.vertices.len() / 3;
        if let Some(index) = self
            .facets
            .iter()
            .find(|index| **index as usize >= vertex_count)
        {
            return Err(ValidationError::OutOfRange {
                field: "facets",
                value: f64::from(*index),
                min: 0.0,
                max: vertex_count.saturating_sub(1) as f64,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FaceDocument;
    use crate::model::{Document, ValidationError};

    #[test]
    fn face_rejects_dangling_facet_index() {
        let mut face = FaceDocument::new("Face.1");
        face.vertices = vec![0., 0., 0., 1., 0., 0., 0., 1., 0.];
        face.normals = vec![0., 0., 1., 0., 0., 1., 0., 0., 1.];
        face.facets = vec![0, 1, 3];
        assert!(matches!(
            face.validate(),
            Err(ValidationError::OutOfRange {
                field: "facets",
                ..
            })
        ));

        face.facets = vec![0, 1, 2];
        face.validate().expect("valid triangle");
    }
}
