//! Optical property templates and the material scene entry.

use super::document::DocumentKind;
use super::geometry::GeoPaths;
use super::metadata::InstanceMetadata;
use super::validation::{
    ensure_non_negative, ensure_not_empty, ensure_positive, ensure_range, ValidationError,
};
use super::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Surface optical property template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: SopKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SopKind {
    /// Reflectance in percent.
    Mirror { reflectance: f64 },
    OpticalPolished {},
    Library { sop_file_uri: String },
}

impl SopKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mirror { .. } => "mirror",
            Self::OpticalPolished {} => "optical_polished",
            Self::Library { .. } => "library",
        }
    }
}

impl Default for SopKind {
    fn default() -> Self {
        Self::Mirror { reflectance: 100.0 }
    }
}

impl SopTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            kind: SopKind::default(),
        }
    }
}

impl Document for SopTemplate {
    const KIND: DocumentKind = DocumentKind::SopTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match &self.kind {
            SopKind::Mirror { reflectance } => ensure_range("reflectance", *reflectance, 0.0, 100.0),
            SopKind::OpticalPolished {} => Ok(()),
            SopKind::Library { sop_file_uri } => ensure_not_empty("sop_file_uri", sop_file_uri),
        }
    }
}

/// Volume optical property template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VopTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: VopKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VopKind {
    Opaque {},
    Optic {
        index: f64,
        absorption: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constringence: Option<f64>,
    },
    Library { material_file_uri: String },
}

impl VopKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Opaque {} => "opaque",
            Self::Optic { .. } => "optic",
            Self::Library { .. } => "library",
        }
    }

    pub fn optic() -> Self {
        Self::Optic {
            index: 1.5,
            absorption: 0.0,
            constringence: None,
        }
    }
}

impl VopTemplate {
    pub fn new(name: impl Into<String>, kind: VopKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            kind,
        }
    }
}

impl Document for VopTemplate {
    const KIND: DocumentKind = DocumentKind::VopTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match &self.kind {
            VopKind::Opaque {} => Ok(()),
            VopKind::Optic {
                index,
                absorption,
                constringence,
            } => {
                ensure_positive("index", *index)?;
                ensure_non_negative("absorption", *absorption)?;
                match constringence {
                    Some(value) => ensure_positive("constringence", *value),
                    None => Ok(()),
                }
            }
            VopKind::Library { material_file_uri } => {
                ensure_not_empty("material_file_uri", material_file_uri)
            }
        }
    }
}

/// Material entry of a scene: surface and volume properties applied to
/// a geometry selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialInstance {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: InstanceMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vop_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sop_guids: Vec<String>,
    /// `None` leaves the material unapplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometries: Option<GeoPaths>,
}

impl MaterialInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: InstanceMetadata::default(),
            vop_guid: None,
            sop_guids: Vec::new(),
            geometries: None,
        }
    }
}
