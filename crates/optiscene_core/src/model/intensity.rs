//! Intensity distribution documents and their per-source properties.

use super::document::DocumentKind;
use super::geometry::GeoPaths;
use super::validation::{
    ensure_axis_system, ensure_not_empty, ensure_positive, ensure_range, ValidationError,
};
use super::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_TOTAL_ANGLE: f64 = 180.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: IntensityKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityKind {
    Library {
        intensity_file_uri: String,
    },
    Lambertian {
        total_angle: f64,
    },
    Cos {
        n: f64,
        total_angle: f64,
    },
    Gaussian {
        fwhm_angle_x: f64,
        fwhm_angle_y: f64,
        total_angle: f64,
    },
}

impl IntensityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Library { .. } => "library",
            Self::Lambertian { .. } => "lambertian",
            Self::Cos { .. } => "cos",
            Self::Gaussian { .. } => "gaussian",
        }
    }

    pub fn gaussian() -> Self {
        Self::Gaussian {
            fwhm_angle_x: 30.0,
            fwhm_angle_y: 30.0,
            total_angle: MAX_TOTAL_ANGLE,
        }
    }
}

impl Default for IntensityKind {
    fn default() -> Self {
        Self::Lambertian {
            total_angle: MAX_TOTAL_ANGLE,
        }
    }
}

impl IntensityTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            kind: IntensityKind::default(),
        }
    }
}

impl Document for IntensityTemplate {
    const KIND: DocumentKind = DocumentKind::IntensityTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match &self.kind {
            IntensityKind::Library { intensity_file_uri } => {
                ensure_not_empty("intensity_file_uri", intensity_file_uri)
            }
            IntensityKind::Lambertian { total_angle } => {
                ensure_range("total_angle", *total_angle, 0.0, MAX_TOTAL_ANGLE)
            }
            IntensityKind::Cos { n, total_angle } => {
                ensure_positive("n", *n)?;
                ensure_range("total_angle", *total_angle, 0.0, MAX_TOTAL_ANGLE)
            }
            IntensityKind::Gaussian {
                fwhm_angle_x,
                fwhm_angle_y,
                total_angle,
            } => {
                ensure_positive("fwhm_angle_x", *fwhm_angle_x)?;
                ensure_positive("fwhm_angle_y", *fwhm_angle_y)?;
                ensure_range("total_angle", *total_angle, 0.0, MAX_TOTAL_ANGLE)
            }
        }
    }
}

/// Placement of an intensity distribution, stored on the owning source entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntensityProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_properties: Option<LibraryIntensityProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaussian_properties: Option<GaussianIntensityProperties>,
}

impl IntensityProperties {
    /// Properties matching the sub-mode of `kind`.
    pub fn for_kind(kind: &IntensityKind) -> Self {
        match kind {
            IntensityKind::Library { .. } => Self {
                library_properties: Some(LibraryIntensityProperties::default()),
                gaussian_properties: None,
            },
            IntensityKind::Gaussian { .. } => Self {
                library_properties: None,
                gaussian_properties: Some(GaussianIntensityProperties::default()),
            },
            IntensityKind::Lambertian { .. } | IntensityKind::Cos { .. } => Self::default(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if let Some(library) = &self.library_properties {
            if let Some(axis_system) = &library.axis_system {
                ensure_axis_system("library_properties.axis_system", axis_system)?;
            }
        }
        if let Some(gaussian) = &self.gaussian_properties {
            if let Some(axis_system) = &gaussian.axis_system {
                ensure_axis_system("gaussian_properties.axis_system", axis_system)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryIntensityProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_system: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_geometries: Option<GeoPaths>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaussianIntensityProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_system: Option<Vec<f64>>,
}
