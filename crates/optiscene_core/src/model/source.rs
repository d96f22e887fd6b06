//! Light source templates and the source scene entry.

use super::document::DocumentKind;
use super::geometry::{default_axis_plane, default_axis_system, GeoPaths, OrientedGeoPath};
use super::intensity::IntensityProperties;
use super::metadata::InstanceMetadata;
use super::validation::{
    ensure_axis_plane, ensure_axis_system, ensure_not_empty, ensure_positive, ValidationError,
};
use super::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: SourceTemplateKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTemplateKind {
    Luminaire(LuminaireTemplate),
    Surface(SurfaceTemplate),
    #[serde(rename = "rayfile")]
    RayFile(RayFileTemplate),
}

/// Source sub-mode shared by template and instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Luminaire,
    Surface,
    RayFile,
}

impl SourceMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Luminaire => "luminaire",
            Self::Surface => "surface",
            Self::RayFile => "rayfile",
        }
    }

    pub fn default_template(self) -> SourceTemplateKind {
        match self {
            Self::Luminaire => SourceTemplateKind::Luminaire(LuminaireTemplate::default()),
            Self::Surface => SourceTemplateKind::Surface(SurfaceTemplate::default()),
            Self::RayFile => SourceTemplateKind::RayFile(RayFileTemplate::default()),
        }
    }

    pub fn default_properties(self) -> SourceProperties {
        match self {
            Self::Luminaire => SourceProperties::Luminaire(LuminaireProperties::default()),
            Self::Surface => SourceProperties::Surface(SurfaceProperties::default()),
            Self::RayFile => SourceProperties::RayFile(RayFileProperties::default()),
        }
    }
}

impl SourceTemplateKind {
    pub fn mode(&self) -> SourceMode {
        match self {
            Self::Luminaire(_) => SourceMode::Luminaire,
            Self::Surface(_) => SourceMode::Surface,
            Self::RayFile(_) => SourceMode::RayFile,
        }
    }

    pub fn flux(&self) -> &Flux {
        match self {
            Self::Luminaire(template) => &template.flux,
            Self::Surface(template) => &template.flux,
            Self::RayFile(template) => &template.flux,
        }
    }

    pub fn flux_mut(&mut self) -> &mut Flux {
        match self {
            Self::Luminaire(template) => &mut template.flux,
            Self::Surface(template) => &mut template.flux,
            Self::RayFile(template) => &mut template.flux,
        }
    }

    /// Whether the spectrum comes from a spectrum document rather than
    /// from the ray or exitance file.
    pub fn uses_spectrum_document(&self) -> bool {
        match self {
            Self::Luminaire(_) => true,
            Self::Surface(template) => !template.spectrum_from_xmp_file,
            Self::RayFile(template) => !template.spectrum_from_ray_file,
        }
    }

    pub fn spectrum_guid_mut(&mut self) -> &mut Option<String> {
        match self {
            Self::Luminaire(template) => &mut template.spectrum_guid,
            Self::Surface(template) => &mut template.spectrum_guid,
            Self::RayFile(template) => &mut template.spectrum_guid,
        }
    }

    pub fn spectrum_guid(&self) -> Option<&str> {
        match self {
            Self::Luminaire(template) => template.spectrum_guid.as_deref(),
            Self::Surface(template) => template.spectrum_guid.as_deref(),
            Self::RayFile(template) => template.spectrum_guid.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flux {
    /// Flux read from the intensity or ray file.
    FluxFromFile {},
    LuminousFlux { luminous_value: f64 },
    RadiantFlux { radiant_value: f64 },
    LuminousIntensityFlux { luminous_intensity_value: f64 },
}

impl Flux {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::FluxFromFile {} => None,
            Self::LuminousFlux { luminous_value } => Some(*luminous_value),
            Self::RadiantFlux { radiant_value } => Some(*radiant_value),
            Self::LuminousIntensityFlux {
                luminous_intensity_value,
            } => Some(*luminous_intensity_value),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self.value() {
            Some(value) => ensure_positive("flux", value),
            None => Ok(()),
        }
    }
}

impl Default for Flux {
    fn default() -> Self {
        Self::LuminousFlux {
            luminous_value: 683.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LuminaireTemplate {
    #[serde(default)]
    pub intensity_file_uri: String,
    pub flux: Flux,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectrum_guid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTemplate {
    pub flux: Flux,
    #[serde(flatten)]
    pub exitance: Exitance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_guid: Option<String>,
    #[serde(default)]
    pub spectrum_from_xmp_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectrum_guid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Exitance {
    #[serde(rename = "exitance_constant")]
    Constant {},
    #[serde(rename = "exitance_variable")]
    Variable { exitance_xmp_file_uri: String },
}

impl Default for Exitance {
    fn default() -> Self {
        Self::Constant {}
    }
}

impl Exitance {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Constant {} => "exitance_constant",
            Self::Variable { .. } => "exitance_variable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayFileTemplate {
    #[serde(default)]
    pub ray_file_uri: String,
    pub flux: Flux,
    #[serde(default)]
    pub spectrum_from_ray_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectrum_guid: Option<String>,
}

impl Default for RayFileTemplate {
    fn default() -> Self {
        Self {
            ray_file_uri: String::new(),
            flux: Flux::default(),
            spectrum_from_ray_file: true,
            spectrum_guid: None,
        }
    }
}

impl SourceTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            kind: SourceMode::Luminaire.default_template(),
        }
    }
}

impl Document for SourceTemplate {
    const KIND: DocumentKind = DocumentKind::SourceTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.kind.flux().validate()?;
        match &self.kind {
            SourceTemplateKind::Surface(SurfaceTemplate {
                exitance: Exitance::Variable {
                    exitance_xmp_file_uri,
                },
                ..
            }) => ensure_not_empty("exitance_xmp_file_uri", exitance_xmp_file_uri),
            _ => Ok(()),
        }
    }
}

/// Source entry of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInstance {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: InstanceMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_guid: Option<String>,
    #[serde(flatten)]
    pub properties: SourceProperties,
}

impl SourceInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: InstanceMetadata::default(),
            source_guid: None,
            properties: SourceMode::Luminaire.default_properties(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        match &self.properties {
            SourceProperties::Luminaire(properties) => {
                ensure_axis_system("axis_system", &properties.axis_system)
            }
            SourceProperties::Surface(properties) => {
                if let ExitanceProperties::Variable { axis_plane } = &properties.exitance {
                    ensure_axis_plane("axis_plane", axis_plane)?;
                }
                properties.intensity_properties.validate()
            }
            SourceProperties::RayFile(properties) => {
                ensure_axis_system("axis_system", &properties.axis_system)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceProperties {
    #[serde(rename = "luminaire_properties")]
    Luminaire(LuminaireProperties),
    #[serde(rename = "surface_properties")]
    Surface(SurfaceProperties),
    #[serde(rename = "rayfile_properties")]
    RayFile(RayFileProperties),
}

impl SourceProperties {
    pub fn mode(&self) -> SourceMode {
        match self {
            Self::Luminaire(_) => SourceMode::Luminaire,
            Self::Surface(_) => SourceMode::Surface,
            Self::RayFile(_) => SourceMode::RayFile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuminaireProperties {
    pub axis_system: Vec<f64>,
}

impl Default for LuminaireProperties {
    fn default() -> Self {
        Self {
            axis_system: default_axis_system(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProperties {
    #[serde(flatten)]
    pub exitance: ExitanceProperties,
    #[serde(default)]
    pub intensity_properties: IntensityProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExitanceProperties {
    #[serde(rename = "exitance_constant_properties")]
    Constant { geo_paths: Vec<OrientedGeoPath> },
    #[serde(rename = "exitance_variable_properties")]
    Variable { axis_plane: Vec<f64> },
}

impl ExitanceProperties {
    pub fn for_exitance(exitance: &Exitance) -> Self {
        match exitance {
            Exitance::Constant {} => Self::Constant {
                geo_paths: Vec::new(),
            },
            Exitance::Variable { .. } => Self::Variable {
                axis_plane: default_axis_plane(),
            },
        }
    }
}

impl Default for ExitanceProperties {
    fn default() -> Self {
        Self::Constant {
            geo_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayFileProperties {
    pub axis_system: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_geometries: Option<GeoPaths>,
}

impl Default for RayFileProperties {
    fn default() -> Self {
        Self {
            axis_system: default_axis_system(),
            exit_geometries: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SourceInstance, SourceMode, SourceTemplate};
    use serde_json::json;

    #[test]
    fn surface_source_nests_property_blocks() {
        let mut instance = SourceInstance::new("Surface.1");
        instance.properties = SourceMode::Surface.default_properties();
        let wire = serde_json::to_value(&instance).expect("encode source");
        assert_eq!(
            wire["surface_properties"]["exitance_constant_properties"],
            json!({"geo_paths": []})
        );
        assert!(wire["surface_properties"]["intensity_properties"].is_object());
    }

    #[test]
    fn surface_template_exposes_exitance_container() {
        let mut template = SourceTemplate::new("Surface.1");
        template.kind = SourceMode::Surface.default_template();
        let wire = serde_json::to_value(&template).expect("encode template");
        assert_eq!(wire["surface"]["exitance_constant"], json!({}));
        let decoded: SourceTemplate = serde_json::from_value(wire).expect("decode template");
        assert_eq!(decoded, template);
    }
}
