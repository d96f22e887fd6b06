//! Simulation templates and the simulation scene entry.

use super::document::DocumentKind;
use super::geometry::GeoPaths;
use super::metadata::InstanceMetadata;
use super::validation::{ensure_positive, ValidationError};
use super::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: SimulationTemplateKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationTemplateKind {
    #[serde(rename = "direct_mc_simulation_template")]
    Direct(DirectTemplate),
    #[serde(rename = "inverse_mc_simulation_template")]
    Inverse(InverseTemplate),
    #[serde(rename = "interactive_simulation_template")]
    Interactive(InteractiveTemplate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Direct,
    Inverse,
    Interactive,
}

impl SimulationMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Inverse => "inverse",
            Self::Interactive => "interactive",
        }
    }

    pub fn default_template(self) -> SimulationTemplateKind {
        match self {
            Self::Direct => SimulationTemplateKind::Direct(DirectTemplate::default()),
            Self::Inverse => SimulationTemplateKind::Inverse(InverseTemplate::default()),
            Self::Interactive => {
                SimulationTemplateKind::Interactive(InteractiveTemplate::default())
            }
        }
    }
}

impl SimulationTemplateKind {
    pub fn mode(&self) -> SimulationMode {
        match self {
            Self::Direct(_) => SimulationMode::Direct,
            Self::Inverse(_) => SimulationMode::Inverse,
            Self::Interactive(_) => SimulationMode::Interactive,
        }
    }

    pub fn common(&self) -> &SimulationCommon {
        match self {
            Self::Direct(template) => &template.common,
            Self::Inverse(template) => &template.common,
            Self::Interactive(template) => &template.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut SimulationCommon {
        match self {
            Self::Direct(template) => &mut template.common,
            Self::Inverse(template) => &mut template.common,
            Self::Interactive(template) => &mut template.common,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorimetricStandard {
    #[serde(rename = "CIE_1931")]
    Cie1931,
    #[serde(rename = "CIE_1964")]
    Cie1964,
}

/// Settings shared by every simulation sub-mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCommon {
    pub geom_distance_tolerance: f64,
    pub max_impact: u32,
    pub colorimetric_standard: ColorimetricStandard,
    #[serde(default)]
    pub ambient_material_uri: String,
}

impl Default for SimulationCommon {
    fn default() -> Self {
        Self {
            geom_distance_tolerance: 0.01,
            max_impact: 100,
            colorimetric_standard: ColorimetricStandard::Cie1931,
            ambient_material_uri: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectTemplate {
    #[serde(flatten)]
    pub common: SimulationCommon,
    pub dispersion: bool,
    pub fast_transmission_gathering: bool,
}

impl Default for DirectTemplate {
    fn default() -> Self {
        Self {
            common: SimulationCommon::default(),
            dispersion: true,
            fast_transmission_gathering: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverseTemplate {
    #[serde(flatten)]
    pub common: SimulationCommon,
    pub dispersion: bool,
    pub splitting: bool,
    pub number_of_gathering_rays_per_source: u32,
    pub maximum_gathering_error: u32,
}

impl Default for InverseTemplate {
    fn default() -> Self {
        Self {
            common: SimulationCommon::default(),
            dispersion: false,
            splitting: false,
            number_of_gathering_rays_per_source: 1,
            maximum_gathering_error: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractiveTemplate {
    #[serde(flatten)]
    pub common: SimulationCommon,
    pub impact_report: bool,
}

impl SimulationTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            kind: SimulationMode::Direct.default_template(),
        }
    }
}

impl Document for SimulationTemplate {
    const KIND: DocumentKind = DocumentKind::SimulationTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let common = self.kind.common();
        ensure_positive("geom_distance_tolerance", common.geom_distance_tolerance)?;
        ensure_positive("max_impact", f64::from(common.max_impact))?;
        if let SimulationTemplateKind::Inverse(inverse) = &self.kind {
            ensure_positive(
                "number_of_gathering_rays_per_source",
                f64::from(inverse.number_of_gathering_rays_per_source),
            )?;
        }
        Ok(())
    }
}

/// Simulation entry of a scene. Sensors and sources are referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInstance {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: InstanceMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_guid: Option<String>,
    #[serde(default)]
    pub sensor_paths: Vec<String>,
    #[serde(default)]
    pub source_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometries: Option<GeoPaths>,
}

impl SimulationInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: InstanceMetadata::default(),
            simulation_guid: None,
            sensor_paths: Vec::new(),
            source_paths: Vec::new(),
            geometries: None,
        }
    }
}
