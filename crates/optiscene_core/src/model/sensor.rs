//! Sensor templates and the sensor scene entry.
//!
//! The template sub-mode (`irradiance`, `radiance`, `camera`) and the
//! instance properties sub-mode always agree once written by a feature.

use super::document::DocumentKind;
use super::geometry::{default_axis_system, GeoPaths};
use super::metadata::InstanceMetadata;
use super::validation::{
    ensure_axis_system, ensure_not_empty, ensure_positive, ensure_range, ValidationError,
};
use super::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: SensorTemplateKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorTemplateKind {
    #[serde(rename = "irradiance_sensor_template")]
    Irradiance(IrradianceTemplate),
    #[serde(rename = "radiance_sensor_template")]
    Radiance(RadianceTemplate),
    #[serde(rename = "camera_sensor_template")]
    Camera(CameraTemplate),
}

impl SensorTemplateKind {
    pub fn mode(&self) -> SensorMode {
        match self {
            Self::Irradiance(_) => SensorMode::Irradiance,
            Self::Radiance(_) => SensorMode::Radiance,
            Self::Camera(_) => SensorMode::Camera,
        }
    }
}

/// Sensor sub-mode shared by template and instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorMode {
    Irradiance,
    Radiance,
    Camera,
}

impl SensorMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Irradiance => "irradiance",
            Self::Radiance => "radiance",
            Self::Camera => "camera",
        }
    }

    pub fn default_template(self) -> SensorTemplateKind {
        match self {
            Self::Irradiance => SensorTemplateKind::Irradiance(IrradianceTemplate::default()),
            Self::Radiance => SensorTemplateKind::Radiance(RadianceTemplate::default()),
            Self::Camera => SensorTemplateKind::Camera(CameraTemplate::default()),
        }
    }

    pub fn default_properties(self) -> SensorProperties {
        match self {
            Self::Irradiance => SensorProperties::Irradiance(IrradianceProperties::default()),
            Self::Radiance => SensorProperties::Radiance(RadianceProperties::default()),
            Self::Camera => SensorProperties::Camera(CameraProperties::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Photometric {},
    Radiometric {},
    Colorimetric { wavelengths_range: WavelengthsRange },
    Spectral { wavelengths_range: WavelengthsRange },
}

impl SensorType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Photometric {} => "photometric",
            Self::Radiometric {} => "radiometric",
            Self::Colorimetric { .. } => "colorimetric",
            Self::Spectral { .. } => "spectral",
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Colorimetric { wavelengths_range } | Self::Spectral { wavelengths_range } => {
                wavelengths_range.validate()
            }
            Self::Photometric {} | Self::Radiometric {} => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavelengthsRange {
    pub w_start: f64,
    pub w_end: f64,
    pub w_sampling: u32,
}

impl Default for WavelengthsRange {
    fn default() -> Self {
        Self {
            w_start: 400.0,
            w_end: 700.0,
            w_sampling: 13,
        }
    }
}

impl WavelengthsRange {
    fn validate(&self) -> Result<(), ValidationError> {
        ensure_positive("w_start", self.w_start)?;
        ensure_range("w_end", self.w_end, self.w_start, f64::MAX)?;
        ensure_positive("w_sampling", f64::from(self.w_sampling))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IlluminanceType {
    Planar,
    Radial,
    Hemispherical,
    Cylindrical,
    SemiCylindrical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDimensions {
    pub x_start: f64,
    pub x_end: f64,
    pub x_sampling: u32,
    pub y_start: f64,
    pub y_end: f64,
    pub y_sampling: u32,
}

impl Default for SensorDimensions {
    fn default() -> Self {
        Self {
            x_start: -50.0,
            x_end: 50.0,
            x_sampling: 100,
            y_start: -50.0,
            y_end: 50.0,
            y_sampling: 100,
        }
    }
}

impl SensorDimensions {
    fn validate(&self) -> Result<(), ValidationError> {
        ensure_range("x_end", self.x_end, self.x_start, f64::MAX)?;
        ensure_range("y_end", self.y_end, self.y_start, f64::MAX)?;
        ensure_positive("x_sampling", f64::from(self.x_sampling))?;
        ensure_positive("y_sampling", f64::from(self.y_sampling))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrradianceTemplate {
    pub sensor_type: SensorType,
    pub illuminance_type: IlluminanceType,
    pub dimensions: SensorDimensions,
}

impl Default for IrradianceTemplate {
    fn default() -> Self {
        Self {
            sensor_type: SensorType::Photometric {},
            illuminance_type: IlluminanceType::Planar,
            dimensions: SensorDimensions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadianceTemplate {
    pub sensor_type: SensorType,
    pub focal: f64,
    pub integration_angle: f64,
    pub dimensions: SensorDimensions,
}

impl Default for RadianceTemplate {
    fn default() -> Self {
        Self {
            sensor_type: SensorType::Photometric {},
            focal: 250.0,
            integration_angle: 5.0,
            dimensions: SensorDimensions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraTemplate {
    pub focal_length: f64,
    pub imager_distance: f64,
    pub f_number: f64,
    pub horz_pixel: u32,
    pub vert_pixel: u32,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub mode: CameraMode,
}

impl Default for CameraTemplate {
    fn default() -> Self {
        Self {
            focal_length: 5.0,
            imager_distance: 10.0,
            f_number: 20.0,
            horz_pixel: 640,
            vert_pixel: 480,
            width: 5.0,
            height: 5.0,
            mode: CameraMode::Geometric {},
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[serde(rename = "sensor_mode_geometric")]
    Geometric {},
    #[serde(rename = "sensor_mode_photometric")]
    Photometric(CameraPhotometric),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPhotometric {
    pub acquisition_integration: f64,
    pub gamma_correction: f64,
    pub color_mode: ColorMode,
}

impl Default for CameraPhotometric {
    fn default() -> Self {
        Self {
            acquisition_integration: 0.01,
            gamma_correction: 2.2,
            color_mode: ColorMode::Color {
                balance_mode: BalanceMode::None {},
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Monochromatic { spectrum_file_uri: String },
    Color { balance_mode: BalanceMode },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceMode {
    None {},
    Greyworld {},
    UserWhite {
        red_gain: f64,
        green_gain: f64,
        blue_gain: f64,
    },
    DisplayPrimaries {
        red_display_file_uri: String,
        green_display_file_uri: String,
        blue_display_file_uri: String,
    },
}

impl BalanceMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None {} => "none",
            Self::Greyworld {} => "greyworld",
            Self::UserWhite { .. } => "user_white",
            Self::DisplayPrimaries { .. } => "display_primaries",
        }
    }
}

impl CameraTemplate {
    fn validate(&self) -> Result<(), ValidationError> {
        ensure_positive("focal_length", self.focal_length)?;
        ensure_positive("imager_distance", self.imager_distance)?;
        ensure_positive("f_number", self.f_number)?;
        ensure_positive("width", self.width)?;
        ensure_positive("height", self.height)?;
        if let CameraMode::Photometric(photometric) = &self.mode {
            ensure_positive("acquisition_integration", photometric.acquisition_integration)?;
            ensure_positive("gamma_correction", photometric.gamma_correction)?;
            if let ColorMode::Monochromatic { spectrum_file_uri } = &photometric.color_mode {
                ensure_not_empty("spectrum_file_uri", spectrum_file_uri)?;
            }
        }
        Ok(())
    }
}

impl SensorTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            kind: SensorMode::Irradiance.default_template(),
        }
    }
}

impl Document for SensorTemplate {
    const KIND: DocumentKind = DocumentKind::SensorTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match &self.kind {
            SensorTemplateKind::Irradiance(template) => {
                template.sensor_type.validate()?;
                template.dimensions.validate()
            }
            SensorTemplateKind::Radiance(template) => {
                template.sensor_type.validate()?;
                ensure_positive("focal", template.focal)?;
                ensure_positive("integration_angle", template.integration_angle)?;
                template.dimensions.validate()
            }
            SensorTemplateKind::Camera(template) => template.validate(),
        }
    }
}

/// Sensor entry of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInstance {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: InstanceMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_guid: Option<String>,
    #[serde(flatten)]
    pub properties: SensorProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lxp_properties: Option<LxpProperties>,
}

impl SensorInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: InstanceMetadata::default(),
            sensor_guid: None,
            properties: SensorMode::Irradiance.default_properties(),
            lxp_properties: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        ensure_axis_system("axis_system", self.properties.axis_system())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorProperties {
    #[serde(rename = "irradiance_properties")]
    Irradiance(IrradianceProperties),
    #[serde(rename = "radiance_properties")]
    Radiance(RadianceProperties),
    #[serde(rename = "camera_properties")]
    Camera(CameraProperties),
}

impl SensorProperties {
    pub fn mode(&self) -> SensorMode {
        match self {
            Self::Irradiance(_) => SensorMode::Irradiance,
            Self::Radiance(_) => SensorMode::Radiance,
            Self::Camera(_) => SensorMode::Camera,
        }
    }

    pub fn axis_system(&self) -> &[f64] {
        match self {
            Self::Irradiance(properties) => &properties.axis_system,
            Self::Radiance(properties) => &properties.axis_system,
            Self::Camera(properties) => &properties.axis_system,
        }
    }

    pub fn axis_system_mut(&mut self) -> &mut Vec<f64> {
        match self {
            Self::Irradiance(properties) => &mut properties.axis_system,
            Self::Radiance(properties) => &mut properties.axis_system,
            Self::Camera(properties) => &mut properties.axis_system,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrradianceProperties {
    pub axis_system: Vec<f64>,
    pub layer_type: LayerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_direction: Option<Vec<f64>>,
}

impl Default for IrradianceProperties {
    fn default() -> Self {
        Self {
            axis_system: default_axis_system(),
            layer_type: LayerType::None {},
            integration_direction: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadianceProperties {
    pub axis_system: Vec<f64>,
    pub layer_type: LayerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer_point: Option<Vec<f64>>,
}

impl Default for RadianceProperties {
    fn default() -> Self {
        Self {
            axis_system: default_axis_system(),
            layer_type: LayerType::None {},
            observer_point: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraProperties {
    pub axis_system: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory_file_uri: Option<String>,
}

impl Default for CameraProperties {
    fn default() -> Self {
        Self {
            axis_system: default_axis_system(),
            trajectory_file_uri: None,
        }
    }
}

/// Result separation of an irradiance or radiance sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    None {},
    Source {},
    Face { geometries: GeoPaths },
    Sequence {
        maximum_nb_of_sequence: u32,
        define_sequence_per_faces: bool,
    },
    Polarization {},
}

/// Light expert path recording. Kept out of projection hoisting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LxpProperties {
    pub nb_max_paths: u32,
}

impl Default for LxpProperties {
    fn default() -> Self {
        Self { nb_max_paths: 100 }
    }
}
