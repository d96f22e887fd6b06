//! Sensors: irradiance, radiance or camera template plus placement.
//!
//! Switching mode replaces both the template sub-mode and the instance
//! properties, so the two never disagree.

use super::{Feature, FeatureKind, FeatureResult, UsageError};
use crate::model::sensor::{
    BalanceMode, CameraMode, ColorMode, IlluminanceType, LayerType, LxpProperties,
    SensorDimensions, SensorInstance, SensorMode, SensorProperties, SensorTemplate,
    SensorTemplateKind, SensorType,
};
use crate::model::{DocumentKey, InstanceMetadata};
use crate::repo::DocumentStore;
use std::sync::Arc;

pub type Sensor = Feature<SensorKind>;

pub struct SensorKind;

impl FeatureKind for SensorKind {
    type Template = SensorTemplate;
    type Instance = SensorInstance;
    type Extra = ();

    const LABEL: &'static str = "sensor";
    const TEMPLATE_FIELD: &'static str = "sensor";

    fn new_template(name: &str, description: &str) -> SensorTemplate {
        let mut template = SensorTemplate::new(name);
        template.description = description.to_string();
        template
    }

    fn new_instance(name: &str, description: &str, metadata: InstanceMetadata) -> SensorInstance {
        let mut instance = SensorInstance::new(name);
        instance.description = description.to_string();
        instance.metadata = metadata;
        instance
    }

    fn new_extra(_store: &Arc<dyn DocumentStore>, _name: &str) {}

    fn template_key(instance: &SensorInstance) -> Option<DocumentKey> {
        instance.sensor_guid.as_deref().map(DocumentKey::from_raw)
    }

    fn bind_template(instance: &mut SensorInstance, key: Option<&DocumentKey>) {
        instance.sensor_guid = key.map(DocumentKey::to_string);
    }
}

impl Feature<SensorKind> {
    pub fn mode(&self) -> SensorMode {
        self.template().kind.mode()
    }

    pub fn set_irradiance(&mut self) -> &mut Self {
        self.switch_mode(SensorMode::Irradiance)
    }

    pub fn set_radiance(&mut self) -> &mut Self {
        self.switch_mode(SensorMode::Radiance)
    }

    pub fn set_camera(&mut self) -> &mut Self {
        self.switch_mode(SensorMode::Camera)
    }

    /// Keeps current values when `mode` is already selected.
    fn switch_mode(&mut self, mode: SensorMode) -> &mut Self {
        if self.mode() != mode {
            let axis_system = self.instance().properties.axis_system().to_vec();
            self.template_mut().kind = mode.default_template();
            let properties = self.instance_mut();
            properties.properties = mode.default_properties();
            *properties.properties.axis_system_mut() = axis_system;
        }
        self
    }

    pub fn set_dimensions(&mut self, dimensions: SensorDimensions) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SensorTemplateKind::Irradiance(template) => template.dimensions = dimensions,
            SensorTemplateKind::Radiance(template) => template.dimensions = dimensions,
            SensorTemplateKind::Camera(_) => {
                return Err(
                    UsageError::wrong_mode("set_dimensions", "irradiance or radiance", actual)
                        .into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_sensor_type(&mut self, sensor_type: SensorType) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SensorTemplateKind::Irradiance(template) => template.sensor_type = sensor_type,
            SensorTemplateKind::Radiance(template) => template.sensor_type = sensor_type,
            SensorTemplateKind::Camera(_) => {
                return Err(
                    UsageError::wrong_mode("set_sensor_type", "irradiance or radiance", actual)
                        .into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_illuminance_type(
        &mut self,
        illuminance_type: IlluminanceType,
    ) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SensorTemplateKind::Irradiance(template) => template.illuminance_type = illuminance_type,
            _ => {
                return Err(
                    UsageError::wrong_mode("set_illuminance_type", "irradiance", actual)
                        .into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_focal(&mut self, focal: f64) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SensorTemplateKind::Radiance(template) => template.focal = focal,
            _ => return Err(UsageError::wrong_mode("set_focal", "radiance", actual).into()),
        }
        Ok(self)
    }

    pub fn set_focal_length(&mut self, focal_length: f64) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SensorTemplateKind::Camera(template) => template.focal_length = focal_length,
            _ => return Err(UsageError::wrong_mode("set_focal_length", "camera", actual).into()),
        }
        Ok(self)
    }

    pub fn set_camera_mode(&mut self, mode: CameraMode) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SensorTemplateKind::Camera(template) => template.mode = mode,
            _ => return Err(UsageError::wrong_mode("set_camera_mode", "camera", actual).into()),
        }
        Ok(self)
    }

    /// Colour balance of a photometric colour camera.
    pub fn balance_mode(&self) -> FeatureResult<&BalanceMode> {
        match &self.template().kind {
            SensorTemplateKind::Camera(template) => match &template.mode {
                CameraMode::Photometric(photometric) => match &photometric.color_mode {
                    ColorMode::Color { balance_mode } => Ok(balance_mode),
                    ColorMode::Monochromatic { .. } => {
                        Err(UsageError::wrong_mode("balance_mode", "color", "monochromatic").into())
                    }
                },
                CameraMode::Geometric {} => {
                    Err(UsageError::wrong_mode("balance_mode", "photometric", "geometric").into())
                }
            },
            other => {
                Err(
                    UsageError::wrong_mode("balance_mode", "camera", other.mode().label())
                        .into(),
                )
            }
        }
    }

    pub fn set_balance_mode(&mut self, balance: BalanceMode) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        let SensorTemplateKind::Camera(template) = &mut self.template_mut().kind else {
            return Err(UsageError::wrong_mode("set_balance_mode", "camera", actual).into());
        };
        let CameraMode::Photometric(photometric) = &mut template.mode else {
            return Err(
                UsageError::wrong_mode("set_balance_mode", "photometric", "geometric").into(),
            );
        };
        match &mut photometric.color_mode {
            ColorMode::Color { balance_mode } => *balance_mode = balance,
            ColorMode::Monochromatic { .. } => {
                return Err(
                    UsageError::wrong_mode("set_balance_mode", "color", "monochromatic").into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_axis_system(&mut self, axis_system: Vec<f64>) -> &mut Self {
        *self.instance_mut().properties.axis_system_mut() = axis_system;
        self
    }

    pub fn set_layer_type(&mut self, layer_type: LayerType) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.instance_mut().properties {
            SensorProperties::Irradiance(properties) => properties.layer_type = layer_type,
            SensorProperties::Radiance(properties) => properties.layer_type = layer_type,
            SensorProperties::Camera(_) => {
                return Err(
                    UsageError::wrong_mode("set_layer_type", "irradiance or radiance", actual)
                        .into(),
                )
            }
        }
        Ok(self)
    }

    /// `None` disables light expert path recording.
    pub fn set_lxp(&mut self, nb_max_paths: Option<u32>) -> &mut Self {
        self.instance_mut().lxp_properties =
            nb_max_paths.map(|nb_max_paths| LxpProperties { nb_max_paths });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Sensor;
    use crate::feature::test_support::session;
    use crate::feature::FeatureError;
    use crate::model::sensor::{
        BalanceMode, CameraMode, CameraPhotometric, IlluminanceType, SensorMode, SensorProperties,
    };
    use std::collections::BTreeMap;

    #[test]
    fn mode_switch_keeps_template_and_properties_aligned() {
        let mut sensor = Sensor::new(session(), "Sensor.1", "", BTreeMap::new());
        sensor.set_axis_system(vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        sensor.set_camera();

        assert_eq!(sensor.mode(), SensorMode::Camera);
        assert!(matches!(
            sensor.instance().properties,
            SensorProperties::Camera(_)
        ));
        assert_eq!(sensor.instance().properties.axis_system()[0], 1.0);
    }

    #[test]
    fn irradiance_field_on_camera_is_usage_error() {
        let mut sensor = Sensor::new(session(), "Camera", "", BTreeMap::new());
        sensor.set_camera();
        let err = sensor
            .set_illuminance_type(IlluminanceType::Radial)
            .err()
            .expect("usage error");
        assert!(matches!(err, FeatureError::Usage(ref usage) if usage.actual == "camera"));
    }

    #[test]
    fn balance_mode_needs_photometric_colour_camera() {
        let mut sensor = Sensor::new(session(), "Camera", "", BTreeMap::new());
        sensor.set_camera();
        assert!(sensor.balance_mode().is_err());

        sensor
            .set_camera_mode(CameraMode::Photometric(CameraPhotometric::default()))
            .expect("camera");
        sensor
            .set_balance_mode(BalanceMode::Greyworld {})
            .expect("colour camera");
        assert_eq!(sensor.balance_mode().expect("balance"), &BalanceMode::Greyworld {});
    }

    #[test]
    fn projection_hoists_properties_beside_template() {
        let mut sensor = Sensor::new(session(), "Irradiance", "", BTreeMap::new());
        sensor.set_lxp(Some(50));
        sensor.commit().expect("commit");

        let tree = sensor.projection().expect("projection");
        let template = &tree["sensor"]["irradiance_sensor_template"];
        assert!(template["axis_system"].is_array());
        assert!(template["layer_type"]["none"].is_object());
        assert!(tree.get("irradiance_properties").is_none());
        assert_eq!(tree["lxp_properties"]["nb_max_paths"], 50);
    }
}
