//! Simulations: a solver template plus the sensors, sources and
//! geometries it runs on.

use super::{Feature, FeatureKind, FeatureResult, Sensor, Source, UsageError};
use crate::model::simulation::{
    SimulationInstance, SimulationMode, SimulationTemplate, SimulationTemplateKind,
};
use crate::model::{DocumentKey, GeoPaths, GeoRef, InstanceMetadata};
use crate::repo::DocumentStore;
use std::sync::Arc;

pub type Simulation = Feature<SimulationKind>;

pub struct SimulationKind;

impl FeatureKind for SimulationKind {
    type Template = SimulationTemplate;
    type Instance = SimulationInstance;
    type Extra = ();

    const LABEL: &'static str = "simulation";
    const TEMPLATE_FIELD: &'static str = "simulation";

    fn new_template(name: &str, description: &str) -> SimulationTemplate {
        let mut template = SimulationTemplate::new(name);
        template.description = description.to_string();
        template
    }

    fn new_instance(
        name: &str,
        description: &str,
        metadata: InstanceMetadata,
    ) -> SimulationInstance {
        let mut instance = SimulationInstance::new(name);
        instance.description = description.to_string();
        instance.metadata = metadata;
        instance
    }

    fn new_extra(_store: &Arc<dyn DocumentStore>, _name: &str) {}

    fn template_key(instance: &SimulationInstance) -> Option<DocumentKey> {
        instance.simulation_guid.as_deref().map(DocumentKey::from_raw)
    }

    fn bind_template(instance: &mut SimulationInstance, key: Option<&DocumentKey>) {
        instance.simulation_guid = key.map(DocumentKey::to_string);
    }
}

impl Feature<SimulationKind> {
    pub fn mode(&self) -> SimulationMode {
        self.template().kind.mode()
    }

    pub fn set_direct(&mut self) -> &mut Self {
        self.switch_mode(SimulationMode::Direct)
    }

    pub fn set_inverse(&mut self) -> &mut Self {
        self.switch_mode(SimulationMode::Inverse)
    }

    pub fn set_interactive(&mut self) -> &mut Self {
        self.switch_mode(SimulationMode::Interactive)
    }

    /// Common settings carry over to the new mode.
    fn switch_mode(&mut self, mode: SimulationMode) -> &mut Self {
        if self.mode() != mode {
            let common = self.template().kind.common().clone();
            let kind = &mut self.template_mut().kind;
            *kind = mode.default_template();
            *kind.common_mut() = common;
        }
        self
    }

    pub fn set_geom_distance_tolerance(&mut self, tolerance: f64) -> &mut Self {
        self.template_mut().kind.common_mut().geom_distance_tolerance = tolerance;
        self
    }

    pub fn set_max_impact(&mut self, max_impact: u32) -> &mut Self {
        self.template_mut().kind.common_mut().max_impact = max_impact;
        self
    }

    /// Direct and inverse simulations only.
    pub fn set_dispersion(&mut self, dispersion: bool) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SimulationTemplateKind::Direct(direct) => direct.dispersion = dispersion,
            SimulationTemplateKind::Inverse(inverse) => inverse.dispersion = dispersion,
            SimulationTemplateKind::Interactive(_) => {
                return Err(
                    UsageError::wrong_mode("set_dispersion", "direct or inverse", actual).into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_sensors(&mut self, sensors: &[&Sensor]) -> &mut Self {
        let names = sensors.iter().map(|sensor| sensor.name().to_string()).collect();
        self.set_sensor_paths(names)
    }

    pub fn set_sensor_paths(&mut self, paths: Vec<String>) -> &mut Self {
        self.instance_mut().sensor_paths = paths;
        self
    }

    pub fn set_sources(&mut self, sources: &[&Source]) -> &mut Self {
        let names = sources.iter().map(|source| source.name().to_string()).collect();
        self.set_source_paths(names)
    }

    pub fn set_source_paths(&mut self, paths: Vec<String>) -> &mut Self {
        self.instance_mut().source_paths = paths;
        self
    }

    pub fn set_geometries<'a>(
        &mut self,
        geometries: impl IntoIterator<Item = &'a GeoRef>,
    ) -> &mut Self {
        self.instance_mut().geometries = Some(GeoPaths::from_refs(geometries));
        self
    }

    /// Runs on every geometry of the root part.
    pub fn clear_geometries(&mut self) -> &mut Self {
        self.instance_mut().geometries = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Simulation;
    use crate::feature::test_support::session;
    use crate::feature::{FeatureError, Sensor, Source};
    use crate::model::simulation::{SimulationMode, SimulationTemplateKind};
    use crate::model::GeoRef;
    use std::collections::BTreeMap;

    #[test]
    fn switch_keeps_common_settings() {
        let mut simulation = Simulation::new(session(), "Sim", "", BTreeMap::new());
        simulation.set_max_impact(42).set_inverse();
        assert_eq!(simulation.mode(), SimulationMode::Inverse);
        assert_eq!(simulation.template().kind.common().max_impact, 42);
        assert!(matches!(
            simulation.template().kind,
            SimulationTemplateKind::Inverse(_)
        ));
    }

    #[test]
    fn dispersion_on_interactive_is_usage_error() {
        let mut simulation = Simulation::new(session(), "Sim", "", BTreeMap::new());
        simulation.set_inverse();
        simulation.set_dispersion(true).expect("inverse");
        assert!(matches!(
            &simulation.template().kind,
            SimulationTemplateKind::Inverse(inverse) if inverse.dispersion
        ));

        simulation.set_interactive();
        let before = simulation.template().clone();
        let err = simulation.set_dispersion(true).err().expect("usage error");
        assert!(matches!(err, FeatureError::Usage(ref usage) if usage.actual == "interactive"));
        assert_eq!(simulation.template(), &before);
    }

    #[test]
    fn sensors_and_sources_are_referenced_by_name() {
        let session = session();
        let sensor = Sensor::new(session.clone(), "Irradiance.1", "", BTreeMap::new());
        let source = Source::new(session.clone(), "Lamp.1", "", BTreeMap::new());
        let mut simulation = Simulation::new(session, "Sim", "", BTreeMap::new());
        simulation
            .set_sensors(&[&sensor])
            .set_sources(&[&source])
            .set_geometries([&GeoRef::from_native_link("Body.1")]);
        simulation.commit().expect("commit");

        let tree = simulation.projection().expect("projection");
        assert_eq!(tree["sensor_paths"][0], "Irradiance.1");
        assert_eq!(tree["source_paths"][0], "Lamp.1");
        assert!(tree["simulation"]["direct_mc_simulation_template"].is_object());
    }
}
