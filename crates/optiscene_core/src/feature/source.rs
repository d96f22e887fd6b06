//! Light sources: luminaire, surface or ray file.
//!
//! A source owns a spectrum document and, once it has been a surface
//! source, an intensity document. Both are deleted with the source; the
//! spectrum also goes once a commit reads it from the ray or xmp file.

use super::{Descriptor, Feature, FeatureKind, FeatureResult, Intensity, Spectrum, UsageError};
use crate::model::intensity::{IntensityProperties, IntensityTemplate};
use crate::model::source::{
    Exitance, ExitanceProperties, Flux, SourceInstance, SourceMode, SourceProperties,
    SourceTemplate, SourceTemplateKind,
};
use crate::model::spectrum::SpectrumTemplate;
use crate::model::{Document, DocumentKey, GeoPaths, GeoRef, InstanceMetadata, OrientedGeoPath};
use crate::projection::Projector;
use crate::repo::DocumentStore;
use serde_json::{Map, Value};
use std::sync::Arc;

pub type Source = Feature<SourceKind>;

pub struct SourceKind;

pub struct SourceExtra {
    store: Arc<dyn DocumentStore>,
    spectrum: Spectrum,
    intensity: Option<Intensity>,
}

impl SourceExtra {
    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn intensity(&self) -> Option<&Intensity> {
        self.intensity.as_ref()
    }

    fn intensity_or_default(&mut self, source_name: &str) -> &mut Intensity {
        let store = &self.store;
        self.intensity.get_or_insert_with(|| {
            Descriptor::new(Arc::clone(store), IntensityTemplate::new(intensity_name(source_name)))
        })
    }
}

fn spectrum_name(source_name: &str) -> String {
    format!("{source_name}.Spectrum")
}

fn intensity_name(source_name: &str) -> String {
    format!("{source_name}.Intensity")
}

/// Replaces `properties` when its blocks do not fit the intensity sub-mode.
fn align_intensity_properties(properties: &mut IntensityProperties, intensity: &Intensity) {
    let expected = IntensityProperties::for_kind(intensity.kind());
    let shape = |p: &IntensityProperties| {
        (p.library_properties.is_some(), p.gaussian_properties.is_some())
    };
    if shape(properties) != shape(&expected) {
        *properties = expected;
    }
}

fn load_descriptor<T: Document>(
    store: &Arc<dyn DocumentStore>,
    key: Option<&str>,
    fallback: impl FnOnce() -> T,
) -> FeatureResult<Descriptor<T>> {
    Ok(match key {
        Some(key) => Descriptor::load(Arc::clone(store), DocumentKey::from_raw(key))?,
        None => Descriptor::new(Arc::clone(store), fallback()),
    })
}

impl FeatureKind for SourceKind {
    type Template = SourceTemplate;
    type Instance = SourceInstance;
    type Extra = SourceExtra;

    const LABEL: &'static str = "source";
    const TEMPLATE_FIELD: &'static str = "source";

    fn new_template(name: &str, description: &str) -> SourceTemplate {
        let mut template = SourceTemplate::new(name);
        template.description = description.to_string();
        template
    }

    fn new_instance(name: &str, description: &str, metadata: InstanceMetadata) -> SourceInstance {
        let mut instance = SourceInstance::new(name);
        instance.description = description.to_string();
        instance.metadata = metadata;
        instance
    }

    fn new_extra(store: &Arc<dyn DocumentStore>, name: &str) -> SourceExtra {
        SourceExtra {
            store: Arc::clone(store),
            spectrum: Descriptor::new(Arc::clone(store), SpectrumTemplate::new(spectrum_name(name))),
            intensity: None,
        }
    }

    fn template_key(instance: &SourceInstance) -> Option<DocumentKey> {
        instance.source_guid.as_deref().map(DocumentKey::from_raw)
    }

    fn bind_template(instance: &mut SourceInstance, key: Option<&DocumentKey>) {
        instance.source_guid = key.map(DocumentKey::to_string);
    }

    fn load_extra(
        store: &Arc<dyn DocumentStore>,
        instance: &SourceInstance,
        template: &SourceTemplate,
    ) -> FeatureResult<SourceExtra> {
        let spectrum = load_descriptor(store, template.kind.spectrum_guid(), || {
            SpectrumTemplate::new(spectrum_name(&instance.name))
        })?;
        let intensity = match &template.kind {
            SourceTemplateKind::Surface(surface) => Some(load_descriptor(
                store,
                surface.intensity_guid.as_deref(),
                || IntensityTemplate::new(intensity_name(&instance.name)),
            )?),
            _ => None,
        };
        Ok(SourceExtra {
            store: Arc::clone(store),
            spectrum,
            intensity,
        })
    }

    fn commit_extra(
        extra: &mut SourceExtra,
        template: &mut SourceTemplate,
        instance: &mut SourceInstance,
    ) -> FeatureResult<()> {
        let spectrum_key = if template.kind.uses_spectrum_document() {
            extra.spectrum.commit()?;
            extra.spectrum.key().map(DocumentKey::to_string)
        } else {
            None
        };
        *template.kind.spectrum_guid_mut() = spectrum_key;

        if let SourceTemplateKind::Surface(surface) = &mut template.kind {
            let intensity = extra.intensity_or_default(&instance.name);
            intensity.commit()?;
            surface.intensity_guid = intensity.key().map(DocumentKey::to_string);
            if let SourceProperties::Surface(properties) = &mut instance.properties {
                align_intensity_properties(&mut properties.intensity_properties, intensity);
            }
        }
        Ok(())
    }

    /// A spectrum read from the ray or xmp file leaves the document unused.
    fn after_commit(extra: &mut SourceExtra, template: &SourceTemplate) -> FeatureResult<()> {
        if !template.kind.uses_spectrum_document() {
            extra.spectrum.delete()?;
        }
        Ok(())
    }

    fn reset_extra(extra: &mut SourceExtra) -> FeatureResult<()> {
        extra.spectrum.reset()?;
        if let Some(intensity) = &mut extra.intensity {
            intensity.reset()?;
        }
        Ok(())
    }

    fn delete_extra(
        extra: &mut SourceExtra,
        template: &mut SourceTemplate,
        _instance: &mut SourceInstance,
    ) -> FeatureResult<()> {
        extra.spectrum.delete()?;
        if let Some(intensity) = &mut extra.intensity {
            intensity.delete()?;
        }
        *template.kind.spectrum_guid_mut() = None;
        if let SourceTemplateKind::Surface(surface) = &mut template.kind {
            surface.intensity_guid = None;
        }
        Ok(())
    }

    fn project_drafts(
        tree: &mut Map<String, Value>,
        template: &Descriptor<SourceTemplate>,
        extra: &SourceExtra,
        projector: &Projector<'_>,
    ) -> FeatureResult<()> {
        if !tree.contains_key(Self::TEMPLATE_FIELD) {
            tree.insert(
                Self::TEMPLATE_FIELD.to_string(),
                template.resolved(projector)?,
            );
        }

        let kind = &template.value().kind;
        let Some(mode_tree) = tree
            .get_mut(Self::TEMPLATE_FIELD)
            .and_then(|source| source.get_mut(kind.mode().label()))
            .and_then(Value::as_object_mut)
        else {
            return Ok(());
        };
        if kind.uses_spectrum_document() && !mode_tree.contains_key("spectrum") {
            mode_tree.insert("spectrum".to_string(), extra.spectrum.resolved(projector)?);
        }
        if let (SourceMode::Surface, Some(intensity)) = (kind.mode(), &extra.intensity) {
            if !mode_tree.contains_key("intensity") {
                mode_tree.insert("intensity".to_string(), intensity.resolved(projector)?);
            }
        }
        Ok(())
    }
}

impl Feature<SourceKind> {
    pub fn mode(&self) -> SourceMode {
        self.template().kind.mode()
    }

    pub fn set_luminaire(&mut self) -> &mut Self {
        self.switch_mode(SourceMode::Luminaire)
    }

    pub fn set_surface(&mut self) -> &mut Self {
        self.switch_mode(SourceMode::Surface)
    }

    pub fn set_rayfile(&mut self) -> &mut Self {
        self.switch_mode(SourceMode::RayFile)
    }

    /// Flux carries over; everything else starts from the mode defaults.
    fn switch_mode(&mut self, mode: SourceMode) -> &mut Self {
        if self.mode() == mode {
            return self;
        }
        let name = self.name().to_string();
        let (template, instance, extra) = self.parts_mut();
        let flux = template.kind.flux().clone();
        template.kind = mode.default_template();
        *template.kind.flux_mut() = flux;
        instance.properties = mode.default_properties();
        if mode == SourceMode::Surface {
            let intensity = extra.intensity_or_default(&name);
            if let SourceProperties::Surface(properties) = &mut instance.properties {
                properties.intensity_properties = IntensityProperties::for_kind(intensity.kind());
            }
        }
        self
    }

    pub fn flux(&self) -> &Flux {
        self.template().kind.flux()
    }

    pub fn set_flux(&mut self, flux: Flux) -> &mut Self {
        *self.template_mut().kind.flux_mut() = flux;
        self
    }

    pub fn set_intensity_file_uri(&mut self, uri: impl Into<String>) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SourceTemplateKind::Luminaire(luminaire) => luminaire.intensity_file_uri = uri.into(),
            _ => {
                return Err(
                    UsageError::wrong_mode("set_intensity_file_uri", "luminaire", actual).into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_ray_file_uri(&mut self, uri: impl Into<String>) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SourceTemplateKind::RayFile(rayfile) => rayfile.ray_file_uri = uri.into(),
            _ => return Err(UsageError::wrong_mode("set_ray_file_uri", "rayfile", actual).into()),
        }
        Ok(self)
    }

    /// Read the spectrum from the ray file instead of the spectrum document.
    pub fn set_spectrum_from_ray_file(&mut self, from_file: bool) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SourceTemplateKind::RayFile(rayfile) => rayfile.spectrum_from_ray_file = from_file,
            _ => {
                return Err(
                    UsageError::wrong_mode("set_spectrum_from_ray_file", "rayfile", actual).into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_spectrum_from_xmp_file(&mut self, from_file: bool) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.template_mut().kind {
            SourceTemplateKind::Surface(surface) => surface.spectrum_from_xmp_file = from_file,
            _ => {
                return Err(
                    UsageError::wrong_mode("set_spectrum_from_xmp_file", "surface", actual).into(),
                )
            }
        }
        Ok(self)
    }

    /// Luminaire and ray file sources only.
    pub fn set_axis_system(&mut self, axis_system: Vec<f64>) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.instance_mut().properties {
            SourceProperties::Luminaire(properties) => properties.axis_system = axis_system,
            SourceProperties::RayFile(properties) => properties.axis_system = axis_system,
            SourceProperties::Surface(_) => {
                return Err(
                    UsageError::wrong_mode("set_axis_system", "luminaire or rayfile", actual)
                        .into(),
                )
            }
        }
        Ok(self)
    }

    pub fn set_exit_geometries<'a>(
        &mut self,
        geometries: impl IntoIterator<Item = &'a GeoRef>,
    ) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        match &mut self.instance_mut().properties {
            SourceProperties::RayFile(properties) => {
                properties.exit_geometries = Some(GeoPaths::from_refs(geometries));
            }
            _ => {
                return Err(
                    UsageError::wrong_mode("set_exit_geometries", "rayfile", actual).into(),
                )
            }
        }
        Ok(self)
    }

    /// Emitting faces with their normal orientation.
    pub fn set_exitance_constant(
        &mut self,
        geo_paths: &[(GeoRef, bool)],
    ) -> FeatureResult<&mut Self> {
        let geo_paths = geo_paths
            .iter()
            .map(|(geo, reverse_normal)| OrientedGeoPath::new(geo, *reverse_normal))
            .collect();
        self.set_exitance(Exitance::Constant {}, ExitanceProperties::Constant { geo_paths })
    }

    pub fn set_exitance_variable(
        &mut self,
        exitance_xmp_file_uri: impl Into<String>,
    ) -> FeatureResult<&mut Self> {
        let exitance = Exitance::Variable {
            exitance_xmp_file_uri: exitance_xmp_file_uri.into(),
        };
        let properties = ExitanceProperties::for_exitance(&exitance);
        self.set_exitance(exitance, properties)
    }

    fn set_exitance(
        &mut self,
        exitance: Exitance,
        properties: ExitanceProperties,
    ) -> FeatureResult<&mut Self> {
        let actual = self.mode().label();
        let (template, instance, _) = self.parts_mut();
        match (&mut template.kind, &mut instance.properties) {
            (SourceTemplateKind::Surface(surface), SourceProperties::Surface(placement)) => {
                surface.exitance = exitance;
                placement.exitance = properties;
            }
            _ => return Err(UsageError::wrong_mode("set_exitance", "surface", actual).into()),
        }
        Ok(self)
    }

    pub fn spectrum(&self) -> &Spectrum {
        self.extra().spectrum()
    }

    pub fn spectrum_mut(&mut self) -> &mut Spectrum {
        &mut self.extra_mut().spectrum
    }

    pub fn intensity(&self) -> Option<&Intensity> {
        self.extra().intensity()
    }

    /// Surface sources only.
    pub fn intensity_mut(&mut self) -> FeatureResult<&mut Intensity> {
        if self.mode() != SourceMode::Surface {
            return Err(
                UsageError::wrong_mode("intensity_mut", "surface", self.mode().label()).into(),
            );
        }
        let name = self.name().to_string();
        Ok(self.extra_mut().intensity_or_default(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::Source;
    use crate::feature::test_support::session;
    use crate::feature::FeatureError;
    use crate::model::geometry::default_axis_system;
    use crate::model::source::{Flux, SourceMode};
    use crate::model::{DocumentKey, GeoRef};
    use crate::repo::{DocumentStore, StoreError};
    use std::collections::BTreeMap;

    #[test]
    fn luminaire_commit_binds_spectrum() {
        let mut source = Source::new(session(), "Lamp", "", BTreeMap::new());
        source.spectrum_mut().set_blackbody(2856.0);
        source.commit().expect("commit");

        let guid = source
            .template()
            .kind
            .spectrum_guid()
            .expect("spectrum bound")
            .to_string();
        assert_eq!(source.spectrum().key(), Some(&DocumentKey::from_raw(guid)));

        let tree = source.projection().expect("projection");
        let luminaire = &tree["source"]["luminaire"];
        assert_eq!(luminaire["spectrum"]["blackbody"]["temperature"], 2856.0);
        assert!(luminaire["axis_system"].is_array());
    }

    #[test]
    fn draft_surface_projects_spectrum_and_intensity() {
        let mut source = Source::new(session(), "Panel", "", BTreeMap::new());
        source.set_surface();
        source
            .set_exitance_constant(&[(GeoRef::from_native_link("Body/Face.1"), true)])
            .expect("surface");
        source.intensity_mut().expect("surface").set_gaussian(20.0, 20.0, 120.0);

        let tree = source.projection().expect("projection");
        let surface = &tree["source"]["surface"];
        assert_eq!(surface["spectrum"]["monochromatic"]["wavelength"], 555.0);
        assert_eq!(surface["intensity"]["gaussian"]["total_angle"], 120.0);
        assert_eq!(
            surface["exitance_constant"]["geo_paths"][0]["reverse_normal"],
            true
        );
    }

    #[test]
    fn commit_aligns_intensity_properties() {
        let mut source = Source::new(session(), "Panel", "", BTreeMap::new());
        source.set_surface();
        source.intensity_mut().expect("surface").set_library("file:///a.ies");
        source.commit().expect("commit");

        let placement = serde_json::to_value(&source.instance().properties).expect("encode");
        assert!(placement["surface_properties"]["intensity_properties"]["library_properties"]
            .is_object());
    }

    #[test]
    fn switching_mode_keeps_flux() {
        let mut source = Source::new(session(), "Rays", "", BTreeMap::new());
        source.set_flux(Flux::RadiantFlux { radiant_value: 2.0 });
        source.set_rayfile();
        assert_eq!(source.mode(), SourceMode::RayFile);
        assert_eq!(source.flux(), &Flux::RadiantFlux { radiant_value: 2.0 });

        assert!(source.set_axis_system(default_axis_system()).is_ok());
        source.set_surface();
        assert!(matches!(
            source.set_axis_system(default_axis_system()),
            Err(FeatureError::Usage(_))
        ));
    }

    #[test]
    fn rayfile_spectrum_from_file_is_not_bound() {
        let mut source = Source::new(session(), "Rays", "", BTreeMap::new());
        source.set_rayfile();
        source.set_ray_file_uri("file:///rays.ray").expect("rayfile");
        source.commit().expect("commit");
        assert!(source.template().kind.spectrum_guid().is_none());
        assert!(!source.spectrum().is_committed());
    }

    #[test]
    fn spectrum_from_ray_file_releases_spectrum_document() {
        let mut source = Source::new(session(), "Lamp", "", BTreeMap::new());
        source.commit().expect("commit");
        let spectrum_key = source.spectrum().key().cloned().expect("spectrum");
        let store = std::sync::Arc::clone(source.session().store());

        source.set_rayfile();
        source
            .set_ray_file_uri("file:///rays.ray")
            .and_then(|source| source.set_spectrum_from_ray_file(true))
            .expect("rayfile");
        source.commit().expect("commit");

        assert!(matches!(
            store.read(&spectrum_key),
            Err(StoreError::NotFound(_))
        ));
        assert!(!source.spectrum().is_committed());
        assert!(source.template().kind.spectrum_guid().is_none());
    }

    #[test]
    fn delete_releases_owned_documents() {
        let mut source = Source::new(session(), "Lamp", "", BTreeMap::new());
        source.commit().expect("commit");
        let spectrum_key = source.spectrum().key().cloned().expect("spectrum");
        let store = std::sync::Arc::clone(source.session().store());

        source.delete().expect("delete");
        assert!(matches!(
            store.read(&spectrum_key),
            Err(StoreError::NotFound(_))
        ));
        assert!(source.unique_id().is_none());
        assert!(source.template().kind.spectrum_guid().is_none());
    }
}
