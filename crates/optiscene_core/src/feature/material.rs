//! Materials: one surface template, an optional volume template.

use super::{delete_released, Descriptor, Feature, FeatureKind, FeatureResult, UsageError};
use crate::model::material::{MaterialInstance, SopKind, SopTemplate, VopKind, VopTemplate};
use crate::model::{DocumentKey, GeoPaths, GeoRef, InstanceMetadata};
use crate::projection::Projector;
use crate::repo::{DocumentLink, DocumentStore};
use serde_json::{Map, Value};
use std::sync::Arc;

pub type Material = Feature<MaterialKind>;

pub struct MaterialKind;

/// Volume template owned by a material.
pub struct MaterialExtra {
    store: Arc<dyn DocumentStore>,
    volume: Option<Descriptor<VopTemplate>>,
    /// Committed volume dropped locally; deleted once a commit lands.
    released_volume: Option<DocumentLink>,
}

impl MaterialExtra {
    pub fn volume(&self) -> Option<&Descriptor<VopTemplate>> {
        self.volume.as_ref()
    }

    fn volume_kind_mut(&mut self, name: &str) -> &mut VopKind {
        let store = &self.store;
        let volume = self.volume.get_or_insert_with(|| {
            Descriptor::new(Arc::clone(store), VopTemplate::new(name, VopKind::Opaque {}))
        });
        &mut volume.value_mut().kind
    }

    fn drop_volume(&mut self) {
        if let Some(mut volume) = self.volume.take() {
            if let Some(link) = volume.release() {
                self.released_volume.get_or_insert(link);
            }
        }
    }
}

impl FeatureKind for MaterialKind {
    type Template = SopTemplate;
    type Instance = MaterialInstance;
    type Extra = MaterialExtra;

    const LABEL: &'static str = "material";
    const TEMPLATE_FIELD: &'static str = "sops";

    fn new_template(name: &str, description: &str) -> SopTemplate {
        let mut template = SopTemplate::new(name);
        template.description = description.to_string();
        template
    }

    fn new_instance(name: &str, description: &str, metadata: InstanceMetadata) -> MaterialInstance {
        let mut instance = MaterialInstance::new(name);
        instance.description = description.to_string();
        instance.metadata = metadata;
        instance
    }

    fn new_extra(store: &Arc<dyn DocumentStore>, name: &str) -> MaterialExtra {
        MaterialExtra {
            store: Arc::clone(store),
            volume: Some(Descriptor::new(
                Arc::clone(store),
                VopTemplate::new(name, VopKind::Opaque {}),
            )),
            released_volume: None,
        }
    }

    fn template_key(instance: &MaterialInstance) -> Option<DocumentKey> {
        instance.sop_guids.first().map(DocumentKey::from_raw)
    }

    fn bind_template(instance: &mut MaterialInstance, key: Option<&DocumentKey>) {
        instance.sop_guids = key.map(|key| key.to_string()).into_iter().collect();
    }

    fn load_extra(
        store: &Arc<dyn DocumentStore>,
        instance: &MaterialInstance,
        _template: &SopTemplate,
    ) -> FeatureResult<MaterialExtra> {
        let volume = match &instance.vop_guid {
            Some(key) => Some(Descriptor::load(
                Arc::clone(store),
                DocumentKey::from_raw(key.as_str()),
            )?),
            None => None,
        };
        Ok(MaterialExtra {
            store: Arc::clone(store),
            volume,
            released_volume: None,
        })
    }

    fn commit_extra(
        extra: &mut MaterialExtra,
        _template: &mut SopTemplate,
        instance: &mut MaterialInstance,
    ) -> FeatureResult<()> {
        instance.vop_guid = match &mut extra.volume {
            Some(volume) => {
                volume.commit()?;
                volume.key().map(DocumentKey::to_string)
            }
            None => None,
        };
        Ok(())
    }

    fn after_commit(extra: &mut MaterialExtra, _template: &SopTemplate) -> FeatureResult<()> {
        if let Some(link) = &extra.released_volume {
            delete_released(link)?;
        }
        extra.released_volume = None;
        Ok(())
    }

    fn reset_extra(extra: &mut MaterialExtra) -> FeatureResult<()> {
        if let Some(link) = extra.released_volume.take() {
            extra.volume = Some(Descriptor::from_link(link)?);
        } else if let Some(volume) = &mut extra.volume {
            volume.reset()?;
        }
        Ok(())
    }

    fn delete_extra(
        extra: &mut MaterialExtra,
        _template: &mut SopTemplate,
        instance: &mut MaterialInstance,
    ) -> FeatureResult<()> {
        if let Some(link) = extra.released_volume.take() {
            delete_released(&link)?;
        }
        if let Some(volume) = &mut extra.volume {
            volume.delete()?;
        }
        instance.vop_guid = None;
        Ok(())
    }

    fn project_drafts(
        tree: &mut Map<String, Value>,
        template: &Descriptor<SopTemplate>,
        extra: &MaterialExtra,
        projector: &Projector<'_>,
    ) -> FeatureResult<()> {
        if !tree.contains_key("sops") {
            tree.insert(
                "sops".to_string(),
                Value::Array(vec![template.resolved(projector)?]),
            );
        }
        if let (false, Some(volume)) = (tree.contains_key("vop"), &extra.volume) {
            tree.insert("vop".to_string(), volume.resolved(projector)?);
        }
        Ok(())
    }
}

impl Feature<MaterialKind> {
    pub fn sop(&self) -> &SopKind {
        &self.template().kind
    }

    pub fn set_sop_mirror(&mut self, reflectance: f64) -> &mut Self {
        self.template_mut().kind = SopKind::Mirror { reflectance };
        self
    }

    pub fn set_sop_optical_polished(&mut self) -> &mut Self {
        self.template_mut().kind = SopKind::OpticalPolished {};
        self
    }

    pub fn set_sop_library(&mut self, sop_file_uri: impl Into<String>) -> &mut Self {
        self.template_mut().kind = SopKind::Library {
            sop_file_uri: sop_file_uri.into(),
        };
        self
    }

    pub fn sop_reflectance(&self) -> FeatureResult<f64> {
        match &self.template().kind {
            SopKind::Mirror { reflectance } => Ok(*reflectance),
            other => Err(UsageError::wrong_mode("sop_reflectance", "mirror", other.label()).into()),
        }
    }

    /// Mirror only.
    pub fn set_sop_reflectance(&mut self, value: f64) -> FeatureResult<&mut Self> {
        match &mut self.template_mut().kind {
            SopKind::Mirror { reflectance } => *reflectance = value,
            other => {
                return Err(
                    UsageError::wrong_mode("set_sop_reflectance", "mirror", other.label()).into(),
                )
            }
        }
        Ok(self)
    }

    pub fn volume(&self) -> Option<&VopKind> {
        self.extra().volume().map(|volume| &volume.value().kind)
    }

    /// Surface-only material: the volume template is released on commit.
    pub fn set_volume_none(&mut self) -> &mut Self {
        self.extra_mut().drop_volume();
        self
    }

    pub fn set_volume_opaque(&mut self) -> &mut Self {
        self.set_volume(VopKind::Opaque {})
    }

    pub fn set_volume_optic(
        &mut self,
        index: f64,
        absorption: f64,
        constringence: Option<f64>,
    ) -> &mut Self {
        self.set_volume(VopKind::Optic {
            index,
            absorption,
            constringence,
        })
    }

    pub fn set_volume_library(&mut self, material_file_uri: impl Into<String>) -> &mut Self {
        self.set_volume(VopKind::Library {
            material_file_uri: material_file_uri.into(),
        })
    }

    fn set_volume(&mut self, kind: VopKind) -> &mut Self {
        let name = self.name().to_string();
        *self.extra_mut().volume_kind_mut(&name) = kind;
        self
    }

    pub fn geometries(&self) -> Option<Vec<GeoRef>> {
        self.instance().geometries.as_ref().map(GeoPaths::refs)
    }

    pub fn set_geometries<'a>(&mut self, geometries: impl IntoIterator<Item = &'a GeoRef>) -> &mut Self {
        self.instance_mut().geometries = Some(GeoPaths::from_refs(geometries));
        self
    }

    /// Leaves the material unapplied.
    pub fn clear_geometries(&mut self) -> &mut Self {
        self.instance_mut().geometries = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Material;
    use crate::feature::test_support::session;
    use crate::feature::FeatureError;
    use crate::model::material::{SopKind, VopKind};
    use crate::model::{DocumentKey, GeoRef, SceneEntry};
    use crate::repo::{DocumentStore, StoreError};
    use std::collections::BTreeMap;

    #[test]
    fn default_material_projects_as_local_draft() {
        let material = Material::new(session(), "Mirror", "", BTreeMap::new());
        let text = material.describe().expect("describe");
        assert!(text.starts_with("local: "));
        let tree = material.projection().expect("projection");
        assert_eq!(tree["sops"][0]["mirror"]["reflectance"], 100.0);
        assert!(tree["vop"]["opaque"].is_object());
    }

    #[test]
    fn reflectance_on_library_surface_is_usage_error() {
        let mut material = Material::new(session(), "Lib", "", BTreeMap::new());
        material.set_sop_library("file:///tmp/sop.scattering");
        let err = material.set_sop_reflectance(40.0).err().expect("usage error");
        assert!(matches!(err, FeatureError::Usage(ref usage) if usage.actual == "library"));
        assert!(material.sop_reflectance().is_err());
    }

    #[test]
    fn commit_binds_surface_and_volume_keys() {
        let mut material = Material::new(session(), "Glass", "", BTreeMap::new());
        material
            .set_sop_optical_polished()
            .set_volume_optic(1.7, 0.01, Some(55.0))
            .set_geometries([&GeoRef::from_native_link("Part/Body")]);
        material.commit().expect("commit");

        let entry = material.instance();
        assert_eq!(entry.sop_guids.len(), 1);
        assert!(entry.vop_guid.is_some());
        assert!(entry.unique_id().is_some());

        let tree = material.projection().expect("projection");
        assert_eq!(tree["vop"]["optic"]["index"], 1.7);
        assert!(tree["sops"][0]["optical_polished"].is_object());
    }

    #[test]
    fn dropping_volume_deletes_it_on_commit() {
        let mut material = Material::new(session(), "Paint", "", BTreeMap::new());
        material.commit().expect("first commit");
        let vop_key = material.instance().vop_guid.clone().expect("vop bound");

        material.set_volume_none();
        assert!(material.volume().is_none());
        material.commit().expect("second commit");
        assert!(material.instance().vop_guid.is_none());

        let store = material.session().store();
        let read = store.read(&DocumentKey::from_raw(vop_key));
        assert!(matches!(read, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn reset_restores_released_volume() {
        let mut material = Material::new(session(), "Paint", "", BTreeMap::new());
        material.set_volume_optic(1.4, 0.0, None);
        material.commit().expect("commit");

        material.set_volume_none().set_sop_mirror(20.0);
        material.reset().expect("reset");

        assert!(matches!(material.volume(), Some(VopKind::Optic { index, .. }) if *index == 1.4));
        assert_eq!(material.sop(), &SopKind::Mirror { reflectance: 100.0 });
    }

    #[test]
    fn rejected_commit_keeps_released_volume() {
        let mut material = Material::new(session(), "Paint", "", BTreeMap::new());
        material.set_volume_optic(1.4, 0.0, None);
        material.commit().expect("commit");
        let vop_key = material.instance().vop_guid.clone().expect("vop bound");

        material.set_volume_none().set_sop_mirror(120.0);
        let err = material.commit().expect_err("rejected");
        assert!(matches!(err, FeatureError::Store(StoreError::Rejected { .. })));

        let store = material.session().store();
        assert!(store.read(&DocumentKey::from_raw(vop_key.as_str())).is_ok());
        assert!(material.get("").expect("get").found().is_some());

        material.reset().expect("reset");
        assert!(material
            .extra()
            .volume()
            .is_some_and(|volume| volume.is_committed()));
        assert!(matches!(material.volume(), Some(VopKind::Optic { index, .. }) if *index == 1.4));
        assert_eq!(material.instance().vop_guid.as_deref(), Some(vop_key.as_str()));
    }

    #[test]
    fn rejected_reflectance_leaves_local_state() {
        let mut material = Material::new(session(), "Mirror", "", BTreeMap::new());
        material.set_sop_mirror(120.0);
        let err = material.commit().expect_err("rejected");
        assert!(matches!(err, FeatureError::Store(StoreError::Rejected { .. })));
        assert!(material.unique_id().is_none());
        assert_eq!(material.sop_reflectance().expect("mirror"), 120.0);

        material.set_sop_mirror(80.0);
        material.commit().expect("retry");
        assert_eq!(material.instance().name(), "Mirror");
    }
}
