use optiscene_core::model::sensor::{IlluminanceType, SensorTemplateKind};
use optiscene_core::model::source::Flux;
use optiscene_core::service::lock;
use optiscene_core::sync::SceneWrite;
use optiscene_core::{
    DocumentStore, FeatureError, Project, Reconciliation, SqliteDocumentStore, StoreError,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn store() -> Arc<dyn DocumentStore> {
    SqliteDocumentStore::open_in_memory().unwrap().into_shared()
}

#[test]
fn commit_update_delete_scenario() {
    let mut project = Project::new(store(), "Scene").unwrap();
    let handle = project.create_sensor("Irradiance.1", "", BTreeMap::new());
    let mut sensor = lock(&handle);

    assert_eq!(sensor.commit().unwrap(), Reconciliation::Appended);
    let scene = project.session().read_scene().unwrap();
    assert_eq!(scene.sensors.len(), 1);
    assert_eq!(&scene.sensors[0], sensor.instance());

    let template_revision = sensor.template_link().unwrap().revision().unwrap();
    sensor
        .set_illuminance_type(IlluminanceType::Radial)
        .unwrap();
    assert_eq!(sensor.commit().unwrap(), Reconciliation::Unchanged);
    assert_eq!(
        sensor.template_link().unwrap().revision().unwrap(),
        template_revision + 1
    );
    assert_eq!(project.session().read_scene().unwrap().sensors.len(), 1);

    sensor.delete().unwrap();
    assert!(project.session().read_scene().unwrap().sensors.is_empty());
    assert!(sensor.unique_id().is_none());
    assert!(sensor.template_link().is_none());
    match &sensor.template().kind {
        SensorTemplateKind::Irradiance(template) => {
            assert_eq!(template.illuminance_type, IlluminanceType::Radial)
        }
        other => panic!("unexpected sensor template: {other:?}"),
    }
}

#[test]
fn unchanged_commit_writes_nothing() {
    let mut project = Project::new(store(), "Scene").unwrap();
    let handle = project.create_material("Paint", "", BTreeMap::new());
    let mut material = lock(&handle);
    material.commit().unwrap();

    let scene_revision = project.session().scene_link().revision().unwrap();
    let template_revision = material.template_link().unwrap().revision().unwrap();

    assert_eq!(material.commit().unwrap(), Reconciliation::Unchanged);
    assert_eq!(
        project.session().scene_link().revision().unwrap(),
        scene_revision
    );
    assert_eq!(
        material.template_link().unwrap().revision().unwrap(),
        template_revision
    );
}

#[test]
fn reset_discards_local_edits() {
    let mut project = Project::new(store(), "Scene").unwrap();
    let handle = project.create_source("Lamp", "", BTreeMap::new());
    let mut source = lock(&handle);
    source.commit().unwrap();
    let committed_instance = source.instance().clone();
    let committed_template = source.template().clone();

    source
        .set_axis_system(vec![1., 2., 3., 1., 0., 0., 0., 1., 0., 0., 0., 1.])
        .unwrap();
    source.set_flux(Flux::RadiantFlux { radiant_value: 5.0 });
    source.spectrum_mut().set_blackbody(3200.0);
    source.reset().unwrap();

    assert_eq!(source.instance(), &committed_instance);
    assert_eq!(source.template(), &committed_template);
    assert!(source.spectrum().describe().unwrap().contains("monochromatic"));
}

#[test]
fn features_with_same_name_keep_distinct_identities() {
    let mut project = Project::new(store(), "Scene").unwrap();
    let first = project.create_simulation("Sim", "", BTreeMap::new());
    let second = project.create_simulation("Sim", "", BTreeMap::new());
    lock(&first).commit().unwrap();
    lock(&second).commit().unwrap();

    let scene = project.session().read_scene().unwrap();
    assert_eq!(scene.simulations.len(), 2);
    assert_ne!(
        scene.simulations[0].metadata.unique_id(),
        scene.simulations[1].metadata.unique_id()
    );
}

#[test]
fn delete_of_vanished_entry_is_identity_mismatch() {
    let mut project = Project::new(store(), "Scene").unwrap();
    let handle = project.create_sensor("Camera", "", BTreeMap::new());
    let mut sensor = lock(&handle);
    sensor.set_camera();
    sensor.commit().unwrap();

    project
        .session()
        .modify_scene(|scene| {
            scene.sensors.clear();
            Ok::<_, StoreError>(((), SceneWrite::Required))
        })
        .unwrap();

    let err = sensor.delete().unwrap_err();
    assert!(matches!(err, FeatureError::IdentityMismatch { .. }));
    assert!(sensor.unique_id().is_some());
    assert!(sensor.template_link().is_some());
}

#[test]
fn rejected_commit_keeps_feature_uncommitted() {
    let mut project = Project::new(store(), "Scene").unwrap();
    let handle = project.create_source("Lamp", "", BTreeMap::new());
    let mut source = lock(&handle);
    source.set_flux(Flux::LuminousFlux {
        luminous_value: -1.0,
    });

    let err = source.commit().unwrap_err();
    assert!(matches!(
        err,
        FeatureError::Store(StoreError::Rejected { .. })
    ));
    assert!(source.unique_id().is_none());
    assert!(project.session().read_scene().unwrap().sources.is_empty());
    assert!(source.describe().unwrap().starts_with("local: "));
}

#[test]
fn get_reports_misses_with_known_keys() {
    let mut project = Project::new(store(), "Scene").unwrap();
    let handle = project.create_sensor("Irradiance", "", BTreeMap::new());
    let sensor = lock(&handle);

    let dimensions = sensor.get("dimensions").unwrap().found().unwrap();
    assert_eq!(dimensions["x_sampling"], 100);

    match sensor.get("no_such_field").unwrap() {
        optiscene_core::Lookup::Missing { key, known_keys } => {
            assert_eq!(key, "no_such_field");
            assert!(known_keys.iter().any(|path| path.ends_with(".name")));
        }
        optiscene_core::Lookup::Found(value) => panic!("unexpected hit: {value}"),
    }
}
