use optiscene_core::model::sensor::SensorInstance;
use optiscene_core::service::lock;
use optiscene_core::sync::SceneWrite;
use optiscene_core::{
    DocumentStore, FeatureRef, FeatureType, GeometryLevel, Project, SqliteDocumentStore,
    StoreError,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn store() -> Arc<dyn DocumentStore> {
    SqliteDocumentStore::open_in_memory().unwrap().into_shared()
}

fn names(hits: &[FeatureRef]) -> Vec<String> {
    hits.iter().map(FeatureRef::name).collect()
}

/// Scene with one material, two sensors, a root part and one entry that
/// was written without an identity.
fn populated_scene(store: &Arc<dyn DocumentStore>) -> Project {
    let mut project = Project::new(Arc::clone(store), "Bench").unwrap();
    let material = project.create_material("Glass", "", BTreeMap::new());
    lock(&material).set_volume_optic(1.5, 0.0, None).commit().unwrap();

    let first = project.create_sensor("Irradiance.1", "", BTreeMap::new());
    let second = project.create_sensor("Irradiance.2", "", BTreeMap::new());
    lock(&first).commit().unwrap();
    lock(&second).commit().unwrap();

    let part = project.create_root_part("Root", "", BTreeMap::new());
    {
        let mut part = lock(&part);
        part.create_body("Lens", "", BTreeMap::new())
            .create_face("Lens.Front", "")
            .set_vertices(vec![0., 0., 0., 1., 0., 0., 0., 1., 0.])
            .set_facets(vec![0, 1, 2])
            .set_normals(vec![0., 0., 1., 0., 0., 1., 0., 0., 1.]);
        part.commit().unwrap();
    }

    project
        .session()
        .modify_scene(|scene| {
            scene.sensors.push(SensorInstance::new("Legacy"));
            Ok::<_, StoreError>(((), SceneWrite::Required))
        })
        .unwrap();
    project
}

#[test]
fn open_seeds_features_and_stamps_identities_once() {
    let store = store();
    let created = populated_scene(&store);
    let key = created.scene_key().clone();

    let opened = Project::open(Arc::clone(&store), key.clone()).unwrap();
    assert_eq!(opened.materials().len(), 1);
    assert_eq!(opened.sensors().len(), 3);
    assert!(opened.root_part().is_some());

    let scene = opened.session().read_scene().unwrap();
    assert!(scene
        .sensors
        .iter()
        .all(|entry| entry.metadata.unique_id().is_some()));
    let legacy = lock(&opened.sensors()[2]);
    assert_eq!(legacy.name(), "Legacy");
    assert_eq!(
        legacy.unique_id(),
        scene.sensors[2].metadata.unique_id()
    );
    drop(legacy);

    let revision = opened.session().scene_link().revision().unwrap();
    let reopened = Project::open(Arc::clone(&store), key).unwrap();
    assert_eq!(
        reopened.session().scene_link().revision().unwrap(),
        revision
    );
}

#[test]
fn opened_material_keeps_its_volume() {
    let store = store();
    let created = populated_scene(&store);
    let opened = Project::open(Arc::clone(&store), created.scene_key().clone()).unwrap();

    let material = lock(&opened.materials()[0]);
    assert!(material.extra().volume().is_some_and(|volume| volume.is_committed()));
    let tree = material.projection().unwrap();
    assert_eq!(tree["vop"]["optic"]["index"], 1.5);
}

#[test]
fn find_orders_by_kind_scene_position_then_depth() {
    let store = store();
    let created = populated_scene(&store);
    let mut project = Project::open(Arc::clone(&store), created.scene_key().clone()).unwrap();
    project.create_sensor("Irradiance.0", "", BTreeMap::new());

    let hits = project.find("Irradiance.*", true, None).unwrap();
    assert_eq!(
        names(&hits),
        vec!["Irradiance.1", "Irradiance.2", "Irradiance.0"]
    );

    let hits = project.find("L.*", true, None).unwrap();
    assert_eq!(names(&hits), vec!["Legacy", "Lens", "Lens.Front"]);
    assert_eq!(
        hits.iter().map(FeatureRef::feature_type).collect::<Vec<_>>(),
        vec![FeatureType::Sensor, FeatureType::Body, FeatureType::Face]
    );
}

#[test]
fn find_by_geometry_level() {
    let store = store();
    let project = populated_scene(&store);

    let hits = project.find("Root", false, Some(FeatureType::Part)).unwrap();
    assert_eq!(hits.len(), 1);
    match &hits[0] {
        FeatureRef::Geometry { level, path, .. } => {
            assert_eq!(*level, GeometryLevel::Part);
            assert_eq!(path.depth(), 0);
        }
        other => panic!("unexpected hit: {other:?}"),
    }

    let faces = project.find("Lens.Front", false, Some(FeatureType::Face)).unwrap();
    match &faces[0] {
        FeatureRef::Geometry { part, path, .. } => {
            assert_eq!(path.to_native_link(), "Lens/Lens.Front");
            assert!(lock(part).face(path).is_some());
        }
        other => panic!("unexpected hit: {other:?}"),
    }

    assert!(project
        .find("Lens", false, Some(FeatureType::Face))
        .unwrap()
        .is_empty());
}

#[test]
fn project_display_renders_resolved_scene() {
    let store = store();
    let project = populated_scene(&store);
    let text = project.to_string();

    assert!(text.contains("\"Bench\""));
    assert!(text.contains("irradiance_sensor_template"));
    assert!(text.contains("part_guid"));
    assert!(!text.contains("Lens.Front"));
}
