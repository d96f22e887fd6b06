use optiscene_core::model::encode;
use optiscene_core::model::spectrum::SpectrumTemplate;
use optiscene_core::projection::{hoist_properties, resolve_references, Projector};
use optiscene_core::{
    best_match, find_by_key_suffix, DocumentKind, DocumentStore, ProjectionOptions,
    SqliteDocumentStore,
};
use serde_json::json;

#[test]
fn best_match_is_deterministic_for_surface_hint() {
    let tree = json!({
        "surface_properties": {"intensity_properties": {}},
        "exitance_constant_properties": {"geo_paths": []},
        "gaussian_properties": {"total_angle": 120.0},
    });

    for _ in 0..10 {
        let hit = best_match(&tree, "surface").unwrap();
        assert_eq!(hit.key, "surface_properties");
        assert_eq!(hit.path, ".surface_properties");
    }
}

#[test]
fn plain_document_projects_to_itself() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let original = json!({
        "name": "Plain",
        "values": [1, 2, {"name": "nested", "flag": true}],
        "settings": {"depth": 3},
    });

    let mut tree = original.clone();
    resolve_references(&store, &mut tree, &[]).unwrap();
    hoist_properties(&mut tree, &ProjectionOptions::default().hoist_denylist);
    assert_eq!(tree, original);
}

#[test]
fn projector_resolves_then_hoists() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let spectrum_key = store
        .create(
            DocumentKind::Spectrum,
            &encode(&SpectrumTemplate::new("Sun")).unwrap(),
        )
        .unwrap();

    let entry = json!({
        "name": "Lamp",
        "spectrum_guid": spectrum_key.as_str(),
        "luminaire": {"flux_from_file": {}},
        "luminaire_properties": {"axis_system": [0.0, 0.0, 0.0]},
        "lxp_properties": {"nb_max_paths": 10},
    });

    let options = ProjectionOptions::default();
    let projector = Projector::new(&store, &options);
    let tree = projector.project(entry).unwrap();

    assert_eq!(tree["spectrum_guid"], spectrum_key.as_str());
    assert_eq!(tree["spectrum"]["name"], "Sun");
    assert!(tree["luminaire"]["axis_system"].is_array());
    assert!(tree["luminaire"]["flux_from_file"].is_object());
    assert!(tree.get("luminaire_properties").is_none());
    assert_eq!(tree["lxp_properties"]["nb_max_paths"], 10);
    assert!(find_by_key_suffix(&tree, "_properties")
        .iter()
        .all(|hit| hit.key == "lxp_properties"));
}

#[test]
fn ignored_reference_is_left_as_key() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let options = ProjectionOptions::default().ignoring("part_guid");
    let projector = Projector::new(&store, &options);

    let tree = projector
        .project(json!({"name": "Scene", "part_guid": "not-fetched"}))
        .unwrap();
    assert_eq!(tree["part_guid"], "not-fetched");
    assert!(tree.get("part").is_none());
}
