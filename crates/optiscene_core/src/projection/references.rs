//! Inline resolution of `_guid` / `_guids` references.

use crate::model::DocumentKey;
use crate::repo::{DocumentStore, StoreResult};
use serde_json::{Map, Value};

pub const GUID_SUFFIX: &str = "_guid";
pub const GUIDS_SUFFIX: &str = "_guids";

/// Splices referenced documents next to their reference keys.
///
/// `x_guid` with a non-empty string gains a sibling `x` holding the
/// resolved document; `x_guids` with a non-empty list gains `xs`.
/// Reference keys stay in place. Keys listed in `ignore` are skipped at
/// every depth. Documents form a DAG, so the walk terminates.
pub fn resolve_references(
    store: &dyn DocumentStore,
    tree: &mut Value,
    ignore: &[String],
) -> StoreResult<()> {
    match tree {
        Value::Object(map) => resolve_object(store, map, ignore),
        Value::Array(items) => items
            .iter_mut()
            .try_for_each(|item| resolve_references(store, item, ignore)),
        _ => Ok(()),
    }
}

fn resolve_object(
    store: &dyn DocumentStore,
    map: &mut Map<String, Value>,
    ignore: &[String],
) -> StoreResult<()> {
    let mut spliced = Vec::new();

    for (key, value) in map.iter_mut() {
        if !ignore.iter().any(|ignored| ignored == key) {
            if let Some(stem) = key.strip_suffix(GUID_SUFFIX) {
                if let Some(guid) = value.as_str().filter(|guid| !guid.is_empty()) {
                    spliced.push((stem.to_string(), fetch(store, guid, ignore)?));
                }
            } else if let Some(stem) = key.strip_suffix(GUIDS_SUFFIX) {
                if let Some(guids) = value.as_array().filter(|guids| !guids.is_empty()) {
                    let documents = guids
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|guid| fetch(store, guid, ignore))
                        .collect::<StoreResult<Vec<_>>>()?;
                    spliced.push((format!("{stem}s"), Value::Array(documents)));
                }
            }
        }
        resolve_references(store, value, ignore)?;
    }

    for (key, document) in spliced {
        map.insert(key, document);
    }
    Ok(())
}

fn fetch(store: &dyn DocumentStore, guid: &str, ignore: &[String]) -> StoreResult<Value> {
    let mut document = store.read(&DocumentKey::from_raw(guid))?.body;
    resolve_references(store, &mut document, ignore)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::resolve_references;
    use crate::model::DocumentKind;
    use crate::repo::{DocumentStore, SqliteDocumentStore};
    use serde_json::json;

    #[test]
    fn guid_and_guid_list_are_spliced() {
        let store = SqliteDocumentStore::open_in_memory().expect("store");
        let sop = store
            .create(DocumentKind::SopTemplate, &json!({"name": "Mirror", "mirror": {"reflectance": 80.0}}))
            .expect("sop");
        let vop = store
            .create(DocumentKind::VopTemplate, &json!({"name": "Opaque", "opaque": {}}))
            .expect("vop");

        let mut tree = json!({
            "name": "Material.1",
            "vop_guid": vop.as_str(),
            "sop_guids": [sop.as_str()],
        });
        resolve_references(&store, &mut tree, &[]).expect("resolve");

        assert_eq!(tree["vop_guid"], json!(vop.as_str()));
        assert_eq!(tree["vop"]["name"], json!("Opaque"));
        assert_eq!(tree["sops"][0]["mirror"]["reflectance"], json!(80.0));
    }

    #[test]
    fn empty_and_ignored_references_are_left_alone() {
        let store = SqliteDocumentStore::open_in_memory().expect("store");
        let mut tree = json!({
            "part_guid": "not-a-key",
            "vop_guid": "",
            "sop_guids": [],
        });
        let before = tree.clone();
        resolve_references(&store, &mut tree, &["part_guid".to_string()]).expect("resolve");
        assert_eq!(tree, before);
    }
}
