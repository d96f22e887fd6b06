//! Breadth-first key search over projection trees.
//!
//! Paths render as `.key` per object level. Array items render as
//! `[.name='X']` when the item is an object with a string `name`, and as
//! `[i]` otherwise.

use super::similarity::similarity;
use serde_json::Value;
use std::collections::VecDeque;

/// One key found in a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyHit {
    pub path: String,
    pub key: String,
    pub value: Value,
}

/// Outcome of a projection lookup. A miss is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Value),
    Missing {
        key: String,
        known_keys: Vec<String>,
    },
}

impl Lookup {
    pub fn found(self) -> Option<Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

pub fn find_by_key(tree: &Value, key: &str) -> Vec<KeyHit> {
    search(tree, |candidate| candidate == key)
}

pub fn find_by_key_prefix(tree: &Value, prefix: &str) -> Vec<KeyHit> {
    search(tree, |candidate| candidate.starts_with(prefix))
}

pub fn find_by_key_suffix(tree: &Value, suffix: &str) -> Vec<KeyHit> {
    search(tree, |candidate| candidate.ends_with(suffix))
}

/// Prefix hit whose key is most similar to `key`; first hit wins ties.
pub fn best_match(tree: &Value, key: &str) -> Option<KeyHit> {
    let mut best: Option<(f64, KeyHit)> = None;
    for hit in find_by_key_prefix(tree, key) {
        let score = similarity(key, &hit.key);
        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            best = Some((score, hit));
        }
    }
    best.map(|(_, hit)| hit)
}

/// Empty `key` returns the whole tree; otherwise the best prefix match.
pub fn lookup(tree: Value, key: &str) -> Lookup {
    if key.is_empty() {
        return Lookup::Found(tree);
    }
    match best_match(&tree, key) {
        Some(hit) => Lookup::Found(hit.value),
        None => Lookup::Missing {
            key: key.to_string(),
            known_keys: flatten(&tree),
        },
    }
}

/// Paths of every leaf, in breadth-first order.
pub fn flatten(tree: &Value) -> Vec<String> {
    let mut leaves = Vec::new();
    let mut queue = VecDeque::from([(String::new(), tree)]);
    while let Some((path, value)) = queue.pop_front() {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, child) in map {
                    queue.push_back((format!("{path}.{key}"), child));
                }
            }
            Value::Array(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    queue.push_back((format!("{path}{}", item_segment(index, item)), item));
                }
            }
            _ => leaves.push(path),
        }
    }
    leaves
}

fn search(tree: &Value, matches: impl Fn(&str) -> bool) -> Vec<KeyHit> {
    let mut hits = Vec::new();
    let mut queue = VecDeque::from([(String::new(), tree)]);

    while let Some((path, value)) = queue.pop_front() {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = format!("{path}.{key}");
                    if matches(key) {
                        hits.push(KeyHit {
                            path: child_path,
                            key: key.clone(),
                            value: child.clone(),
                        });
                    } else if child.is_object() || child.is_array() {
                        queue.push_back((child_path, child));
                    }
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() || item.is_array() {
                        queue.push_back((format!("{path}{}", item_segment(index, item)), item));
                    }
                }
            }
            _ => {}
        }
    }
    hits
}

fn item_segment(index: usize, item: &Value) -> String {
    match item.get("name").and_then(Value::as_str) {
        Some(name) => format!("[.name='{name}']"),
        None => format!("[{index}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::{best_match, find_by_key, find_by_key_prefix, find_by_key_suffix, flatten, lookup, Lookup};
    use serde_json::json;

    fn source_tree() -> serde_json::Value {
        json!({
            "name": "Source.1",
            "surface_properties": {
                "exitance_constant_properties": {"geo_paths": []},
                "intensity_properties": {"gaussian_properties": {"axis_system": [0.0]}},
            },
        })
    }

    #[test]
    fn best_match_prefers_closest_prefix_hit() {
        let hit = best_match(&source_tree(), "surface").expect("surface hit");
        assert_eq!(hit.key, "surface_properties");
        assert_eq!(hit.path, ".surface_properties");
    }

    #[test]
    fn search_is_breadth_first_and_stops_at_matches() {
        let tree = json!({
            "a": {"name": {"deep": 1}},
            "name": "top",
        });
        let hits = find_by_key(&tree, "name");
        assert_eq!(
            hits.iter().map(|hit| hit.path.as_str()).collect::<Vec<_>>(),
            vec![".name", ".a.name"]
        );
    }

    #[test]
    fn suffix_search_collects_properties_blocks() {
        let hits = find_by_key_suffix(&source_tree(), "_properties");
        let keys = hits.iter().map(|hit| hit.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["surface_properties"]);
        assert!(find_by_key_prefix(&source_tree(), "gauss").len() == 1);
    }

    #[test]
    fn array_items_render_by_name() {
        let tree = json!({"sops": [{"name": "Mirror", "mirror": {"reflectance": 50.0}}, {"opaque": {}}]});
        let paths = find_by_key_prefix(&tree, "")
            .into_iter()
            .map(|hit| hit.path)
            .collect::<Vec<_>>();
        assert_eq!(paths, vec![".sops"]);

        let reflectance = find_by_key(&tree, "reflectance");
        assert_eq!(reflectance[0].path, ".sops[.name='Mirror'].mirror.reflectance");
        assert_eq!(find_by_key(&tree, "opaque")[0].path, ".sops[1].opaque");
    }

    #[test]
    fn miss_lists_known_keys() {
        match lookup(json!({"name": "Mirror", "sop": {"mirror": {}}}), "volume") {
            Lookup::Missing { key, known_keys } => {
                assert_eq!(key, "volume");
                assert_eq!(known_keys, vec![".name", ".sop.mirror"]);
            }
            Lookup::Found(value) => panic!("unexpected hit: {value}"),
        }
        assert!(lookup(json!({"name": "Mirror"}), "").is_found());
    }
}
