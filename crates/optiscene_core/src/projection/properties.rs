//! Hoisting of `_properties` blocks into the sub-tree they configure.

use serde_json::Value;
use std::collections::VecDeque;

pub const PROPERTIES_SUFFIX: &str = "_properties";

#[derive(Debug)]
struct Node {
    pointer: String,
    parent: String,
    key: String,
    is_object: bool,
    in_properties: bool,
}

#[derive(Debug)]
struct Hoist {
    parent: String,
    key: String,
    properties: String,
    container: String,
}

/// Merges every `P_properties` object into the sub-tree keyed `P`, or
/// failing that the first key starting with `P`, then drops the block.
///
/// Containers are searched breadth first outside any `_properties` block.
/// Blocks without a container, and blocks named in `denylist`, stay where
/// they are. Inner blocks are hoisted before outer ones, so leftovers of an
/// inner block travel with its parent.
pub fn hoist_properties(tree: &mut Value, denylist: &[String]) {
    let nodes = collect_nodes(tree);
    let plans = nodes
        .iter()
        .filter(|node| node.is_object && !denylist.iter().any(|denied| *denied == node.key))
        .filter_map(|node| {
            let stem = node.key.strip_suffix(PROPERTIES_SUFFIX)?;
            if stem.is_empty() {
                return None;
            }
            let container = find_container(&nodes, node, stem)?;
            Some(Hoist {
                parent: node.parent.clone(),
                key: node.key.clone(),
                properties: node.pointer.clone(),
                container: container.pointer.clone(),
            })
        })
        .collect::<Vec<_>>();

    for plan in plans.iter().rev() {
        apply(tree, plan);
    }
}

fn find_container<'n>(nodes: &'n [Node], properties: &Node, stem: &str) -> Option<&'n Node> {
    let eligible = |node: &&Node| {
        node.is_object
            && !node.in_properties
            && !node.key.ends_with(PROPERTIES_SUFFIX)
            && !properties
                .pointer
                .starts_with(&format!("{}/", node.pointer))
    };
    nodes
        .iter()
        .filter(eligible)
        .find(|node| node.key == stem)
        .or_else(|| {
            nodes
                .iter()
                .filter(eligible)
                .find(|node| node.key.starts_with(stem))
        })
}

fn apply(tree: &mut Value, plan: &Hoist) {
    let Some(fields) = tree
        .pointer(&plan.properties)
        .and_then(Value::as_object)
        .cloned()
    else {
        return;
    };
    let Some(container) = tree
        .pointer_mut(&plan.container)
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    container.extend(fields);

    if let Some(parent) = tree.pointer_mut(&plan.parent).and_then(Value::as_object_mut) {
        parent.remove(&plan.key);
    }
}

fn collect_nodes(tree: &Value) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut queue = VecDeque::from([(String::new(), tree, false)]);

    while let Some((pointer, value, in_properties)) = queue.pop_front() {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_pointer = format!("{pointer}/{}", escape(key));
                    nodes.push(Node {
                        pointer: child_pointer.clone(),
                        parent: pointer.clone(),
                        key: key.clone(),
                        is_object: child.is_object(),
                        in_properties,
                    });
                    if child.is_object() || child.is_array() {
                        let nested = in_properties || key.ends_with(PROPERTIES_SUFFIX);
                        queue.push_back((child_pointer, child, nested));
                    }
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() || item.is_array() {
                        queue.push_back((format!("{pointer}/{index}"), item, in_properties));
                    }
                }
            }
            _ => {}
        }
    }
    nodes
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::hoist_properties;
    use serde_json::json;

    fn denylist() -> Vec<String> {
        vec!["lxp_properties".to_string()]
    }

    #[test]
    fn properties_merge_into_exact_container() {
        let mut tree = json!({
            "name": "Source.1",
            "source": {"surface": {"flux": 1.0, "exitance_constant": {}}},
            "surface_properties": {
                "exitance_constant_properties": {"geo_paths": ["Body.1/Face.1"]},
            },
        });
        hoist_properties(&mut tree, &denylist());

        assert_eq!(
            tree,
            json!({
                "name": "Source.1",
                "source": {"surface": {
                    "flux": 1.0,
                    "exitance_constant": {"geo_paths": ["Body.1/Face.1"]},
                }},
            })
        );
    }

    #[test]
    fn prefix_container_is_used_without_exact_match() {
        let mut tree = json!({
            "sensor": {"irradiance_sensor_template": {"dimensions": {}}},
            "irradiance_properties": {"axis_system": [0.0]},
            "lxp_properties": {"nb_max_paths": 100},
        });
        hoist_properties(&mut tree, &denylist());

        assert_eq!(
            tree["sensor"]["irradiance_sensor_template"]["axis_system"],
            json!([0.0])
        );
        assert!(tree.get("irradiance_properties").is_none());
        assert_eq!(tree["lxp_properties"], json!({"nb_max_paths": 100}));
    }

    #[test]
    fn block_without_container_stays() {
        let mut tree = json!({"luminaire_properties": {"axis_system": [1.0]}});
        let before = tree.clone();
        hoist_properties(&mut tree, &denylist());
        assert_eq!(tree, before);
    }

    #[test]
    fn tree_without_properties_is_unchanged() {
        let mut tree = json!({"name": "Mirror", "sops": [{"mirror": {"reflectance": 100.0}}]});
        let before = tree.clone();
        hoist_properties(&mut tree, &denylist());
        assert_eq!(tree, before);
    }
}
