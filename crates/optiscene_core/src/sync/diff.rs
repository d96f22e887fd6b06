//! Change detection before remote writes.

/// Whether writing `new` over `old` would change anything.
pub fn differs<T: PartialEq + ?Sized>(old: &T, new: &T) -> bool {
    old != new
}

#[cfg(test)]
mod tests {
    use super::differs;
    use serde_json::json;

    #[test]
    fn equal_trees_do_not_differ() {
        let old = json!({"name": "Mirror", "mirror": {"reflectance": 100.0}});
        assert!(!differs(&old, &old.clone()));
        assert!(differs(
            &old,
            &json!({"name": "Mirror", "mirror": {"reflectance": 50.0}})
        ));
    }
}
