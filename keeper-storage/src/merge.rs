//! JSON document merging used by the stores.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Fill every key missing from `partial` with the value from `defaults`.
///
/// Total by construction: a subtree whose JSON kind does not match the
/// default (e.g. a string where an object is expected) is replaced by the
/// default subtree, while the rest of the document is kept. A `null` default
/// marks a nullable field and accepts any stored value. Keys that only exist
/// in `partial` are preserved.
pub fn merge_defaults(partial: &Value, defaults: &Value) -> Value {
    match (partial, defaults) {
        (Value::Object(stored), Value::Object(default_fields)) => {
            let mut merged = Map::with_capacity(default_fields.len().max(stored.len()));

            for (key, default_value) in default_fields {
                let value = match stored.get(key) {
                    Some(stored_value) => merge_defaults(stored_value, default_value),
                    None => default_value.clone(),
                };
                merged.insert(key.clone(), value);
            }

            for (key, stored_value) in stored {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), stored_value.clone());
                }
            }

            Value::Object(merged)
        }
        (_, Value::Null) => partial.clone(),
        (stored, default_value) if same_kind(stored, default_value) => stored.clone(),
        (_, default_value) => default_value.clone(),
    }
}

/// Merge `patch` into `base` field by field.
///
/// Objects are merged recursively; any other patch value (including `null`
/// and arrays) replaces the existing one.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_fields), Value::Object(patch_fields)) => {
            for (key, patch_value) in patch_fields {
                let nested = patch_value.is_object()
                    && base_fields.get(key).is_some_and(Value::is_object);

                if nested {
                    if let Some(existing) = base_fields.get_mut(key) {
                        deep_merge(existing, patch_value);
                    }
                } else {
                    base_fields.insert(key.clone(), patch_value.clone());
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Reset every leaf of `document` that `T` cannot deserialize back to the
/// value found at the same place in `defaults`.
///
/// `defaults` must deserialize as `T`. Each leaf that differs from its default
/// is checked on its own by placing it into a copy of `defaults`, so one bad
/// value (an unparsable id, a negative count, a malformed timestamp) never
/// discards its siblings. Keys unknown to `defaults` are left alone. Returns
/// the JSON pointers of the leaves that were reset.
pub fn reset_invalid_leaves<T: DeserializeOwned>(document: &mut Value, defaults: &Value) -> Vec<String> {
    let mut pointers = Vec::new();
    collect_leaves(document, defaults, String::new(), &mut pointers);

    let mut reset = Vec::new();
    for pointer in pointers {
        let (Some(value), Some(default_value)) = (document.pointer(&pointer), defaults.pointer(&pointer))
        else {
            continue;
        };
        if value == default_value {
            continue;
        }

        let mut candidate = defaults.clone();
        if let Some(slot) = candidate.pointer_mut(&pointer) {
            *slot = value.clone();
        }
        if serde_json::from_value::<T>(candidate).is_ok() {
            continue;
        }

        let default_value = default_value.clone();
        if let Some(slot) = document.pointer_mut(&pointer) {
            *slot = default_value;
        }
        reset.push(pointer);
    }

    reset
}

fn collect_leaves(document: &Value, defaults: &Value, pointer: String, out: &mut Vec<String>) {
    let (Value::Object(fields), Value::Object(default_fields)) = (document, defaults) else {
        out.push(pointer);
        return;
    };

    for (key, value) in fields {
        let Some(default_value) = default_fields.get(key) else {
            continue;
        };
        let escaped = key.replace('~', "~0").replace('/', "~1");
        collect_leaves(value, default_value, format!("{pointer}/{escaped}"), out);
    }
}

fn same_kind(left: &Value, right: &Value) -> bool {
    matches!(
        (left, right),
        (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use serde::Deserialize;

    use super::{deep_merge, merge_defaults, reset_invalid_leaves};

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Limits {
        count: u32,
        label: Option<String>,
        nested: Nested,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Nested {
        ratio: u8,
    }

    #[test]
    fn fills_missing_nested_keys() {
        let defaults = json!({"a": {"b": 1, "c": {"d": true}}, "e": null});
        let partial = json!({"a": {"b": 5}});

        assert_eq!(
            merge_defaults(&partial, &defaults),
            json!({"a": {"b": 5, "c": {"d": true}}, "e": null})
        );
    }

    #[test]
    fn malformed_subtree_falls_back_to_its_default_only() {
        let defaults = json!({"settings": {"limit": 1}, "flag": false});
        let partial = json!({"settings": "oops", "flag": true});

        assert_eq!(
            merge_defaults(&partial, &defaults),
            json!({"settings": {"limit": 1}, "flag": true})
        );
    }

    #[test]
    fn nullable_defaults_accept_any_value() {
        let defaults = json!({"channel": null});
        assert_eq!(
            merge_defaults(&json!({"channel": "42"}), &defaults),
            json!({"channel": "42"})
        );
    }

    #[test]
    fn null_over_non_null_default_is_replaced() {
        let defaults = json!({"color": "#fff"});
        assert_eq!(
            merge_defaults(&json!({"color": null}), &defaults),
            json!({"color": "#fff"})
        );
    }

    #[test]
    fn unknown_keys_survive() {
        let defaults = json!({"known": 1});
        assert_eq!(
            merge_defaults(&json!({"extra": [1]}), &defaults),
            json!({"known": 1, "extra": [1]})
        );
    }

    #[test]
    fn non_object_document_becomes_defaults() {
        let defaults = json!({"known": 1});
        assert_eq!(merge_defaults(&json!([1, 2]), &defaults), defaults);
    }

    #[test]
    fn deep_merge_keeps_siblings() {
        let mut base = json!({"log": {"a": "1", "b": "2"}, "n": 3});
        deep_merge(&mut base, &json!({"log": {"b": null}}));
        assert_eq!(base, json!({"log": {"a": "1", "b": null}, "n": 3}));
    }

    #[test]
    fn deep_merge_replaces_arrays() {
        let mut base = json!({"staff": ["1", "2"]});
        deep_merge(&mut base, &json!({"staff": ["3"]}));
        assert_eq!(base, json!({"staff": ["3"]}));
    }

    #[test]
    fn invalid_leaves_reset_without_touching_siblings() {
        let defaults = json!({"count": 1, "label": null, "nested": {"ratio": 2}});
        let mut document =
            json!({"count": -1, "label": "kept", "nested": {"ratio": 1.5}, "extra": "x"});

        let reset = reset_invalid_leaves::<Limits>(&mut document, &defaults);

        assert_eq!(reset, ["/count", "/nested/ratio"]);
        assert_eq!(
            document,
            json!({"count": 1, "label": "kept", "nested": {"ratio": 2}, "extra": "x"})
        );
        let limits: Limits = serde_json::from_value(document).unwrap();
        assert_eq!((limits.count, limits.nested.ratio), (1, 2));
        assert_eq!(limits.label.as_deref(), Some("kept"));
    }

    #[test]
    fn valid_documents_are_untouched() {
        let defaults = json!({"count": 1, "label": null, "nested": {"ratio": 2}});
        let mut document = json!({"count": 9, "label": "x", "nested": {"ratio": 3}});

        assert!(reset_invalid_leaves::<Limits>(&mut document, &defaults).is_empty());
        assert_eq!(document["count"], json!(9));
    }

    #[test]
    fn wrongly_typed_nullable_leaf_resets_to_null() {
        let defaults = json!({"count": 1, "label": null, "nested": {"ratio": 2}});
        let mut document = json!({"count": 1, "label": 5, "nested": {"ratio": 2}});

        assert_eq!(reset_invalid_leaves::<Limits>(&mut document, &defaults), ["/label"]);
        assert_eq!(document["label"], json!(null));
    }
}
