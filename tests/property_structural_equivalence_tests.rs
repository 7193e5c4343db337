use proptest::prelude::*;
use series_parity::structure::{HierarchyNode, recompute_reference_value, reference_value};
use serde_json::{Map, Value, json};

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6f64..1.0e6).prop_map(|v| json!(v)),
        "[a-z]{0,8}".prop_map(Value::String),
    ]
}

fn document_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

/// Same structure, different scalar content within each type class.
fn perturb_scalars(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(flag) => Value::Bool(!flag),
        Value::Number(number) => json!(number.as_f64().unwrap_or(0.0) * 3.0 + 1.0),
        Value::String(text) => Value::String(format!("{text}-changed")),
        Value::Array(items) => Value::Array(items.iter().map(perturb_scalars).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), perturb_scalars(v)))
                .collect(),
        ),
    }
}

/// Rebuilds every object with its keys in reverse order.
fn reverse_object_keys(value: &Value) -> HierarchyNode {
    match value {
        Value::Object(map) => HierarchyNode::object(
            map.iter()
                .rev()
                .map(|(k, v)| (k.clone(), reverse_object_keys(v))),
        )
        .expect("json object keys are unique"),
        Value::Array(items) => HierarchyNode::array(items.iter().map(reverse_object_keys)),
        other => HierarchyNode::from_json(other),
    }
}

proptest! {
    #[test]
    fn reference_value_is_deterministic(doc in document_strategy()) {
        let a = HierarchyNode::from_json(&doc);
        let b = HierarchyNode::from_json(&doc);
        prop_assert_eq!(reference_value(&a), reference_value(&b));
        prop_assert_eq!(recompute_reference_value(&a), reference_value(&a));
    }

    #[test]
    fn reference_value_ignores_object_key_order(doc in document_strategy()) {
        let forward = HierarchyNode::from_json(&doc);
        let reversed = reverse_object_keys(&doc);
        prop_assert_eq!(reference_value(&forward), reference_value(&reversed));
    }

    #[test]
    fn reference_value_ignores_scalar_content(doc in document_strategy()) {
        let original = HierarchyNode::from_json(&doc);
        let perturbed = HierarchyNode::from_json(&perturb_scalars(&doc));
        prop_assert_eq!(reference_value(&original), reference_value(&perturbed));
    }

    #[test]
    fn adding_an_object_child_changes_reference(
        map in prop::collection::btree_map("[a-z]{1,6}", scalar_strategy(), 0..6),
        extra in scalar_strategy(),
    ) {
        let base = Value::Object(map.clone().into_iter().collect());
        let mut grown = map;
        grown.insert("zz_extra_child".to_owned(), extra);
        let grown = Value::Object(grown.into_iter().collect());
        prop_assert_ne!(
            reference_value(&HierarchyNode::from_json(&base)),
            reference_value(&HierarchyNode::from_json(&grown))
        );
    }

    #[test]
    fn swapping_distinct_array_elements_changes_reference(
        prefix in prop::collection::vec(scalar_strategy(), 0..4),
    ) {
        let mut forward = prefix.clone();
        forward.push(json!(1));
        forward.push(json!("text"));
        let mut swapped = prefix;
        swapped.push(json!("text"));
        swapped.push(json!(1));
        prop_assert_ne!(
            reference_value(&HierarchyNode::from_json(&Value::Array(forward))),
            reference_value(&HierarchyNode::from_json(&Value::Array(swapped)))
        );
    }
}
