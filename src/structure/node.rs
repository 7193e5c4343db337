use indexmap::IndexMap;
use indexmap::map::Entry;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ParityError, ParityResult};
use crate::extensions::{CreationEvent, ObserverRegistry};

use super::reference::{array_reference, object_reference, scalar_reference};
use super::ReferenceValue;

/// Type class of a scalar leaf. Only the class takes part in structural hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Null,
    Boolean,
    Number,
    Text,
}

impl ScalarKind {
    pub const ALL: [Self; 4] = [Self::Null, Self::Boolean, Self::Number, Self::Text];

    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean => 1,
            Self::Number => 2,
            Self::Text => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Number(OrderedFloat<f64>),
    Text(String),
}

impl ScalarValue {
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Null => ScalarKind::Null,
            Self::Bool(_) => ScalarKind::Boolean,
            Self::Number(_) => ScalarKind::Number,
            Self::Text(_) => ScalarKind::Text,
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Number(OrderedFloat(value))
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Number(OrderedFloat(value as f64))
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Scalar(ScalarValue),
    Object(IndexMap<String, HierarchyNode>),
    Array(Vec<HierarchyNode>),
}

/// Immutable hierarchy node with its reference value computed at construction.
///
/// Children are built before their parent, so every node's reference value
/// is derived from the already-known values of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct HierarchyNode {
    kind: NodeKind,
    reference: ReferenceValue,
}

impl HierarchyNode {
    #[must_use]
    pub fn scalar(value: impl Into<ScalarValue>) -> Self {
        let value = value.into();
        let reference = scalar_reference(value.kind());
        Self {
            kind: NodeKind::Scalar(value),
            reference,
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self::scalar(ScalarValue::Null)
    }

    /// Builds an object node; child names must be unique.
    pub fn object<K: Into<String>>(
        children: impl IntoIterator<Item = (K, HierarchyNode)>,
    ) -> ParityResult<Self> {
        let mut map = IndexMap::new();
        for (name, child) in children {
            match map.entry(name.into()) {
                Entry::Occupied(entry) => {
                    return Err(ParityError::DuplicateChild(entry.key().clone()));
                }
                Entry::Vacant(entry) => {
                    entry.insert(child);
                }
            }
        }
        Ok(Self::from_object_map(map))
    }

    #[must_use]
    pub fn empty_object() -> Self {
        Self::from_object_map(IndexMap::new())
    }

    #[must_use]
    pub fn array(children: impl IntoIterator<Item = HierarchyNode>) -> Self {
        let children: Vec<HierarchyNode> = children.into_iter().collect();
        let reference = array_reference(children.iter().map(|child| child.reference));
        Self {
            kind: NodeKind::Array(children),
            reference,
        }
    }

    fn from_object_map(children: IndexMap<String, HierarchyNode>) -> Self {
        let reference = object_reference(
            children
                .iter()
                .map(|(name, child)| (name.as_str(), child.reference)),
        );
        Self {
            kind: NodeKind::Object(children),
            reference,
        }
    }

    /// Builds a node tree from a parsed JSON document.
    ///
    /// Integers and floats share the `number` type class.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::null(),
            Value::Bool(flag) => Self::scalar(*flag),
            Value::Number(number) => Self::scalar(number.as_f64().unwrap_or(0.0)),
            Value::String(text) => Self::scalar(text.as_str()),
            Value::Array(items) => Self::array(items.iter().map(Self::from_json)),
            Value::Object(map) => Self::from_object_map(
                map.iter()
                    .map(|(name, child)| (name.clone(), Self::from_json(child)))
                    .collect(),
            ),
        }
    }

    pub fn from_json_str(input: &str) -> ParityResult<Self> {
        let value: Value = serde_json::from_str(input).map_err(|err| {
            ParityError::Serialization(format!("failed to parse hierarchy document: {err}"))
        })?;
        Ok(Self::from_json(&value))
    }

    /// Builds a node tree and reports it to the registered observers.
    #[must_use]
    pub fn from_json_observed(value: &Value, observers: &ObserverRegistry) -> Self {
        let node = Self::from_json(value);
        observers.notify(&CreationEvent::HierarchyBuilt {
            reference: node.reference,
            node_count: node.node_count(),
        });
        node
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match &self.kind {
            NodeKind::Scalar(ScalarValue::Null) => Value::Null,
            NodeKind::Scalar(ScalarValue::Bool(flag)) => Value::Bool(*flag),
            NodeKind::Scalar(ScalarValue::Number(number)) => {
                serde_json::Number::from_f64(number.into_inner()).map_or(Value::Null, Value::Number)
            }
            NodeKind::Scalar(ScalarValue::Text(text)) => Value::String(text.clone()),
            NodeKind::Object(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.to_json()))
                    .collect(),
            ),
            NodeKind::Array(children) => {
                Value::Array(children.iter().map(Self::to_json).collect())
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn reference_value(&self) -> ReferenceValue {
        self.reference
    }

    /// Structural interchangeability: equal reference values.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.reference == other.reference
    }

    /// Child of an object node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HierarchyNode> {
        match &self.kind {
            NodeKind::Object(children) => children.get(name),
            NodeKind::Scalar(_) | NodeKind::Array(_) => None,
        }
    }

    /// Element of an array node by position.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&HierarchyNode> {
        match &self.kind {
            NodeKind::Array(children) => children.get(index),
            NodeKind::Scalar(_) | NodeKind::Object(_) => None,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + match &self.kind {
            NodeKind::Scalar(_) => 0,
            NodeKind::Object(children) => children.values().map(Self::node_count).sum(),
            NodeKind::Array(children) => children.iter().map(Self::node_count).sum(),
        }
    }

    /// Depth of the tree; a lone scalar or empty container has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + match &self.kind {
            NodeKind::Scalar(_) => 0,
            NodeKind::Object(children) => children.values().map(Self::depth).max().unwrap_or(0),
            NodeKind::Array(children) => children.iter().map(Self::depth).max().unwrap_or(0),
        }
    }

    /// Short structural description used in diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            NodeKind::Scalar(value) => value.kind().as_str().to_owned(),
            NodeKind::Object(children) => format!("object(len={})", children.len()),
            NodeKind::Array(children) => format!("array(len={})", children.len()),
        }
    }
}

impl From<Value> for HierarchyNode {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<HierarchyNode> for Value {
    fn from(node: HierarchyNode) -> Self {
        node.to_json()
    }
}

/// Reference value of `node`.
#[must_use]
pub fn reference_value(node: &HierarchyNode) -> ReferenceValue {
    node.reference_value()
}

/// Recomputes the reference value by walking the whole tree, ignoring the
/// values cached on child nodes.
#[must_use]
pub fn recompute_reference_value(node: &HierarchyNode) -> ReferenceValue {
    match node.kind() {
        NodeKind::Scalar(value) => scalar_reference(value.kind()),
        NodeKind::Object(children) => object_reference(
            children
                .iter()
                .map(|(name, child)| (name.as_str(), recompute_reference_value(child))),
        ),
        NodeKind::Array(children) => {
            array_reference(children.iter().map(recompute_reference_value))
        }
    }
}
