use serde::{Deserialize, Serialize};

use super::{HierarchyNode, NodeKind};

/// First location where two hierarchies stop being structurally equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralDivergence {
    /// JSON-path style location, `$` being the root.
    pub path: String,
    pub expected: String,
    pub actual: String,
}

const ABSENT: &str = "absent";

/// Walks both trees top-down, descending only into children whose reference
/// values differ. Object children are visited in name order so the reported
/// location is deterministic.
#[must_use]
pub fn first_divergence(
    expected: &HierarchyNode,
    actual: &HierarchyNode,
) -> Option<StructuralDivergence> {
    divergence_at("$".to_owned(), expected, actual)
}

fn divergence_at(
    path: String,
    expected: &HierarchyNode,
    actual: &HierarchyNode,
) -> Option<StructuralDivergence> {
    if expected.is_equivalent(actual) {
        return None;
    }

    match (expected.kind(), actual.kind()) {
        (NodeKind::Object(expected_children), NodeKind::Object(actual_children)) => {
            let mut names: Vec<&String> = expected_children
                .keys()
                .chain(actual_children.keys())
                .collect();
            names.sort_unstable();
            names.dedup();

            for name in names {
                let child_path = format!("{path}.{name}");
                match (expected_children.get(name), actual_children.get(name)) {
                    (Some(left), Some(right)) => {
                        if let Some(found) = divergence_at(child_path, left, right) {
                            return Some(found);
                        }
                    }
                    (Some(left), None) => {
                        return Some(StructuralDivergence {
                            path: child_path,
                            expected: left.describe(),
                            actual: ABSENT.to_owned(),
                        });
                    }
                    (None, Some(right)) => {
                        return Some(StructuralDivergence {
                            path: child_path,
                            expected: ABSENT.to_owned(),
                            actual: right.describe(),
                        });
                    }
                    (None, None) => {}
                }
            }
            None
        }
        (NodeKind::Array(expected_items), NodeKind::Array(actual_items))
            if expected_items.len() == actual_items.len() =>
        {
            expected_items
                .iter()
                .zip(actual_items)
                .enumerate()
                .find_map(|(index, (left, right))| {
                    divergence_at(format!("{path}[{index}]"), left, right)
                })
        }
        _ => Some(StructuralDivergence {
            path,
            expected: expected.describe(),
            actual: actual.describe(),
        }),
    }
}
