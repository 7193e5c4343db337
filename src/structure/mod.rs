//! Structural equivalence of hierarchical records.
//!
//! Two nodes are structurally interchangeable when their reference values
//! are equal: same type classes at the leaves, same child-name sets in
//! objects (in any order), same element order in arrays.

pub mod diff;
pub mod node;
pub mod reference;

pub use diff::{StructuralDivergence, first_divergence};
pub use node::{
    HierarchyNode, NodeKind, ScalarKind, ScalarValue, recompute_reference_value, reference_value,
};
pub use reference::ReferenceValue;
