use std::fmt::{Display, Formatter};

/// Invalid arguments passed to geometry constructors or detector configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A ray was constructed with a zero-length (or non-finite) direction
    ZeroDirection,
    /// Bounds were constructed with `min > max` on some axis
    InvertedBounds,
    /// An AABB expansion margin was negative or non-finite
    NegativeExpansion,
    /// An algorithm name did not match any detector
    UnknownAlgorithm
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Error::ZeroDirection => write!(f, "ray direction must be a non-zero, finite vector"),
            Error::InvertedBounds => write!(f, "bounds minimum must not exceed bounds maximum"),
            Error::NegativeExpansion => write!(f, "AABB expansion must be finite and non-negative"),
            Error::UnknownAlgorithm =>
                write!(f, "unknown algorithm (expected brute_force, dynamic_tree, sap or lazy_tree)")
        }
    }
}

impl std::error::Error for Error {}

/// A structural defect found by a tree's `validate()` pass
///
/// Each variant carries the arena index of the offending node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    RootHasParent(usize),
    DanglingChild(usize),
    MissingChild(usize),
    LeafHasChildren(usize),
    LeafHeight(usize),
    LeafWithoutItem(usize),
    BranchWithItem(usize),
    ParentMismatch(usize),
    BoundsNotUnion(usize),
    HeightMismatch(usize),
    Unbalanced(usize),
    LeafCount{expected: usize, actual: usize}
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            InvariantViolation::RootHasParent(node) => write!(f, "root node {} has a parent", node),
            InvariantViolation::DanglingChild(node) => write!(f, "node {} references a freed node", node),
            InvariantViolation::MissingChild(node) => write!(f, "branch node {} is missing a child", node),
            InvariantViolation::LeafHasChildren(node) => write!(f, "leaf node {} has a right child", node),
            InvariantViolation::LeafHeight(node) => write!(f, "leaf node {} has non-zero height", node),
            InvariantViolation::LeafWithoutItem(node) => write!(f, "leaf node {} carries no item", node),
            InvariantViolation::BranchWithItem(node) => write!(f, "branch node {} carries an item", node),
            InvariantViolation::ParentMismatch(node) => write!(f, "node {} does not point back to its parent", node),
            InvariantViolation::BoundsNotUnion(node) => write!(f, "bounds of node {} are not the union of its children", node),
            InvariantViolation::HeightMismatch(node) => write!(f, "height of node {} is inconsistent with its children", node),
            InvariantViolation::Unbalanced(node) => write!(f, "children of node {} differ in height by more than one", node),
            InvariantViolation::LeafCount{expected, actual} =>
                write!(f, "tree holds {} leaves, expected {}", actual, expected)
        }
    }
}

impl std::error::Error for InvariantViolation {}
