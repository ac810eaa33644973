use crate::{BoundingBox, NodeSizes};
use mindmap_data::{Edge, ExpansionSet, MindMapNode, PositionedNode};
use serde::{Deserialize, Serialize};

/// Output of a layout pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Nodes in pre-order
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
    /// `None` when there is nothing to lay out
    pub bounds: Option<BoundingBox>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A layout engine that can compute positions for a forest of map nodes
///
/// Every call recomputes the whole layout from scratch, the result only
/// depends on the arguments.
pub trait LayoutEngine {
    fn layout<S>(&self, roots: &[MindMapNode], expanded: &ExpansionSet, sizes: &S) -> Layout
    where
        S: NodeSizes;
}
