//! Layout for expandable knowledge map trees
//!
//! Nodes are placed in one column per depth, children stacked to the right
//! of their parent. Node heights come from a [`NodeSizes`] provider, the
//! default [`SizeEstimator`] guesses them from the description length so
//! that expanding a node makes room for its text.
//!
//! # Example
//!
//! ```
//! use mindmap_data::{ExpansionSet, MindMapNode};
//! use tree_layout::{ColumnLayout, LayoutEngine, SizeEstimator};
//!
//! let roots = vec![MindMapNode::new("root", "Topic").with_children([
//!     MindMapNode::new("a", "First"),
//!     MindMapNode::new("b", "Second").with_description("A longer text"),
//! ])];
//!
//! let mut expanded = ExpansionSet::new();
//! expanded.toggle("b");
//!
//! let engine = ColumnLayout::default();
//! let layout = engine.layout(&roots, &expanded, &SizeEstimator::default());
//! assert_eq!(layout.nodes.len(), 3);
//! assert_eq!(layout.edges.len(), 2);
//! ```

mod engine;
mod geometry;
mod sizes;

pub mod columns;

// Re-export core types and traits
pub use engine::{Layout, LayoutEngine};
pub use geometry::{BoundingBox, Point, Vec2};
pub use sizes::{NodeSizes, SizeEstimator};

pub use columns::ColumnLayout;

use serde::{Deserialize, Serialize};

/// Everything needed to lay out a map, loadable from a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub columns: ColumnLayout,
    pub sizes: SizeEstimator,
}

impl LayoutConfig {
    pub fn layout(
        &self,
        roots: &[mindmap_data::MindMapNode],
        expanded: &mindmap_data::ExpansionSet,
    ) -> Layout {
        self.columns.layout(roots, expanded, &self.sizes)
    }
}
