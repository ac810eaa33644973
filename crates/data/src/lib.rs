mod expansion;
mod tree;
mod wire;

pub use expansion::*;
pub use tree::*;
pub use wire::*;

// The derived layout types live next to the model so that the layout engine,
// the view and any renderer agree on them without depending on each other.

use serde::{Deserialize, Serialize};

/// A node after layout. Fully derived from the tree and the expansion set,
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub level: usize,
    pub is_expanded: bool,
    /// Estimated render height the layout reserved for the node itself
    pub height: f32,
}

/// Parent to child link, derived from the tree on every layout
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    /// Depth of the target node
    pub level: usize,
}
