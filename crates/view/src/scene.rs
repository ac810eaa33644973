use mindmap_data::{GlobalMindMap, MindMapNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tree_layout::{BoundingBox, Layout};

/// What a node shows on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePayload {
    pub title: String,
    pub description: Option<String>,
    pub level: usize,
    pub is_expanded: bool,
    pub has_children: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub payload: NodePayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub level: usize,
    pub stroke_width: f32,
    pub animated: bool,
}

impl EdgeStyle {
    /// Links thin out as the tree gets deeper
    pub fn for_level(level: usize) -> Self {
        Self {
            level,
            stroke_width: (3.0 - 0.5 * level.saturating_sub(1) as f32).max(1.0),
            animated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub style: EdgeStyle,
}

/// Node and edge lists handed to the canvas, plus the area it may pan over
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderScene {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub bounds: Option<BoundingBox>,
}

impl RenderScene {
    pub fn build(map: &GlobalMindMap, layout: &Layout) -> Self {
        let mut by_id = HashMap::new();
        let mut stack: Vec<&MindMapNode> = map.roots.iter().collect();
        while let Some(node) = stack.pop() {
            by_id.insert(node.id.as_str(), node);
            stack.extend(node.children.iter());
        }

        let nodes = layout
            .nodes
            .iter()
            .filter_map(|positioned| {
                let node = by_id.get(positioned.id.as_str())?;
                Some(RenderNode {
                    id: positioned.id.clone(),
                    x: positioned.x,
                    y: positioned.y,
                    payload: NodePayload {
                        title: node.title.clone(),
                        description: node.description().map(str::to_string),
                        level: positioned.level,
                        is_expanded: positioned.is_expanded,
                        has_children: !node.is_leaf(),
                    },
                })
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| RenderEdge {
                id: format!("{}->{}", edge.source_id, edge.target_id),
                source: edge.source_id.clone(),
                target: edge.target_id.clone(),
                style: EdgeStyle::for_level(edge.level),
            })
            .collect();

        Self {
            nodes,
            edges,
            bounds: layout.bounds,
        }
    }
}
