use mindmap_data::MindMapNode;
use serde::{Deserialize, Serialize};

/// Trait for providing node heights during layout computation
pub trait NodeSizes {
    /// Height of `node` when drawn collapsed or expanded
    fn height(&self, node: &MindMapNode, expanded: bool) -> f32;
}

// Blanket implementation for closures
impl<F> NodeSizes for F
where
    F: Fn(&MindMapNode, bool) -> f32,
{
    fn height(&self, node: &MindMapNode, expanded: bool) -> f32 {
        self(node, expanded)
    }
}

/// Guesses how tall a node will render without measuring any text.
///
/// Collapsed nodes only show their title and get `collapsed_height`.
/// Expanded nodes get one `line_height` per `chars_per_line` characters of
/// description plus `expanded_padding`, clamped to `max_expanded_height`.
///
/// `max_expanded_height` must match the max height of the renderer's
/// scrollable description box. If the two drift apart the layout either
/// wastes space or lets expanded nodes overlap their neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeEstimator {
    pub collapsed_height: f32,
    pub chars_per_line: usize,
    pub line_height: f32,
    /// Title, margins and borders around the description text
    pub expanded_padding: f32,
    pub max_expanded_height: f32,
}

impl Default for SizeEstimator {
    fn default() -> Self {
        Self {
            collapsed_height: 70.0,
            chars_per_line: 40,
            line_height: 20.0,
            expanded_padding: 80.0,
            max_expanded_height: 400.0,
        }
    }
}

impl SizeEstimator {
    pub fn estimate(&self, node: &MindMapNode, expanded: bool) -> f32 {
        if !expanded {
            return self.collapsed_height;
        }
        let Some(description) = node.description() else {
            return self.collapsed_height;
        };

        let chars = description.chars().count();
        let lines = chars.div_ceil(self.chars_per_line.max(1));
        let height = self.expanded_padding + lines as f32 * self.line_height;

        height
            .min(self.max_expanded_height)
            .max(self.collapsed_height)
    }
}

impl NodeSizes for SizeEstimator {
    fn height(&self, node: &MindMapNode, expanded: bool) -> f32 {
        self.estimate(node, expanded)
    }
}
