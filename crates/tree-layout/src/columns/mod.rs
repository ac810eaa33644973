mod collisions;
mod placement;
mod sizing;

use crate::{BoundingBox, Layout, LayoutEngine, NodeSizes, Point, Vec2};
use mindmap_data::{Edge, ExpansionSet, MindMapNode, PositionedNode};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use collisions::resolve_collisions;
use placement::{place_bands, recenter_parents};
use sizing::compute_required_heights;

/// Configuration for the column tree layout
///
/// Each depth gets its own column, children stack vertically to the right
/// of their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    /// Position of the first root
    pub base: Point,

    /// Horizontal distance between two consecutive depths
    pub level_spacing: f32,

    /// Minimum vertical gap between two nodes of the same column
    pub min_gap: f32,

    /// Band reserved for a leaf, even if it draws smaller
    pub min_leaf_height: f32,

    /// Width of a drawn node, only used for the bounding box
    pub node_width: f32,

    /// Extra room around the nodes in the bounding box
    pub bounds_margin: f32,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            base: Point::new(0.0, 0.0),
            level_spacing: 350.0,
            min_gap: 10.0,
            min_leaf_height: 70.0,
            node_width: 280.0,
            bounds_margin: 100.0,
        }
    }
}

/// Per node scratch data for one layout pass
#[derive(Debug)]
pub(crate) struct Slot<'a> {
    pub node: &'a MindMapNode,
    pub parent: Option<usize>,
    pub level: usize,
    pub expanded: bool,
    /// Height of the node itself
    pub height: f32,
    /// Height of the band the subtree needs
    pub required: f32,
    pub x: f32,
    pub y: f32,
}

/// The flattened forest. Slots are stored in pre-order, so a parent always
/// comes before its children and walking the slots backwards is bottom-up.
#[derive(Debug)]
pub(crate) struct Arena<'a> {
    pub slots: Vec<Slot<'a>>,
    /// Parent to child links, in child order
    pub graph: DiGraphMap<usize, ()>,
    pub roots: Vec<usize>,
    /// Slot indices per depth, in pre-order
    pub levels: Vec<Vec<usize>>,
}

impl<'a> Arena<'a> {
    fn build<S>(roots: &'a [MindMapNode], expanded: &ExpansionSet, sizes: &S) -> Self
    where
        S: NodeSizes,
    {
        let mut arena = Arena {
            slots: Vec::new(),
            graph: DiGraphMap::new(),
            roots: Vec::new(),
            levels: Vec::new(),
        };

        let mut stack: Vec<(&MindMapNode, Option<usize>, usize)> =
            roots.iter().rev().map(|r| (r, None, 0)).collect();

        while let Some((node, parent, level)) = stack.pop() {
            let index = arena.slots.len();
            let is_expanded = expanded.is_expanded(&node.id);
            arena.slots.push(Slot {
                node,
                parent,
                level,
                expanded: is_expanded,
                height: sizes.height(node, is_expanded),
                required: 0.0,
                x: 0.0,
                y: 0.0,
            });
            arena.graph.add_node(index);
            match parent {
                Some(parent) => {
                    arena.graph.add_edge(parent, index, ());
                }
                None => arena.roots.push(index),
            }
            if arena.levels.len() <= level {
                arena.levels.resize_with(level + 1, Vec::new);
            }
            arena.levels[level].push(index);

            stack.extend(node.children.iter().rev().map(|c| (c, Some(index), level + 1)));
        }

        arena
    }

    /// Children of a slot, in tree order
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph.neighbors_directed(index, Direction::Outgoing)
    }
}

impl ColumnLayout {
    fn bounds(&self, arena: &Arena<'_>) -> Option<BoundingBox> {
        arena
            .slots
            .iter()
            .map(|slot| {
                BoundingBox::around(
                    Point::new(slot.x, slot.y),
                    Vec2::new(self.node_width, slot.height),
                )
            })
            .reduce(BoundingBox::union)
            .map(|bb| bb.expand(self.bounds_margin))
    }
}

impl LayoutEngine for ColumnLayout {
    fn layout<S>(&self, roots: &[MindMapNode], expanded: &ExpansionSet, sizes: &S) -> Layout
    where
        S: NodeSizes,
    {
        let mut arena = Arena::build(roots, expanded, sizes);
        if arena.slots.is_empty() {
            return Layout::default();
        }

        compute_required_heights(&mut arena, self.min_leaf_height, self.min_gap);
        place_bands(&mut arena, self.base, self.level_spacing, self.min_gap);
        resolve_collisions(&mut arena, self.min_gap);
        recenter_parents(&mut arena);
        // Recentering can pull a parent back into its neighbour, one more
        // pass fixes that. Deep and wide trees may still end up with parents
        // slightly off the center of their children.
        resolve_collisions(&mut arena, self.min_gap);

        let bounds = self.bounds(&arena);

        let nodes = arena
            .slots
            .iter()
            .map(|slot| PositionedNode {
                id: slot.node.id.clone(),
                x: slot.x,
                y: slot.y,
                level: slot.level,
                is_expanded: slot.expanded,
                height: slot.height,
            })
            .collect::<Vec<_>>();

        let edges = arena
            .slots
            .iter()
            .filter_map(|slot| {
                let parent = &arena.slots[slot.parent?];
                Some(Edge {
                    source_id: parent.node.id.clone(),
                    target_id: slot.node.id.clone(),
                    level: slot.level,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            "Laid out {} nodes over {} levels",
            nodes.len(),
            arena.levels.len()
        );

        Layout {
            nodes,
            edges,
            bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SizeEstimator;
    use test_log::test;

    const EPS: f32 = 1e-3;

    fn leaf(id: &str) -> MindMapNode {
        MindMapNode::new(id, id.to_uppercase())
    }

    fn y_of(layout: &Layout, id: &str) -> f32 {
        layout.node(id).map(|n| n.y).unwrap()
    }

    fn layout(roots: &[MindMapNode], expanded: &ExpansionSet) -> Layout {
        ColumnLayout::default().layout(roots, expanded, &SizeEstimator::default())
    }

    fn wide_tree() -> Vec<MindMapNode> {
        let long = "word ".repeat(100);
        vec![
            MindMapNode::new("r", "Root").with_children([
                MindMapNode::new("a", "A").with_description(&long).with_children([
                    leaf("a1").with_description(&long),
                    leaf("a2"),
                    MindMapNode::new("a3", "A3").with_children([leaf("a31"), leaf("a32")]),
                ]),
                MindMapNode::new("b", "B").with_children([leaf("b1")]),
                MindMapNode::new("c", "C")
                    .with_description(&long)
                    .with_children([leaf("c1"), leaf("c2").with_description(&long), leaf("c3")]),
            ]),
            MindMapNode::new("s", "Second root").with_children([leaf("s1"), leaf("s2")]),
        ]
    }

    fn all_expanded(roots: &[MindMapNode]) -> ExpansionSet {
        fn walk(node: &MindMapNode, set: &mut ExpansionSet) {
            set.expand(node.id.clone());
            node.children.iter().for_each(|c| walk(c, set));
        }
        let mut set = ExpansionSet::new();
        roots.iter().for_each(|r| walk(r, &mut set));
        set
    }

    #[test]
    fn empty_input() {
        let out = layout(&[], &ExpansionSet::new());
        assert!(out.nodes.is_empty());
        assert!(out.edges.is_empty());
        assert!(out.bounds.is_none());
    }

    #[test]
    fn lone_root_sits_at_base() {
        let engine = ColumnLayout {
            base: Point::new(12.0, -40.0),
            ..Default::default()
        };
        let out = engine.layout(&[leaf("r")], &ExpansionSet::new(), &SizeEstimator::default());
        assert_eq!(out.nodes.len(), 1);
        assert_eq!(out.nodes[0].x, 12.0);
        assert_eq!(out.nodes[0].y, -40.0);
        assert_eq!(out.nodes[0].level, 0);
        assert!(out.edges.is_empty());
    }

    #[test]
    fn three_collapsed_children() {
        let roots = [MindMapNode::new("r", "Root").with_children([leaf("a"), leaf("b"), leaf("c")])];
        let out = layout(&roots, &ExpansionSet::new());

        let (a, b, c) = (y_of(&out, "a"), y_of(&out, "b"), y_of(&out, "c"));
        assert!((b - a - 80.0).abs() < EPS);
        assert!((c - b - 80.0).abs() < EPS);
        assert!((y_of(&out, "r") - (a + b + c) / 3.0).abs() < EPS);

        for id in ["a", "b", "c"] {
            let node = out.node(id).unwrap();
            assert_eq!(node.level, 1);
            assert_eq!(node.x, 350.0);
        }
    }

    #[test]
    fn edges_follow_the_tree() {
        let roots = [MindMapNode::new("r", "Root")
            .with_children([MindMapNode::new("a", "A").with_children([leaf("a1")]), leaf("b")])];
        let out = layout(&roots, &ExpansionSet::new());
        let edges: Vec<_> = out
            .edges
            .iter()
            .map(|e| (e.source_id.as_str(), e.target_id.as_str(), e.level))
            .collect();
        assert_eq!(edges, [("r", "a", 1), ("a", "a1", 2), ("r", "b", 1)]);
    }

    #[test]
    fn same_level_shares_a_column() {
        let roots = wide_tree();
        let out = layout(&roots, &all_expanded(&roots));
        for node in &out.nodes {
            assert_eq!(node.x, node.level as f32 * 350.0);
        }
    }

    #[test]
    fn same_level_nodes_never_overlap() {
        let roots = wide_tree();
        for expanded in [ExpansionSet::new(), all_expanded(&roots)] {
            let out = layout(&roots, &expanded);
            for a in &out.nodes {
                for b in out.nodes.iter().filter(|b| b.level == a.level && b.id != a.id) {
                    let distance = (a.y - b.y).abs();
                    let required = a.height / 2.0 + b.height / 2.0 + 10.0;
                    assert!(
                        distance + EPS >= required,
                        "{} and {} are {distance} apart, need {required}",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }

    #[test]
    fn bounds_contain_every_node() {
        let roots = wide_tree();
        let out = layout(&roots, &all_expanded(&roots));
        let bounds = out.bounds.unwrap();
        for node in &out.nodes {
            let extent = BoundingBox::around(Point::new(node.x, node.y), Vec2::new(280.0, node.height));
            assert!(bounds.contains(&extent), "{} is outside {bounds:?}", node.id);
        }
    }

    #[test]
    fn deterministic() {
        let roots = wide_tree();
        let expanded: ExpansionSet = ["a", "c2"].into_iter().collect();
        assert_eq!(layout(&roots, &expanded), layout(&roots, &expanded));
    }

    #[test]
    fn expand_then_collapse_restores_layout() {
        let roots = wide_tree();
        let mut expanded = ExpansionSet::new();
        let before = layout(&roots, &expanded);

        expanded.toggle("a1");
        let during = layout(&roots, &expanded);
        let a1 = during.node("a1").unwrap();
        assert!(a1.is_expanded);
        assert!(a1.height > before.node("a1").unwrap().height);
        assert_ne!(during, before);

        expanded.toggle("a1");
        assert_eq!(layout(&roots, &expanded), before);
    }

    #[test]
    fn expanding_a_child_keeps_sibling_order() {
        let description = "x".repeat(500);
        let roots = [MindMapNode::new("r", "Root").with_children([
            leaf("a"),
            leaf("b").with_description(&description),
            leaf("c"),
        ])];
        let collapsed = layout(&roots, &ExpansionSet::new());
        let expanded = layout(&roots, &["b"].into_iter().collect());

        let b = expanded.node("b").unwrap();
        assert!(b.is_expanded);
        assert_eq!(b.height, 80.0 + 13.0 * 20.0);

        for out in [&collapsed, &expanded] {
            assert!(y_of(out, "a") < y_of(out, "b"));
            assert!(y_of(out, "b") < y_of(out, "c"));
        }

        // b now needs 340 units, a and c are pushed apart around it
        let pitch_ab = y_of(&expanded, "b") - y_of(&expanded, "a");
        assert!((pitch_ab - (35.0 + 10.0 + 170.0)).abs() < EPS);
        assert!(pitch_ab > y_of(&collapsed, "b") - y_of(&collapsed, "a"));
    }

    #[test]
    fn roots_stack_without_overlap() {
        let roots = [
            MindMapNode::new("r1", "One").with_children([leaf("a"), leaf("b")]),
            leaf("r2"),
        ];
        let out = layout(&roots, &ExpansionSet::new());
        assert_eq!(out.nodes[0].id, "r1");
        assert!(y_of(&out, "r2") - y_of(&out, "r1") >= 70.0 + 10.0 - EPS);
        assert_eq!(y_of(&out, "r1"), 0.0);
    }

    #[test]
    fn tall_parent_reserves_its_own_band() {
        let description = "x".repeat(2000);
        let roots = [MindMapNode::new("r", "Root").with_children([
            MindMapNode::new("p", "Parent")
                .with_description(&description)
                .with_children([leaf("p1")]),
            leaf("q"),
        ])];
        let out = layout(&roots, &["p"].into_iter().collect());
        // p is 400 tall, q must clear its bottom edge
        assert!(y_of(&out, "q") - y_of(&out, "p") >= 200.0 + 35.0 + 10.0 - EPS);
        assert!((y_of(&out, "p1") - y_of(&out, "p")).abs() < EPS);
    }

    mod properties {
        use super::layout;
        use crate::{BoundingBox, Layout, Point, Vec2};
        use mindmap_data::{ExpansionSet, MindMapNode};
        use proptest::prelude::*;

        // Coordinates reach the tens of thousands, where f32 steps are ~1e-3
        const TOLERANCE: f32 = 1e-2;

        /// Random forest in pre-order with a random expansion set. Each node
        /// either starts a new root or hangs under an earlier node.
        fn arb_forest() -> impl Strategy<Value = (Vec<MindMapNode>, ExpansionSet)> {
            let node = (any::<prop::sample::Index>(), 0usize..600, any::<bool>());
            prop::collection::vec(node, 1..40).prop_map(|specs| {
                let mut parents = Vec::with_capacity(specs.len());
                let mut slots = Vec::with_capacity(specs.len());
                let mut expanded = ExpansionSet::new();

                for (i, (parent, description, expand)) in specs.into_iter().enumerate() {
                    let id = format!("n{i}");
                    let pick = parent.index(i + 1);
                    parents.push((pick < i).then_some(pick));

                    let mut node = MindMapNode::new(id.clone(), id.to_uppercase());
                    if description > 0 {
                        node = node.with_description("x".repeat(description));
                    }
                    if expand {
                        expanded.expand(id);
                    }
                    slots.push(Some(node));
                }

                // Children always come after their parent, so walking backwards
                // moves complete subtrees
                let mut roots = Vec::new();
                for i in (0..slots.len()).rev() {
                    let Some(node) = slots[i].take() else { continue };
                    match parents[i].and_then(|p| slots[p].as_mut()) {
                        Some(parent) => parent.children.insert(0, node),
                        None => roots.insert(0, node),
                    }
                }
                (roots, expanded)
            })
        }

        fn overlaps(out: &Layout) -> Option<String> {
            for (i, a) in out.nodes.iter().enumerate() {
                for b in out.nodes[i + 1..].iter().filter(|b| b.level == a.level) {
                    let distance = (a.y - b.y).abs();
                    let required = a.height / 2.0 + b.height / 2.0 + 10.0;
                    if distance + TOLERANCE < required {
                        return Some(format!("{} and {}: {distance} < {required}", a.id, b.id));
                    }
                }
            }
            None
        }

        proptest! {
            #[test]
            fn layout_is_deterministic((roots, expanded) in arb_forest()) {
                prop_assert_eq!(layout(&roots, &expanded), layout(&roots, &expanded));
            }

            #[test]
            fn same_level_nodes_keep_their_gap((roots, expanded) in arb_forest()) {
                let out = layout(&roots, &expanded);
                prop_assert_eq!(overlaps(&out), None);
            }

            #[test]
            fn bounds_cover_every_node((roots, expanded) in arb_forest()) {
                let out = layout(&roots, &expanded);
                let bounds = out.bounds.unwrap();
                for node in &out.nodes {
                    let extent = BoundingBox::around(
                        Point::new(node.x, node.y),
                        Vec2::new(280.0, node.height),
                    );
                    prop_assert!(bounds.contains(&extent), "{} is outside {:?}", node.id, bounds);
                }
            }

            #[test]
            fn every_node_and_link_is_laid_out((roots, expanded) in arb_forest()) {
                let out = layout(&roots, &expanded);
                let total: usize = roots.iter().map(MindMapNode::count).sum();
                prop_assert_eq!(out.nodes.len(), total);
                prop_assert_eq!(out.edges.len(), total - roots.len());
                for node in &out.nodes {
                    prop_assert_eq!(node.is_expanded, expanded.is_expanded(&node.id));
                    prop_assert_eq!(node.x, node.level as f32 * 350.0);
                }
            }
        }
    }
}
