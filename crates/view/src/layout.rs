use crate::RenderScene;
use mindmap_data::{ExpansionSet, GlobalMindMap};
use mindmap_sync::SyncState;
use std::sync::Arc;
use tracing::{debug, warn};
use tree_layout::{Layout, LayoutConfig};

/// The map as currently shown: the latest artifact, which nodes are
/// expanded, and the layout derived from both.
///
/// Any change recomputes the whole layout.
#[derive(Debug, Default)]
pub struct MapView {
    config: LayoutConfig,
    map: Option<Arc<GlobalMindMap>>,
    expanded: ExpansionSet,
    layout: Layout,
}

impl MapView {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn map(&self) -> Option<&GlobalMindMap> {
        self.map.as_deref()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn expanded(&self) -> &ExpansionSet {
        &self.expanded
    }

    /// Show a new version of the map. Nodes that are still present keep
    /// their expansion state.
    pub fn set_map(&mut self, map: Arc<GlobalMindMap>) {
        self.expanded.retain_present(&map);
        self.map = Some(map);
        self.relayout();
    }

    /// Pick up the map from a sync state. Returns whether the layout was
    /// recomputed, which only happens when the state carries another map
    /// than the one shown.
    ///
    /// A coordinator keeps the same allocation for as long as the content
    /// is unchanged, so this compares identity rather than revisions, which
    /// restart with every coordinator.
    pub fn apply_sync(&mut self, state: &SyncState) -> bool {
        let same = match (&state.data, &self.map) {
            (Some(incoming), Some(shown)) => Arc::ptr_eq(incoming, shown),
            (None, None) => true,
            _ => false,
        };
        if same {
            return false;
        }

        match &state.data {
            Some(map) => self.set_map(map.clone()),
            None => {
                self.map = None;
                self.relayout();
            }
        }
        true
    }

    /// Expand or collapse a node. Returns the new state, or `None` if the
    /// node isn't in the map.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        if self.map.as_ref().and_then(|m| m.find(id)).is_none() {
            warn!("Ignoring toggle of unknown node {id:?}");
            return None;
        }
        let expanded = self.expanded.toggle(id);
        self.relayout();
        Some(expanded)
    }

    /// What the canvas needs to draw the current layout
    pub fn scene(&self) -> RenderScene {
        match &self.map {
            Some(map) => RenderScene::build(map, &self.layout),
            None => RenderScene::default(),
        }
    }

    fn relayout(&mut self) {
        self.layout = match &self.map {
            Some(map) => self.config.layout(&map.roots, &self.expanded),
            None => Layout::default(),
        };
        debug!(
            "Relayout: {} nodes, {} expanded",
            self.layout.nodes.len(),
            self.expanded.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_data::{MindMapNode, PollResponse, PushEvent};
    use mindmap_sync::{merge, SyncMessage};
    use test_log::test;

    fn sample() -> GlobalMindMap {
        GlobalMindMap::from_roots(vec![MindMapNode::new("r", "Root").with_children([
            MindMapNode::new("a", "A").with_description("x".repeat(500)),
            MindMapNode::new("b", "B"),
        ])])
    }

    fn ready(map: GlobalMindMap) -> SyncMessage {
        SyncMessage::FromPoll(PollResponse {
            has_artifact_flow: true,
            is_ready: true,
            message: String::new(),
            data: Some(map),
        })
    }

    #[test]
    fn toggle_relayouts() {
        let mut view = MapView::default();
        view.set_map(Arc::new(sample()));
        let collapsed = view.layout().clone();

        assert_eq!(view.toggle("a"), Some(true));
        assert_ne!(view.layout(), &collapsed);
        assert!(view.layout().node("a").unwrap().is_expanded);

        assert_eq!(view.toggle("a"), Some(false));
        assert_eq!(view.layout(), &collapsed);
    }

    #[test]
    fn toggle_unknown_node_is_ignored() {
        let mut view = MapView::default();
        assert_eq!(view.toggle("a"), None);
        view.set_map(Arc::new(sample()));
        assert_eq!(view.toggle("zzz"), None);
        assert!(view.expanded().is_empty());
    }

    #[test]
    fn follows_sync_updates() {
        let mut view = MapView::default();
        let state = merge(&SyncState::default(), ready(sample())).state;
        assert!(view.apply_sync(&state));
        assert_eq!(view.layout().nodes.len(), 3);

        // Same map, nothing to do
        let state = merge(&state, SyncMessage::FromPush(PushEvent::message("still working"))).state;
        assert!(!view.apply_sync(&state));

        view.toggle("a");
        let mut grown = sample();
        grown.roots[0].children.push(MindMapNode::new("c", "C"));
        let state = merge(&state, ready(grown)).state;
        assert!(view.apply_sync(&state));
        assert_eq!(view.layout().nodes.len(), 4);
        assert!(view.expanded().is_expanded("a"));
    }

    #[test]
    fn picks_up_a_new_coordinator() {
        let mut view = MapView::default();
        let first = merge(&SyncState::default(), ready(GlobalMindMap::from_roots(vec![
            MindMapNode::new("old", "Old"),
        ])))
        .state;
        assert!(view.apply_sync(&first));

        // Revisions restart at 1 for a fresh coordinator
        let second = merge(&SyncState::default(), ready(GlobalMindMap::from_roots(vec![
            MindMapNode::new("new", "New"),
        ])))
        .state;
        assert_eq!(second.data_revision, first.data_revision);
        assert!(view.apply_sync(&second));
        assert_eq!(view.map().map(|m| m.roots[0].id.as_str()), Some("new"));
        assert!(view.layout().node("new").is_some());
    }

    #[test]
    fn cleared_data_empties_the_view() {
        let mut view = MapView::default();
        let state = merge(&SyncState::default(), ready(sample())).state;
        view.apply_sync(&state);

        assert!(view.apply_sync(&SyncState::default()));
        assert!(view.map().is_none());
        assert!(view.layout().is_empty());
        assert!(!view.apply_sync(&SyncState::default()));
    }

    #[test]
    fn vanished_nodes_lose_expansion() {
        let mut view = MapView::default();
        view.set_map(Arc::new(sample()));
        view.toggle("b");

        let mut pruned = sample();
        pruned.roots[0].children.pop();
        view.set_map(Arc::new(pruned));
        assert!(view.expanded().is_empty());
    }
}
