use derive_more::{Constructor, From};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use thiserror::Error;
use tracing::warn;

/// One topic of the map. A parent exclusively owns its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = MindMapNode>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// The description, if there is one worth showing. The generator writes
    /// empty strings for nodes whose description hasn't been produced yet.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including self
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::count).sum::<usize>()
    }

    /// Pre-order search by id
    pub fn find(&self, id: &str) -> Option<&MindMapNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// The whole artifact as served by the backend.
///
/// `user_id` and `thread_id` only correlate the artifact with its owner,
/// the layout never looks at them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Constructor)]
pub struct GlobalMindMap {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub thread_id: String,
    pub roots: Vec<MindMapNode>,
}

impl GlobalMindMap {
    pub fn from_roots(roots: Vec<MindMapNode>) -> Self {
        Self {
            roots,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(MindMapNode::count).sum()
    }

    pub fn find(&self, id: &str) -> Option<&MindMapNode> {
        self.roots.iter().find_map(|r| r.find(id))
    }
}

/// A node as emitted by the generator, before it is linked into a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("duplicate node id {0:?}")]
    DuplicateId(String),
}

/// Link a flat node list into a forest.
///
/// Nodes without a parent become roots, in list order. Children keep the
/// order in which they appear in the list. A node pointing at a parent that
/// doesn't exist is dropped along with its subtree.
pub fn build_tree(flat: Vec<FlatNode>) -> Result<Vec<MindMapNode>, TreeError> {
    let mut seen = HashSet::new();
    for node in &flat {
        if !seen.insert(node.id.clone()) {
            return Err(TreeError::DuplicateId(node.id.clone()));
        }
    }

    let mut roots = Vec::new();
    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    let mut nodes: HashMap<String, MindMapNode> = HashMap::new();

    for node in flat {
        match node.parent_id.filter(|p| !p.is_empty()) {
            Some(parent) if seen.contains(parent.as_str()) => {
                children.entry(parent).or_default().push(node.id.clone())
            }
            Some(parent) => {
                warn!("Dropping node {:?}, unknown parent {parent:?}", node.id);
                continue;
            }
            None => roots.push(node.id.clone()),
        }
        nodes.insert(
            node.id.clone(),
            MindMapNode {
                id: node.id,
                title: node.title,
                description: node.description,
                children: Vec::new(),
            },
        );
    }

    // Roots are the only entry points, anything not reachable from one of
    // them (parent cycles) is left out
    Ok(roots
        .into_iter()
        .filter_map(|id| assemble(&id, &mut nodes, &children))
        .collect())
}

fn assemble(
    id: &str,
    nodes: &mut HashMap<String, MindMapNode>,
    children: &HashMap<String, Vec<String>>,
) -> Option<MindMapNode> {
    let mut node = nodes.remove(id)?;
    if let Some(ids) = children.get(id) {
        node.children = ids
            .iter()
            .filter_map(|c| assemble(c, nodes, children))
            .collect();
    }
    Some(node)
}

/// Content hash of a payload, used to skip relayouts when a poll returns
/// the same artifact again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub struct PayloadHash(pub u64);

impl PayloadHash {
    pub fn new(t: impl Hash) -> Self {
        let mut s = std::hash::DefaultHasher::new();
        t.hash(&mut s);
        Self(s.finish())
    }
}
