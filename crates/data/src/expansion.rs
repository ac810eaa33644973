use crate::GlobalMindMap;
use derive_more::{Deref, From, IntoIterator};
use std::collections::BTreeSet;

/// Ids of the nodes currently showing their full description.
///
/// Transient UI state, only changed by user interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From, IntoIterator)]
pub struct ExpansionSet(BTreeSet<String>);

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Flip a node between expanded and collapsed, returns the new state
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.to_string());
            true
        }
    }

    pub fn expand(&mut self, id: impl Into<String>) {
        self.0.insert(id.into());
    }

    pub fn collapse(&mut self, id: &str) {
        self.0.remove(id);
    }

    /// Forget ids that no longer exist in the given map
    pub fn retain_present(&mut self, map: &GlobalMindMap) {
        self.0.retain(|id| map.find(id).is_some());
    }
}

impl<S: Into<String>> FromIterator<S> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
