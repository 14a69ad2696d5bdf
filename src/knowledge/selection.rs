use std::collections::BTreeSet;

use super::error::InputError;
use super::model::{Graph, NodeId};

/// Returns a new set with `id` added when absent, removed when present.
pub fn toggle(selected: &BTreeSet<NodeId>, id: &str) -> BTreeSet<NodeId> {
    let mut next = selected.clone();
    if !next.remove(id) {
        next.insert(id.to_owned());
    }
    next
}

/// Multi-select mode and the ids it has collected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    multi_select: bool,
    selected: BTreeSet<NodeId>,
}

impl SelectionState {
    pub fn is_active(&self) -> bool {
        self.multi_select
    }

    pub fn selected(&self) -> &BTreeSet<NodeId> {
        &self.selected
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Switches multi-select on, seeded with the node that triggered it.
    /// While already on, the node joins the current selection instead.
    pub fn enter(&mut self, id: &str) {
        if !self.multi_select {
            self.multi_select = true;
            self.selected.clear();
        }
        self.selected.insert(id.to_owned());
    }

    pub fn toggle(&mut self, id: &str) {
        self.selected = toggle(&self.selected, id);
    }

    pub fn exit(&mut self) {
        *self = Self::default();
    }

    /// Ids for a batch delete request.
    pub fn batch_delete_ids(&self) -> Result<Vec<NodeId>, InputError> {
        if self.selected.is_empty() {
            return Err(InputError::EmptySelection);
        }
        Ok(self.selected.iter().cloned().collect())
    }

    /// Forgets ids that no longer exist after a graph replacement.
    pub fn retain_existing(&mut self, graph: &Graph) {
        self.selected.retain(|id| graph.contains(id));
    }
}
