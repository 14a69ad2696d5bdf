use std::sync::Arc;

use log::{debug, info};

use super::backend::{Mutation, MutationReport};
use super::distance::{DistanceTable, FocusDistanceCache};
use super::error::{BackendError, InputError};
use super::merge::{MergeStats, PinnedPositions, from_snapshot, merge_with_stats};
use super::model::{AnalysisResult, Graph, GraphNode, GraphSnapshot, NodeId, Pin};
use super::selection::SelectionState;
use super::visibility::label_opacity;

/// Bounds applied to note text before it is sent for analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteLimits {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for NoteLimits {
    fn default() -> Self {
        Self {
            min_chars: 10,
            max_chars: 2000,
        }
    }
}

impl NoteLimits {
    pub fn check(&self, text: &str) -> Result<(), InputError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyNote);
        }
        if trimmed.chars().count() < self.min_chars {
            return Err(InputError::NoteTooShort { min: self.min_chars });
        }
        if text.chars().count() > self.max_chars {
            return Err(InputError::NoteTooLong { max: self.max_chars });
        }
        Ok(())
    }

    pub fn remaining(&self, text: &str) -> isize {
        self.max_chars as isize - text.chars().count() as isize
    }
}

/// Focus and distance data needed to decide label visibility for a frame.
#[derive(Clone, Copy, Debug)]
pub struct LabelContext<'a> {
    pub focused: Option<&'a str>,
    pub distances: &'a DistanceTable,
}

impl LabelContext<'_> {
    pub fn opacity(&self, node: &GraphNode) -> f32 {
        label_opacity(node, self.focused, self.distances)
    }
}

/// Everything the UI shows that is not layout: the current graph value and
/// the user's focus, selection and in-flight request flags.
///
/// The graph is only ever replaced, never edited in place, and every
/// replacement bumps `revision`.
#[derive(Debug, Default)]
pub struct GraphSession {
    graph: Arc<Graph>,
    revision: u64,
    focused: Option<NodeId>,
    selection: SelectionState,
    highlighted_tag: Option<String>,
    analyzing: bool,
    saving: bool,
    last_analysis: Option<AnalysisResult>,
    distances: FocusDistanceCache,
    limits: NoteLimits,
}

impl GraphSession {
    pub fn new(limits: NoteLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn limits(&self) -> NoteLimits {
        self.limits
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn focused_node(&self) -> Option<&GraphNode> {
        self.focused.as_deref().and_then(|id| self.graph.node(id))
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn highlighted_tag(&self) -> Option<&str> {
        self.highlighted_tag.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_analysis(&self) -> Option<&AnalysisResult> {
        self.last_analysis.as_ref()
    }

    /// Focus-dependent label data, recomputing distances only when the focus
    /// or the graph changed since the last call.
    pub fn label_context(&mut self) -> LabelContext<'_> {
        let distances = self
            .distances
            .table_for(&self.graph, self.revision, self.focused.as_deref());
        LabelContext {
            focused: self.focused.as_deref(),
            distances,
        }
    }

    /// Number of BFS rebuilds so far.
    pub fn distance_rebuilds(&self) -> usize {
        self.distances.rebuilds()
    }

    fn install(&mut self, graph: Graph) {
        self.graph = Arc::new(graph);
        self.revision += 1;

        if let Some(focused) = &self.focused
            && !self.graph.contains(focused)
        {
            debug!("focused node {focused} is gone, clearing focus");
            self.focused = None;
        }
        self.selection.retain_existing(&self.graph);
    }

    /// Merges an analysis result into the current graph.
    pub fn apply_analysis(&mut self, result: AnalysisResult, positions: &PinnedPositions) -> MergeStats {
        let (next, stats) = merge_with_stats(&self.graph, &result.graph, positions);
        self.install(next);
        self.last_analysis = Some(result);
        stats
    }

    /// Swaps in a full backend snapshot. Pins already held in memory win
    /// over stored ones.
    pub fn replace_graph(&mut self, snapshot: &GraphSnapshot, positions: &PinnedPositions) {
        let mut known = positions.clone();
        known.extend(
            self.graph
                .nodes()
                .filter_map(|node| node.pin.map(|pin| (node.id.clone(), pin))),
        );
        let next = from_snapshot(snapshot, &known);
        info!(
            "graph reloaded: {} nodes, {} links",
            next.node_count(),
            next.link_count()
        );
        self.install(next);
    }

    pub fn pin_node(&mut self, id: &str, pin: Pin) -> Result<(), InputError> {
        let next = self
            .graph
            .with_pin(id, pin)
            .ok_or_else(|| InputError::UnknownNode(id.to_owned()))?;
        self.install(next);
        Ok(())
    }

    pub fn focus_node(&mut self, id: &str) -> Result<(), InputError> {
        if !self.graph.contains(id) {
            return Err(InputError::UnknownNode(id.to_owned()));
        }
        self.focused = Some(id.to_owned());
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    pub fn enter_multi_select(&mut self, id: &str) -> Result<(), InputError> {
        if !self.graph.contains(id) {
            return Err(InputError::UnknownNode(id.to_owned()));
        }
        self.selection.enter(id);
        Ok(())
    }

    pub fn toggle_selected(&mut self, id: &str) {
        if self.selection.is_active() && self.graph.contains(id) {
            self.selection.toggle(id);
        }
    }

    pub fn exit_multi_select(&mut self) {
        self.selection.exit();
    }

    pub fn set_highlighted_tag(&mut self, tag: Option<String>) {
        self.highlighted_tag = tag.filter(|tag| !tag.is_empty());
    }

    /// Highlights `tag`, or clears the highlight when it is already active.
    pub fn toggle_highlighted_tag(&mut self, tag: &str) {
        if self.highlighted_tag.as_deref() == Some(tag) {
            self.highlighted_tag = None;
        } else {
            self.highlighted_tag = Some(tag.to_owned());
        }
    }

    /// Validates `text` and marks an analysis as running. Returns the text
    /// to send.
    pub fn begin_analysis(&mut self, text: &str) -> Result<String, InputError> {
        if self.analyzing {
            return Err(InputError::AnalysisInFlight);
        }
        self.limits.check(text)?;
        self.analyzing = true;
        Ok(text.to_owned())
    }

    pub fn finish_analysis(
        &mut self,
        outcome: Result<AnalysisResult, BackendError>,
        positions: &PinnedPositions,
    ) -> Result<MergeStats, BackendError> {
        self.analyzing = false;
        let result = outcome?;
        Ok(self.apply_analysis(result, positions))
    }

    /// Validates `mutation` against the current graph and marks it as in
    /// flight.
    pub fn begin_mutation(&mut self, mutation: Mutation) -> Result<Mutation, InputError> {
        if self.saving {
            return Err(InputError::MutationInFlight);
        }

        match &mutation {
            Mutation::UpdateNode { id, .. } | Mutation::DeleteNode(id) => {
                if !self.graph.contains(id) {
                    return Err(InputError::UnknownNode(id.clone()));
                }
            }
            Mutation::DeleteNodes(ids) => {
                if ids.is_empty() {
                    return Err(InputError::EmptySelection);
                }
            }
            Mutation::CreateLink(link) => {
                if link.relation.trim().is_empty() {
                    return Err(InputError::EmptyRelation);
                }
                for id in [&link.source, &link.target] {
                    if !self.graph.contains(id) {
                        return Err(InputError::UnknownNode(id.clone()));
                    }
                }
            }
        }

        self.saving = true;
        Ok(mutation)
    }

    /// Starts a batch delete of the current multi-selection.
    pub fn begin_batch_delete(&mut self) -> Result<Mutation, InputError> {
        let ids = self.selection.batch_delete_ids()?;
        self.begin_mutation(Mutation::DeleteNodes(ids))
    }

    /// Applies the outcome of a mutation. A failed mutation leaves every
    /// piece of state as it was. When the mutation landed but the reload
    /// failed, the old graph stays and the reload error is returned.
    pub fn finish_mutation(
        &mut self,
        outcome: Result<MutationReport, BackendError>,
        positions: &PinnedPositions,
    ) -> Result<(), BackendError> {
        self.saving = false;
        let MutationReport { mutation, reload } = outcome?;

        if mutation.is_batch_delete() {
            self.selection.exit();
            self.focused = None;
        } else if let Some(focused) = &self.focused
            && mutation.removed_ids().contains(focused)
        {
            self.focused = None;
        }

        let snapshot = reload?;
        self.replace_graph(&snapshot, positions);
        Ok(())
    }
}
