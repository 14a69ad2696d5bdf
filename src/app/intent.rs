use std::sync::Arc;

use log::{debug, info, warn};

use crate::knowledge::{
    GraphError, GraphLink, Mutation, NodeId, NodePayload, Pin, mutate_and_reload,
};

use super::render::Theme;
use super::{Status, ViewModel, spawn_worker};

/// Everything a widget can ask for. Widgets only send intents; the view
/// model applies them once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    SubmitAnalysis,
    Reload,
    FocusNode(NodeId),
    ClearFocus,
    EnterMultiSelect(NodeId),
    ToggleSelected(NodeId),
    ExitMultiSelect,
    BatchDelete,
    DeleteNode(NodeId),
    UpdateNode {
        id: NodeId,
        label: String,
        summary: String,
    },
    CreateLink {
        source: NodeId,
        target: NodeId,
        relation: String,
    },
    PinNode {
        id: NodeId,
        pin: Pin,
    },
    HighlightTag(Option<String>),
    ToggleTag(String),
    SetTheme(Theme),
    ToggleTheme,
}

impl ViewModel {
    pub(in crate::app) fn emit(&self, intent: Intent) {
        // The receiver lives as long as `self`.
        let _ = self.intents_tx.send(intent);
    }

    /// Applies every intent queued during this frame.
    pub(in crate::app) fn drain_intents(&mut self) {
        let queued = self.intents_rx.try_iter().collect::<Vec<_>>();
        for intent in queued {
            debug!("intent {intent:?}");
            if let Err(error) = self.handle_intent(intent) {
                warn!("{error}");
                self.status = Some(Status::Error(error.to_string()));
            }
        }
    }

    pub(in crate::app) fn handle_intent(&mut self, intent: Intent) -> Result<(), GraphError> {
        match intent {
            Intent::SubmitAnalysis => {
                let text = self.session.begin_analysis(&self.editor_text)?;
                let backend = Arc::clone(&self.backend);
                info!("submitting note for analysis ({} chars)", text.chars().count());
                self.requests.analysis = Some(spawn_worker(move || backend.analyze(&text)));
                self.status = Some(Status::Info("Analyzing note...".to_owned()));
            }
            Intent::Reload => self.start_reload(),
            Intent::FocusNode(id) => self.session.focus_node(&id)?,
            Intent::ClearFocus => self.session.clear_focus(),
            Intent::EnterMultiSelect(id) => self.session.enter_multi_select(&id)?,
            Intent::ToggleSelected(id) => self.session.toggle_selected(&id),
            Intent::ExitMultiSelect => self.session.exit_multi_select(),
            Intent::BatchDelete => {
                let mutation = self.session.begin_batch_delete()?;
                self.start_mutation(mutation);
            }
            Intent::DeleteNode(id) => {
                let mutation = self.session.begin_mutation(Mutation::DeleteNode(id))?;
                self.start_mutation(mutation);
            }
            Intent::UpdateNode { id, label, summary } => {
                let fields = self
                    .session
                    .graph()
                    .node(&id)
                    .map(|node| NodePayload {
                        label: label.trim().to_owned(),
                        summary: Some(summary.trim().to_owned()).filter(|text| !text.is_empty()),
                        ..node.to_payload()
                    })
                    .unwrap_or_default();
                let mutation = self
                    .session
                    .begin_mutation(Mutation::UpdateNode { id, fields })?;
                self.start_mutation(mutation);
            }
            Intent::CreateLink {
                source,
                target,
                relation,
            } => {
                let link = GraphLink::new(source, target.trim(), relation.trim());
                let mutation = self.session.begin_mutation(Mutation::CreateLink(link))?;
                self.start_mutation(mutation);
            }
            Intent::PinNode { id, pin } => {
                self.session.pin_node(&id, pin)?;
                self.positions.insert(id.clone(), pin);
                self.store.save(&id, pin.x, pin.y)?;
            }
            Intent::HighlightTag(tag) => self.session.set_highlighted_tag(tag),
            Intent::ToggleTag(tag) => self.session.toggle_highlighted_tag(&tag),
            Intent::SetTheme(theme) => self.theme = theme,
            Intent::ToggleTheme => self.theme = self.theme.toggled(),
        }
        Ok(())
    }

    fn start_mutation(&mut self, mutation: Mutation) {
        info!("starting {}", mutation.describe());
        let backend = Arc::clone(&self.backend);
        self.requests.mutation = Some(spawn_worker(move || {
            mutate_and_reload(backend.as_ref(), mutation)
        }));
        self.status = Some(Status::Info("Saving...".to_owned()));
    }

    fn start_reload(&mut self) {
        if self.requests.reload.is_some() {
            return;
        }
        let backend = Arc::clone(&self.backend);
        self.requests.reload = Some(spawn_worker(move || backend.fetch_full_graph()));
    }
}
