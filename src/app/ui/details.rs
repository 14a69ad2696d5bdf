use std::sync::Arc;

use eframe::egui::{self, RichText, Ui};

use super::super::{Intent, LinkForm, NodeForm, ViewModel};

impl ViewModel {
    /// Reloads the edit forms when the focus moved to another node.
    pub(in crate::app) fn sync_node_form(&mut self) {
        let focused = self.session.focused();
        if self.node_form.node.as_deref() == focused {
            return;
        }

        self.node_form = match self.session.focused_node() {
            Some(node) => NodeForm {
                node: Some(node.id.clone()),
                label: node.label.clone(),
                summary: node.summary.clone().unwrap_or_default(),
            },
            None => NodeForm::default(),
        };
        self.link_form = LinkForm::default();
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        let palette = self.theme.palette();
        ui.heading("Node details");
        ui.add_space(6.0);

        let graph = Arc::clone(self.session.graph());
        let Some(node) = self.session.focused_node().cloned() else {
            ui.label("Click a node in the graph to see its details.");
            return;
        };

        ui.label(RichText::new(node.display_name()).strong().size(16.0));
        ui.small(node.id.as_str());
        ui.horizontal(|ui| {
            ui.label(node.kind.label());
            if let Some(level) = node.level_label() {
                ui.separator();
                ui.label(level);
            }
        });
        if let Some(summary) = &node.summary {
            ui.add_space(4.0);
            ui.label(summary.as_str());
        }

        if !node.tags.is_empty() {
            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                for tag in &node.tags {
                    let active = self.session.highlighted_tag() == Some(tag.as_str());
                    if ui.selectable_label(active, format!("#{tag}")).clicked() {
                        self.emit(Intent::ToggleTag(tag.clone()));
                    }
                }
            });
        }

        if node.has_knowledge_gap() {
            ui.add_space(4.0);
            ui.label(RichText::new("Knowledge gap detected").color(palette.gap).strong());
            for gap in &node.knowledge_gaps {
                ui.label(format!("- {gap}"));
            }
        }
        if !node.recommendations.is_empty() {
            ui.label(RichText::new("Recommendations").strong());
            for recommendation in &node.recommendations {
                ui.label(format!("- {recommendation}"));
            }
        }

        let neighbors = graph.links_of(&node.id).count();
        ui.label(format!("Links: {neighbors}"));

        ui.separator();
        let saving = self.session.is_saving();
        ui.add_enabled_ui(!saving, |ui| {
            self.draw_edit_form(ui, &node.id);
            ui.separator();
            self.draw_link_form(ui, &node.id);
            ui.separator();

            ui.horizontal(|ui| {
                let selecting = self.session.selection().is_active();
                if ui
                    .add_enabled(!selecting, egui::Button::new("Select multiple"))
                    .on_hover_text("Start a multi-selection with this node.")
                    .clicked()
                {
                    self.emit(Intent::EnterMultiSelect(node.id.clone()));
                }
                if ui
                    .button(RichText::new("Delete node").color(palette.gap))
                    .on_hover_text("Delete this node and its links, then reload the graph.")
                    .clicked()
                {
                    self.emit(Intent::DeleteNode(node.id.clone()));
                }
            });
        });
    }

    fn draw_edit_form(&mut self, ui: &mut Ui, id: &str) {
        ui.label(RichText::new("Edit").strong());
        ui.label("Label");
        ui.text_edit_singleline(&mut self.node_form.label);
        ui.label("Summary");
        ui.add(
            egui::TextEdit::multiline(&mut self.node_form.summary)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        let can_save = !self.node_form.label.trim().is_empty();
        if ui.add_enabled(can_save, egui::Button::new("Save changes")).clicked() {
            self.emit(Intent::UpdateNode {
                id: id.to_owned(),
                label: self.node_form.label.clone(),
                summary: self.node_form.summary.clone(),
            });
        }
    }

    fn draw_link_form(&mut self, ui: &mut Ui, id: &str) {
        ui.label(RichText::new("Link to another node").strong());
        ui.horizontal(|ui| {
            ui.label("Target id");
            ui.text_edit_singleline(&mut self.link_form.target);
        });
        ui.horizontal(|ui| {
            ui.label("Relation");
            ui.text_edit_singleline(&mut self.link_form.relation);
        });

        let target_known = self.session.graph().contains(self.link_form.target.trim());
        let ready = target_known && !self.link_form.relation.trim().is_empty();
        if ui
            .add_enabled(ready, egui::Button::new("Create link"))
            .on_hover_text("The target must be an existing node id.")
            .clicked()
        {
            self.emit(Intent::CreateLink {
                source: id.to_owned(),
                target: self.link_form.target.clone(),
                relation: self.link_form.relation.clone(),
            });
        }
    }
}
