use eframe::egui::{self, Key, Modifiers, RichText, Ui};

use crate::knowledge::NoteLimits;

use super::super::{Intent, ViewModel};

/// The counter turns into a warning below this many characters left.
const NEAR_LIMIT: isize = 100;

/// `"<remaining> / <max>"` and whether the note is close to the limit.
pub(in crate::app) fn counter(limits: NoteLimits, text: &str) -> (String, bool) {
    let remaining = limits.remaining(text);
    (format!("{remaining} / {}", limits.max_chars), remaining < NEAR_LIMIT)
}

impl ViewModel {
    pub(in crate::app) fn draw_editor(&mut self, ui: &mut Ui) {
        let palette = self.theme.palette();
        let limits = self.session.limits();
        let analyzing = self.session.is_analyzing();

        ui.heading("Note");
        ui.add_space(4.0);

        let editor_id = ui.make_persistent_id("note_editor");
        let shortcut = ui.memory(|memory| memory.has_focus(editor_id))
            && ui.input_mut(|input| input.consume_key(Modifiers::COMMAND, Key::Enter));

        ui.add(
            egui::TextEdit::multiline(&mut self.editor_text)
                .id(editor_id)
                .char_limit(limits.max_chars)
                .desired_rows(12)
                .desired_width(f32::INFINITY)
                .hint_text("Start typing a note... Press Ctrl+Enter to analyze"),
        );

        let (counter_text, near_limit) = counter(limits, &self.editor_text);
        let counter_color = if near_limit { palette.gap } else { palette.muted_text };

        ui.horizontal(|ui| {
            let label = if analyzing { "Analyzing..." } else { "Analyze" };
            let clicked = ui
                .add_enabled(!analyzing, egui::Button::new(label))
                .on_hover_text("Send the note to the analysis service and merge the result.")
                .clicked();
            if clicked || (shortcut && !analyzing) {
                self.emit(Intent::SubmitAnalysis);
            }
            if analyzing {
                ui.spinner();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(RichText::new(counter_text).small().color(counter_color));
            });
        });

        self.draw_analysis_summary(ui);
    }

    fn draw_analysis_summary(&self, ui: &mut Ui) {
        let Some(result) = self.session.last_analysis() else {
            return;
        };

        ui.add_space(6.0);
        ui.collapsing("Last analysis", |ui| {
            if let Some(model) = &result.model_used {
                ui.label(format!("Model: {model}"));
            }
            if let Some(topic) = &result.main_topic {
                ui.label(RichText::new(format!("Main topic: {topic}")).strong());
            }
            if let Some(summary) = &result.summary {
                ui.label(summary.as_str());
            }
            ui.label(format!(
                "{} nodes, {} links",
                result.graph.nodes.len(),
                result.graph.links.len()
            ));

            if !result.main_concepts.is_empty() {
                ui.label(format!("Concepts: {}", result.main_concepts.join(", ")));
            }
            if !result.tags.is_empty() {
                ui.horizontal_wrapped(|ui| {
                    for tag in &result.tags {
                        let active = self.session.highlighted_tag() == Some(tag.as_str());
                        if ui.selectable_label(active, format!("#{tag}")).clicked() {
                            self.emit(Intent::ToggleTag(tag.clone()));
                        }
                    }
                });
            }
            if !result.knowledge_gaps.is_empty() {
                ui.label(RichText::new("Knowledge gaps").strong());
                for gap in &result.knowledge_gaps {
                    ui.label(format!("- {gap}"));
                }
            }
            if let Some(reasoning) = &result.reasoning {
                ui.collapsing("Reasoning", |ui| ui.label(reasoning.as_str()));
            }
        });
    }
}
