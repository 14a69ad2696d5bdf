use eframe::egui::{self, Key, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::knowledge::{Graph, GraphNode};

use super::super::layout::{ForceConfig, ForceSimulation};
use super::super::render::Theme;
use super::super::{Intent, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Node whose label best matches `query`. Ties go to the first id.
pub(in crate::app) fn best_match<'a>(graph: &'a Graph, query: &str) -> Option<&'a GraphNode> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let matcher = SkimMatcherV2::default();
    graph
        .nodes()
        .filter_map(|node| {
            let score = fuzzy_match_score(&matcher, node.display_name(), query)
                .or_else(|| fuzzy_match_score(&matcher, &node.id, query))?;
            Some((score, node))
        })
        .fold(None, |best: Option<(i64, &GraphNode)>, (score, node)| match best {
            Some((best_score, _)) if best_score >= score => best,
            _ => Some((score, node)),
        })
        .map(|(_, node)| node)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        self.draw_search(ui);
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Theme");
            for theme in Theme::ALL {
                if ui.selectable_label(self.theme == theme, theme.label()).clicked() {
                    self.emit(Intent::SetTheme(theme));
                }
            }
        });
        ui.separator();

        self.draw_multi_select(ui);
        ui.separator();

        self.draw_tag_list(ui);
        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep simulating layout forces while viewing the graph.");
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");
        self.draw_physics_tuning(ui);
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search")
            .on_hover_text("Fuzzy-match node labels and focus the best hit.");
        let response = ui.text_edit_singleline(&mut self.search);
        let submitted = response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        let hit = best_match(self.session.graph(), &self.search);
        ui.horizontal(|ui| {
            let focus_clicked = ui
                .add_enabled(hit.is_some(), egui::Button::new("Focus"))
                .on_hover_text("Focus the best matching node.")
                .clicked();
            match hit {
                Some(node) => {
                    ui.label(format!("{}: {}", node.kind.label(), node.display_name()));
                    if focus_clicked || submitted {
                        self.emit(Intent::FocusNode(node.id.clone()));
                    }
                }
                None if !self.search.trim().is_empty() => {
                    ui.label("No match");
                }
                None => {}
            }
        });
    }

    fn draw_multi_select(&mut self, ui: &mut Ui) {
        let selection = self.session.selection();
        if !selection.is_active() {
            ui.label("Shift-click a node to start selecting several.");
            return;
        }

        let count = selection.len();
        ui.label(format!("{count} selected"));
        ui.horizontal(|ui| {
            let can_delete = count > 0 && !self.session.is_saving();
            if ui
                .add_enabled(can_delete, egui::Button::new("Delete selected"))
                .on_hover_text("Delete every selected node and reload the graph.")
                .clicked()
            {
                self.emit(Intent::BatchDelete);
            }
            if ui.button("Done").clicked() {
                self.emit(Intent::ExitMultiSelect);
            }
        });
    }

    fn draw_tag_list(&mut self, ui: &mut Ui) {
        let graph = self.session.graph();
        let tags = graph.tags();
        if tags.is_empty() {
            return;
        }

        ui.label("Tags")
            .on_hover_text("Highlight every node carrying a tag.");
        ui.horizontal_wrapped(|ui| {
            for tag in tags {
                let active = self.session.highlighted_tag() == Some(tag);
                if ui.selectable_label(active, format!("#{tag}")).clicked() {
                    self.emit(Intent::ToggleTag(tag.to_owned()));
                }
            }
        });
        if self.session.highlighted_tag().is_some() && ui.small_button("Clear highlight").clicked() {
            self.emit(Intent::HighlightTag(None));
        }
    }

    fn draw_physics_tuning(&mut self, ui: &mut Ui) {
        let mut config = self.layout.simulation().config();
        let before = config;

        ui.collapsing("Physics tuning", |ui| {
            ui.add(egui::Slider::new(&mut config.charge, -600.0..=-10.0).text("charge"))
                .on_hover_text("How strongly nodes push away from each other.");
            ui.add(egui::Slider::new(&mut config.link_distance, 20.0..=250.0).text("link distance"))
                .on_hover_text("Preferred length of every link.");
            ui.add(egui::Slider::new(&mut config.centering, 0.0..=0.2).text("centering"))
                .on_hover_text("Pull of every node toward the middle of the canvas.");
            ui.add(egui::Slider::new(&mut config.collision_strength, 0.0..=1.0).text("collision"))
                .on_hover_text("Extra separation force to prevent overlap between nearby nodes.");
            ui.add(egui::Slider::new(&mut config.velocity_decay, 0.05..=0.9).text("friction"))
                .on_hover_text("How quickly node movement slows each tick.");
            if ui.button("Reset").clicked() {
                config = ForceConfig::default();
            }
        });

        if config != before {
            let simulation = self.layout.simulation_mut();
            simulation.set_config(config);
            simulation.reheat();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{GraphSnapshot, NodePayload, PinnedPositions, from_snapshot};

    fn graph() -> Graph {
        let node = |id: &str, label: &str| NodePayload {
            id: id.to_owned(),
            label: label.to_owned(),
            ..Default::default()
        };
        from_snapshot(
            &GraphSnapshot {
                nodes: vec![
                    node("concept_1", "Borrow checker"),
                    node("concept_2", "Ownership"),
                    node("topic_1", "Rust memory model"),
                ],
                links: Vec::new(),
            },
            &PinnedPositions::new(),
        )
    }

    #[test]
    fn best_match_uses_labels_case_insensitively() {
        let graph = graph();
        assert_eq!(best_match(&graph, "owner").map(|node| node.id.as_str()), Some("concept_2"));
        assert_eq!(best_match(&graph, "BORROW").map(|node| node.id.as_str()), Some("concept_1"));
    }

    #[test]
    fn blank_or_unmatched_query_finds_nothing() {
        let graph = graph();
        assert!(best_match(&graph, "   ").is_none());
        assert!(best_match(&graph, "zzzq").is_none());
    }
}
