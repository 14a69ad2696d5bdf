use eframe::egui::{self, Align, Context, Layout, RichText};

use super::super::{Intent, Status, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_panels(&mut self, ctx: &Context) {
        let palette = self.theme.palette();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("notegraph");
                    ui.separator();
                    let graph = self.session.graph();
                    ui.label(format!("nodes: {}", graph.node_count()));
                    ui.label(format!("links: {}", graph.link_count()));

                    let toggle_text = if self.theme.is_dark() { "Light mode" } else { "Dark mode" };
                    if ui
                        .button(toggle_text)
                        .on_hover_text("Switch between the light and dark themes.")
                        .clicked()
                    {
                        self.emit(Intent::ToggleTheme);
                    }

                    let reloading = self.requests.reload.is_some();
                    if ui
                        .add_enabled(!reloading, egui::Button::new("Reload graph"))
                        .on_hover_text("Fetch the full graph from the analysis service again.")
                        .clicked()
                    {
                        self.emit(Intent::Reload);
                    }
                    if reloading || self.session.is_saving() {
                        ui.spinner();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::TopBottomPanel::bottom("status_line")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    match &self.status {
                        Some(Status::Info(message)) => {
                            ui.label(message.as_str());
                        }
                        Some(Status::Error(message)) => {
                            ui.label(RichText::new(message.as_str()).color(palette.gap));
                        }
                        None => {
                            ui.label(RichText::new("Ready").color(palette.muted_text));
                        }
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.graph_counts_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_editor(ui);
                    ui.separator();
                    self.draw_controls(ui);
                });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
