use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 120;

/// `FPS 60 | avg 58.7` style readout; `None` until a sample exists.
pub(in crate::app) fn fps_text(current: f32, samples: impl ExactSizeIterator<Item = f32>) -> Option<String> {
    let count = samples.len();
    if count == 0 {
        return None;
    }
    let average = samples.sum::<f32>() / count as f32;
    Some(format!("FPS {current:.0} | avg {average:.1}"))
}

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if !self.show_fps_bar {
            return None;
        }
        fps_text(self.fps_current, self.fps_samples.iter().copied())
    }

    pub(in crate::app) fn graph_counts_text(&self) -> String {
        let graph = self.session.graph();
        format!(
            "{} nodes / {} links ({} / {} on screen)",
            graph.node_count(),
            graph.link_count(),
            self.visible_node_count,
            self.visible_edge_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_text_averages_samples() {
        assert_eq!(fps_text(60.0, [].into_iter()), None);
        assert_eq!(
            fps_text(60.0, [50.0, 60.0].into_iter()).as_deref(),
            Some("FPS 60 | avg 55.0")
        );
    }
}
