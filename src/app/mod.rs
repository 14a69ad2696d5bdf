use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use log::{error, info, warn};

use crate::config::Settings;
use crate::knowledge::{
    AnalysisResult, BackendError, GraphBackend, GraphSession, GraphSnapshot, MutationReport, NodeId,
    PinnedPositions, PositionStore,
};

mod graph;
mod intent;
pub mod layout;
pub mod render;
mod ui;

pub use intent::Intent;

use layout::{ForceLayout, LayoutAdapter};
use render::Theme;

/// Collaborators the view model owns once the first graph arrives.
pub struct Services {
    pub backend: Arc<dyn GraphBackend>,
    pub store: Box<dyn PositionStore>,
    pub settings: Settings,
}

pub struct NoteGraphApp {
    services: Option<Services>,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphSnapshot, BackendError>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Status {
    Info(String),
    Error(String),
}

/// In-flight worker replies, one slot per kind of request.
#[derive(Default)]
struct Requests {
    analysis: Option<Receiver<Result<AnalysisResult, BackendError>>>,
    mutation: Option<Receiver<Result<MutationReport, BackendError>>>,
    reload: Option<Receiver<Result<GraphSnapshot, BackendError>>>,
}

impl Requests {
    fn is_idle(&self) -> bool {
        self.analysis.is_none() && self.mutation.is_none() && self.reload.is_none()
    }
}

/// Edit form for the focused node, reset whenever the focus moves.
#[derive(Default)]
struct NodeForm {
    node: Option<NodeId>,
    label: String,
    summary: String,
}

#[derive(Default)]
struct LinkForm {
    target: String,
    relation: String,
}

struct ViewModel {
    backend: Arc<dyn GraphBackend>,
    store: Box<dyn PositionStore>,
    positions: PinnedPositions,
    session: GraphSession,
    layout: LayoutAdapter<ForceLayout>,
    pan: Vec2,
    zoom: f32,
    theme: Theme,
    applied_theme: Option<Theme>,
    intents_tx: Sender<Intent>,
    intents_rx: Receiver<Intent>,
    requests: Requests,
    editor_text: String,
    search: String,
    status: Option<Status>,
    node_form: NodeForm,
    link_form: LinkForm,
    hovered: Option<NodeId>,
    live_physics: bool,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

/// Runs `job` on a short-lived thread and hands back its reply channel.
fn spawn_worker<T, F>(job: F) -> Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(job());
    });
    rx
}

/// Takes the worker's reply if it is ready. A worker that hung up without
/// replying counts as [`BackendError::WorkerLost`].
fn poll_worker<T>(slot: &mut Option<Receiver<Result<T, BackendError>>>) -> Option<Result<T, BackendError>> {
    let rx = slot.take()?;
    match rx.try_recv() {
        Ok(reply) => Some(reply),
        Err(TryRecvError::Empty) => {
            *slot = Some(rx);
            None
        }
        Err(TryRecvError::Disconnected) => Some(Err(BackendError::WorkerLost)),
    }
}

impl NoteGraphApp {
    pub fn new(cc: &eframe::CreationContext<'_>, services: Services) -> Self {
        cc.egui_ctx.set_visuals(services.settings.theme.visuals());
        let state = Self::start_load(&services);
        Self {
            services: Some(services),
            state,
        }
    }

    fn start_load(services: &Services) -> AppState {
        let backend = Arc::clone(&services.backend);
        AppState::Loading {
            rx: spawn_worker(move || backend.fetch_full_graph()),
        }
    }
}

impl eframe::App for NoteGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                let reply = match rx.try_recv() {
                    Ok(reply) => Some(reply),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => Some(Err(BackendError::WorkerLost)),
                };
                if let Some(reply) = reply {
                    transition = Some(match (reply, self.services.take()) {
                        (Ok(snapshot), Some(services)) => {
                            AppState::Ready(Box::new(ViewModel::new(snapshot, services)))
                        }
                        (Ok(_), None) => AppState::Error("Application services are gone".to_owned()),
                        (Err(err), services) => {
                            error!("initial graph load failed: {err}");
                            self.services = services;
                            AppState::Error(err.to_string())
                        }
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if let Some(services) = &self.services
                        && ui.button("Retry").clicked()
                    {
                        info!("retrying initial graph load");
                        transition = Some(Self::start_load(services));
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(snapshot: GraphSnapshot, services: Services) -> Self {
        let Services {
            backend,
            store,
            settings,
        } = services;

        let positions = store.load_all().unwrap_or_else(|err| {
            warn!("ignoring pinned positions: {err}");
            PinnedPositions::new()
        });
        let mut session = GraphSession::new(settings.note_limits());
        session.replace_graph(&snapshot, &positions);
        let (intents_tx, intents_rx) = mpsc::channel();

        Self {
            backend,
            store,
            positions,
            session,
            layout: LayoutAdapter::new(ForceLayout::new(settings.physics), settings.resize_debounce()),
            pan: Vec2::ZERO,
            zoom: 1.0,
            theme: settings.theme,
            applied_theme: None,
            intents_tx,
            intents_rx,
            requests: Requests::default(),
            editor_text: String::new(),
            search: String::new(),
            status: None,
            node_form: NodeForm::default(),
            link_form: LinkForm::default(),
            hovered: None,
            live_physics: true,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    /// Applies finished worker replies. Returns whether anything arrived.
    fn poll_requests(&mut self) -> bool {
        let mut changed = false;

        if let Some(outcome) = poll_worker(&mut self.requests.analysis) {
            changed = true;
            match self.session.finish_analysis(outcome, &self.positions) {
                Ok(stats) => {
                    info!(
                        "analysis merged: {} nodes added, {} updated, {} links added",
                        stats.nodes_added, stats.nodes_updated, stats.links_added
                    );
                    self.status = Some(Status::Info(format!(
                        "Analysis complete: {} new nodes, {} new links",
                        stats.nodes_added, stats.links_added
                    )));
                }
                Err(err) => self.report_backend_error("analysis failed", &err),
            }
        }

        if let Some(outcome) = poll_worker(&mut self.requests.mutation) {
            changed = true;
            match self.session.finish_mutation(outcome, &self.positions) {
                Ok(()) => self.status = Some(Status::Info("Saved".to_owned())),
                Err(err) => self.report_backend_error("change failed", &err),
            }
        }

        if let Some(outcome) = poll_worker(&mut self.requests.reload) {
            changed = true;
            match outcome {
                Ok(snapshot) => {
                    self.session.replace_graph(&snapshot, &self.positions);
                    self.status = Some(Status::Info("Graph reloaded".to_owned()));
                }
                Err(err) => self.report_backend_error("reload failed", &err),
            }
        }

        changed
    }

    fn report_backend_error(&mut self, context: &str, err: &BackendError) {
        warn!("{context}: {err}");
        self.status = Some(Status::Error(err.to_string()));
    }

    fn show(&mut self, ctx: &Context) {
        self.update_fps_counter(ctx);
        if self.applied_theme != Some(self.theme) {
            ctx.set_visuals(self.theme.visuals());
            self.applied_theme = Some(self.theme);
        }

        self.drain_intents();
        self.poll_requests();
        self.sync_node_form();

        self.draw_panels(ctx);

        // Picks up intents emitted by this frame's widgets.
        self.drain_intents();
        if !self.requests.is_idle() {
            ctx.request_repaint();
        }
    }

    #[cfg(test)]
    fn wait_for_requests(&mut self, timeout: std::time::Duration) {
        let deadline = std::time::Instant::now() + timeout;
        while !self.requests.is_idle() && std::time::Instant::now() < deadline {
            if !self.poll_requests() {
                thread::sleep(std::time::Duration::from_millis(2));
            }
        }
    }
}
