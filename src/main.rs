use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::info;

use notegraph::app::{NoteGraphApp, Services};
use notegraph::config::{Args, Settings};
use notegraph::knowledge::{HttpBackend, JsonPositionStore};

fn init_logging(filter: Option<&str>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    }
    builder.init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let settings = Settings::resolve(&args)?;
    let backend = HttpBackend::new(
        &settings.api_url,
        settings.api_token.clone(),
        settings.request_timeout(),
    )
    .context("failed to set up the analysis service client")?;
    let store = JsonPositionStore::new(settings.positions_path());
    info!(
        "using analysis service at {}, pinned positions in {}",
        backend.base_url(),
        store.path().display()
    );

    let services = Services {
        backend: Arc::new(backend),
        store: Box::new(store),
        settings,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 920.0])
            .with_min_inner_size([720.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "notegraph",
        options,
        Box::new(move |cc| Ok(Box::new(NoteGraphApp::new(cc, services)))),
    )
    .map_err(|err| anyhow!("failed to run the window: {err}"))
}
