use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app::layout::ForceConfig;
use crate::app::render::Theme;
use crate::knowledge::NoteLimits;
use crate::knowledge::store::JsonPositionStore;

const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Default, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Settings file; defaults to the user config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Base URL of the analysis service.
    #[arg(long, env = "NOTEGRAPH_API_URL")]
    pub api_url: Option<String>,
    /// Bearer token sent with every request.
    #[arg(long, env = "NOTEGRAPH_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,
    /// Where pinned node positions are kept.
    #[arg(long)]
    pub positions: Option<PathBuf>,
    /// Log filter, e.g. `debug` or `notegraph=trace`. Falls back to RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub theme: Theme,
    /// If None, positions go to the OS data directory.
    pub positions_file: Option<PathBuf>,
    pub resize_debounce_ms: u64,
    pub note_min_chars: usize,
    pub note_max_chars: usize,
    pub physics: ForceConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let limits = NoteLimits::default();
        Self {
            api_url: "http://localhost:8000".to_owned(),
            api_token: None,
            request_timeout_secs: 120,
            theme: Theme::default(),
            positions_file: None,
            resize_debounce_ms: 50,
            note_min_chars: limits.min_chars,
            note_max_chars: limits.max_chars,
            physics: ForceConfig::default(),
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("notegraph")
            .join(SETTINGS_FILE_NAME)
    }

    /// Reads settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Settings file named by `args` (or the default one), with CLI flags
    /// laid on top.
    pub fn resolve(args: &Args) -> Result<Self> {
        let path = args.config.clone().unwrap_or_else(Self::default_path);
        let mut settings = Self::load(&path)?;
        settings.apply_overrides(args);
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(api_url) = &args.api_url {
            self.api_url = api_url.clone();
        }
        if let Some(token) = &args.api_token {
            self.api_token = Some(token.clone());
        }
        if let Some(theme) = args.theme {
            self.theme = theme;
        }
        if let Some(positions) = &args.positions {
            self.positions_file = Some(positions.clone());
        }
    }

    pub fn positions_path(&self) -> PathBuf {
        self.positions_file
            .clone()
            .unwrap_or_else(JsonPositionStore::default_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn note_limits(&self) -> NoteLimits {
        NoteLimits {
            min_chars: self.note_min_chars,
            max_chars: self.note_max_chars.max(self.note_min_chars),
        }
    }
}
