//! Application state shared by the HTTP handlers.
//!
//! This module owns:
//!   - the progress store (per-path serialized read-modify-write)
//!   - the prompts and gating policy (from TOML or defaults)
//!   - where the learner's documents live
//!   - the optional OpenAI client
//!
//! Without OpenAI, reviews, hints and solutions fall back to local logic.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{load_config_from_env, PathsConfig, Prompts, TandemConfig};
use crate::curriculum::load_modules;
use crate::domain::{Module, Settings};
use crate::error::{Result, TandemError};
use crate::gating::GatingPolicy;
use crate::openai::OpenAI;
use crate::store::{load_settings, ProgressStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ProgressStore>,
    pub prompts: Prompts,
    pub gating: GatingPolicy,
    pub paths: PathsConfig,
    pub openai: Option<OpenAI>,
}

impl AppState {
    /// Build state from env: TOML config, project dir override, OpenAI client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let mut cfg = load_config_from_env().unwrap_or_default();
        if let Ok(dir) = std::env::var("CODETANDEM_PROJECT_DIR") {
            cfg.paths.project_dir = PathBuf::from(dir);
        }

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "codetandem", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "codetandem", "OpenAI disabled (no OPENAI_API_KEY). Using local review rubric.");
        }

        Self::with_config(cfg, openai)
    }

    pub fn with_config(cfg: TandemConfig, openai: Option<OpenAI>) -> Self {
        info!(
            target: "codetandem",
            project_dir = %cfg.paths.project_dir.display(),
            pass_threshold = cfg.gating.pass_threshold,
            penalty_cap = cfg.gating.penalty_cap,
            "Progress engine configured"
        );
        Self {
            store: Arc::new(ProgressStore::new()),
            prompts: cfg.prompts,
            gating: cfg.gating,
            paths: cfg.paths,
            openai,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.paths.state_path()
    }

    pub fn modules(&self) -> Result<Vec<Module>> {
        load_modules(&self.paths.modules_path())
    }

    /// Settings document, or defaults when the file does not exist.
    pub fn settings(&self) -> Result<Settings> {
        match load_settings(&self.paths.settings_path()) {
            Ok(s) => Ok(s),
            Err(TandemError::NotFound { .. }) => Ok(Settings::default()),
            Err(e) => {
                warn!(target: "codetandem", error = %e, "Settings document unreadable");
                Err(e)
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(TandemConfig::default(), None)
    }
}
