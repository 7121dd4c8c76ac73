//! Loading agent configuration (prompts, gating policy, project paths) from TOML.
//!
//! See `TandemConfig` and `Prompts` for the expected schema. Every section is optional.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::gating::GatingPolicy;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TandemConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub gating: GatingPolicy,
  #[serde(default)]
  pub paths: PathsConfig,
}

/// Where the learner's documents live. File names are relative to `project_dir`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
  pub project_dir: PathBuf,
  pub state_file: String,
  pub modules_file: String,
  pub settings_file: String,
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      project_dir: PathBuf::from("."),
      state_file: "codetandem.state.json".into(),
      modules_file: "modules.json".into(),
      settings_file: "codetandem.settings.json".into(),
    }
  }
}

impl PathsConfig {
  pub fn state_path(&self) -> PathBuf { self.project_dir.join(&self.state_file) }
  pub fn modules_path(&self) -> PathBuf { self.project_dir.join(&self.modules_file) }
  pub fn settings_path(&self) -> PathBuf { self.project_dir.join(&self.settings_file) }

  /// Resolve a learner-supplied path against the project directory.
  pub fn resolve(&self, p: &str) -> PathBuf {
    let path = PathBuf::from(p);
    if path.is_absolute() { path } else { self.project_dir.join(path) }
  }
}

/// Prompts used by the review capability. Templates use `{placeholder}` substitution.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub review_system: String,
  pub review_user_template: String,
  pub hint_system: String,
  pub hint_user_template: String,
  pub solution_system: String,
  pub solution_user_template: String,
  /// Top of the score range the review template asks for.
  pub review_score_max: f64,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      review_system: "You are an expert code reviewer for a programming learner. Respond ONLY with strict JSON.".into(),
      review_user_template: "Learning module: {module_title}\nObjective: {objective}\nTODO: {task}\nSuccess criteria:\n{criteria}\n\nFile: {file_path} (lines {start_line}-{end_line}, {language})\n```\n{code}\n```\n\nEvaluate correctness, code quality, language conventions and whether the code demonstrates the objective.\nReturn JSON {\"success\": boolean, \"feedback\": string, \"score\": number 0-100, \"suggestions\": [string]}. Set success=true only if the code completes the task.".into(),
      hint_system: "You are a patient programming tutor. Never write the full solution.".into(),
      hint_user_template: "Module: {module_title}\nObjective: {objective}\nTask: {task}\nLearner preference: {coding_bias}\n\n{level_instruction}".into(),
      solution_system: "You are a programming tutor revealing a reference solution. Output only code with brief comments.".into(),
      solution_user_template: "Module: {module_title}\nObjective: {objective}\nTask: {task}\nLanguage: {language}\nSuccess criteria:\n{criteria}\n\nWrite the code that replaces the TODO marker.".into(),
      review_score_max: 100.0,
    }
  }
}

/// Attempt to load `TandemConfig` from CODETANDEM_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<TandemConfig> {
  let path = std::env::var("CODETANDEM_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<TandemConfig>(&s) {
      Ok(cfg) => {
        info!(target: "codetandem", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "codetandem", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "codetandem", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
