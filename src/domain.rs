//! Domain models: curriculum modules, the persisted learner state, review results and settings.
//!
//! Everything here is serde-ready and serialized camelCase, matching the JSON documents
//! written next to the learner's project.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATE_VERSION: &str = "1.0";

/// A curriculum unit with an ordered list of objectives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
  pub id: String,
  pub title: String,
  pub objectives: Vec<String>,
}

impl Module {
  /// Objective text by 1-based index.
  pub fn objective(&self, index: usize) -> Option<&str> {
    index.checked_sub(1).and_then(|i| self.objectives.get(i)).map(String::as_str)
  }
}

/// Marker id for the objective at 1-based `index`, e.g. `obj-2`.
pub fn objective_marker(index: usize) -> String {
  format!("obj-{}", index)
}

/// Inverse of `objective_marker`. Case-insensitive; `obj-0` is not a marker.
pub fn parse_objective_marker(id: &str) -> Option<usize> {
  let id = id.trim();
  let prefix = id.get(..4)?;
  if !prefix.eq_ignore_ascii_case("obj-") { return None; }
  match id[4..].parse::<usize>() {
    Ok(0) | Err(_) => None,
    Ok(n) => Some(n),
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
  Pending,
  Completed,
  Failed,
}

/// A marker emitted into a learner file, tracked until reviewed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
  pub id: String,
  pub module_id: String,
  pub objective_index: usize,
  pub task: String,
  #[serde(default)] pub success_criteria: Vec<String>,
  pub file_path: String,
  pub line: usize,
  pub created_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completed_at: Option<DateTime<Utc>>,
  pub status: TodoStatus,
}

/// Partial update for a `TodoRecord`. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoPatch {
  pub id: String,
  pub module_id: Option<String>,
  pub objective_index: Option<usize>,
  pub task: Option<String>,
  pub success_criteria: Option<Vec<String>>,
  pub file_path: Option<String>,
  pub line: Option<usize>,
  pub status: Option<TodoStatus>,
}

impl TodoPatch {
  pub fn status(id: impl Into<String>, status: TodoStatus) -> Self {
    Self { id: id.into(), status: Some(status), ..Default::default() }
  }

  /// Build a fresh record, filling anything the patch omits with zero values.
  pub fn into_record(self, now: DateTime<Utc>) -> TodoRecord {
    let mut rec = TodoRecord {
      id: self.id.clone(),
      module_id: String::new(),
      objective_index: 0,
      task: String::new(),
      success_criteria: Vec::new(),
      file_path: String::new(),
      line: 0,
      created_at: now,
      completed_at: None,
      status: TodoStatus::Pending,
    };
    rec.merge(self, now);
    rec
  }
}

impl TodoRecord {
  /// Merge a partial update. Moving to `completed` stamps `completed_at`.
  pub fn merge(&mut self, patch: TodoPatch, now: DateTime<Utc>) {
    if let Some(v) = patch.module_id { self.module_id = v; }
    if let Some(v) = patch.objective_index { self.objective_index = v; }
    if let Some(v) = patch.task { self.task = v; }
    if let Some(v) = patch.success_criteria { self.success_criteria = v; }
    if let Some(v) = patch.file_path { self.file_path = v; }
    if let Some(v) = patch.line { self.line = v; }
    if let Some(status) = patch.status {
      if status == TodoStatus::Completed && self.status != TodoStatus::Completed {
        self.completed_at = Some(now);
      }
      self.status = status;
    }
  }
}

/// Completion receipt, recorded once per objective id / todo id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveCompletion {
  pub objective_id: String,
  pub objective_text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub todo_id: Option<String>,
  pub completed_at: DateTime<Utc>,
  pub score: f64,
  #[serde(default)] pub hints_used: u32,
  #[serde(default)] pub solutions_used: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgress {
  #[serde(default)] pub attempts: u32,
  #[serde(default)] pub objectives_completed: Vec<ObjectiveCompletion>,
  #[serde(default)] pub hints_used: u32,
  #[serde(default)] pub solutions_used: u32,
  #[serde(default)] pub best_score: f64,
}

impl ModuleProgress {
  /// Zero-valued progress, used on first access and by the reset operation.
  pub fn empty() -> Self {
    Self::default()
  }

  /// True if either key already appears among the recorded completions.
  pub fn has_completion(&self, objective_id: &str, todo_id: Option<&str>) -> bool {
    self.objectives_completed.iter().any(|c| {
      c.objective_id == objective_id
        || matches!((todo_id, c.todo_id.as_deref()), (Some(a), Some(b)) if a == b)
    })
  }
}

/// Append-only log entry for an unsuccessful submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMistake {
  pub id: String,
  pub module_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub objective_index: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub todo_id: Option<String>,
  pub timestamp: DateTime<Utc>,
  pub weakness_area: String,
  pub description: String,
  pub review_feedback: String,
  pub review_score: f64,
  #[serde(default)] pub suggestions: Vec<String>,
}

fn default_version() -> String { STATE_VERSION.to_string() }

/// Root persisted document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateData {
  #[serde(default = "default_version")]
  pub version: String,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
  #[serde(default = "Utc::now")]
  pub updated_at: DateTime<Utc>,
  pub current_module_id: String,
  pub skill_scores: BTreeMap<String, f64>,
  pub completed_modules: Vec<String>,
  #[serde(default)] pub module_progress: BTreeMap<String, ModuleProgress>,
  #[serde(default)] pub todos: BTreeMap<String, TodoRecord>,
  #[serde(default)] pub user_mistakes: Vec<UserMistake>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub difficulty_override: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assessment_pending: Option<bool>,
  #[serde(default)] pub metadata: BTreeMap<String, Value>,
  /// Top-level keys this version does not know about, kept verbatim.
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl StateData {
  pub fn new(first_module_id: &str, total_modules: usize) -> Self {
    let now = Utc::now();
    let mut skill_scores = BTreeMap::new();
    skill_scores.insert(first_module_id.to_string(), 0.0);
    let mut metadata = BTreeMap::new();
    metadata.insert("totalModules".to_string(), Value::from(total_modules));
    Self {
      version: default_version(),
      created_at: now,
      updated_at: now,
      current_module_id: first_module_id.to_string(),
      skill_scores,
      completed_modules: Vec::new(),
      module_progress: BTreeMap::new(),
      todos: BTreeMap::new(),
      user_mistakes: Vec::new(),
      difficulty_override: None,
      assessment_pending: None,
      metadata,
      extra: BTreeMap::new(),
    }
  }

  /// Progress for `module_id`, zero-valued if never touched.
  pub fn progress(&self, module_id: &str) -> ModuleProgress {
    self.module_progress.get(module_id).cloned().unwrap_or_else(ModuleProgress::empty)
  }

  /// Mutable progress for `module_id`, created lazily.
  pub fn progress_mut(&mut self, module_id: &str) -> &mut ModuleProgress {
    self.module_progress
      .entry(module_id.to_string())
      .or_insert_with(ModuleProgress::empty)
  }

  pub fn skill_score(&self, module_id: &str) -> f64 {
    self.skill_scores.get(module_id).copied().unwrap_or(0.0)
  }

  pub fn is_completed(&self, module_id: &str) -> bool {
    self.completed_modules.iter().any(|m| m == module_id)
  }

  /// Append to `completed_modules` unless already present.
  pub fn mark_completed(&mut self, module_id: &str) -> bool {
    if self.is_completed(module_id) { return false; }
    self.completed_modules.push(module_id.to_string());
    true
  }
}

/// Outcome of an external code review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
  pub success: bool,
  pub feedback: String,
  #[serde(default)] pub score: Option<f64>,
  #[serde(default)] pub suggestions: Vec<String>,
}

impl ReviewResult {
  pub fn failed(feedback: impl Into<String>) -> Self {
    Self { success: false, feedback: feedback.into(), score: None, suggestions: Vec::new() }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodingBias {
  Guided,
  #[default]
  Balanced,
  Independent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskDifficulty {
  Gentle,
  #[default]
  Progressive,
  Challenging,
}

/// Learner-facing settings document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub coding_bias: CodingBias,
  pub task_difficulty: TaskDifficulty,
  pub auto_review: bool,
  pub auto_progress: bool,
  pub detailed_feedback: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      coding_bias: CodingBias::Balanced,
      task_difficulty: TaskDifficulty::Progressive,
      auto_review: true,
      auto_progress: true,
      detailed_feedback: true,
    }
  }
}
