//! Persisted learner state: loading, validation, legacy normalization and the
//! read-modify-write mutation protocol.
//!
//! Every mutation loads the whole document, applies changes in memory and writes the
//! whole document back through a temp file + rename. If anything fails before the
//! write, the file on disk is untouched. Cycles on the same path are serialized.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::{ObjectiveCompletion, Settings, StateData, TodoPatch, UserMistake, STATE_VERSION};
use crate::error::{Result, TandemError};

const REQUIRED_FIELDS: &[&str] = &["currentModuleId", "skillScores", "completedModules"];

/// Write `value` as pretty JSON via a sibling temp file and an atomic rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }
  let mut body = serde_json::to_vec_pretty(value)
    .map_err(|e| TandemError::InvalidStructure(format!("serialize: {}", e)))?;
  body.push(b'\n');

  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "state.json".into());
  let tmp = path.with_file_name(format!(".{}.tmp", file_name));
  {
    let mut f = std::fs::File::create(&tmp)?;
    f.write_all(&body)?;
    f.sync_all()?;
  }
  if let Err(e) = std::fs::rename(&tmp, path) {
    let _ = std::fs::remove_file(&tmp);
    return Err(e.into());
  }
  debug!(target: "store", path = %path.display(), bytes = body.len(), "Atomic write completed");
  Ok(())
}

/// Snake_case document written by earlier releases.
#[derive(Deserialize)]
struct LegacyStateData {
  #[serde(default)] version: Option<String>,
  #[serde(default)] created_at: Option<DateTime<Utc>>,
  #[serde(default)] updated_at: Option<DateTime<Utc>>,
  current_module_id: String,
  skill_scores: BTreeMap<String, f64>,
  completed_modules: Vec<String>,
  #[serde(default)] hints: BTreeMap<String, u32>,
  #[serde(default)] difficulty_override: Option<String>,
  #[serde(default)] assessment_pending: Option<bool>,
  #[serde(default)] metadata: BTreeMap<String, Value>,
  #[serde(flatten)] extra: BTreeMap<String, Value>,
}

impl From<LegacyStateData> for StateData {
  fn from(old: LegacyStateData) -> Self {
    let now = Utc::now();
    let mut state = StateData::new(&old.current_module_id, 0);
    state.version = old.version.unwrap_or_else(|| STATE_VERSION.to_string());
    state.created_at = old.created_at.unwrap_or(now);
    state.updated_at = old.updated_at.unwrap_or(now);
    state.skill_scores = old.skill_scores;
    state.completed_modules = Vec::new();
    for m in old.completed_modules {
      state.mark_completed(&m);
    }
    for (module_id, count) in old.hints {
      state.progress_mut(&module_id).hints_used = count;
    }
    state.difficulty_override = old.difficulty_override;
    state.assessment_pending = old.assessment_pending;
    state.metadata = old.metadata;
    state.extra = old.extra;
    state
  }
}

fn parse_state(raw: &str) -> Result<StateData> {
  let value: Value = serde_json::from_str(raw)?;
  let Value::Object(obj) = &value else {
    return Err(TandemError::InvalidStructure("state document must be a JSON object".into()));
  };

  if obj.contains_key("current_module_id") {
    let legacy: LegacyStateData = serde_json::from_value(value)
      .map_err(|e| TandemError::InvalidStructure(format!("legacy state: {}", e)))?;
    warn!(target: "store", "Legacy snake_case state document; normalizing");
    return Ok(legacy.into());
  }

  for field in REQUIRED_FIELDS {
    if !obj.contains_key(*field) {
      return Err(TandemError::InvalidStructure(format!("missing '{}' field", field)));
    }
  }
  let mut state: StateData = serde_json::from_value(value)?;
  let mut seen = Vec::with_capacity(state.completed_modules.len());
  state.completed_modules.retain(|m| {
    if seen.contains(m) { return false; }
    seen.push(m.clone());
    true
  });
  Ok(state)
}

#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_state(path: &Path) -> Result<StateData> {
  let raw = std::fs::read_to_string(path).map_err(|e| TandemError::from_io(path, e))?;
  parse_state(&raw)
}

/// Load the settings document. A missing file is `NotFound`; callers decide on defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
  let raw = std::fs::read_to_string(path).map_err(|e| TandemError::from_io(path, e))?;
  Ok(serde_json::from_str(&raw)?)
}

/// The mutation kinds a read-modify-write cycle can apply.
#[derive(Clone, Debug, PartialEq)]
pub enum StateMutation {
  SetCurrentModule(String),
  /// Skill score for the current module; raises that module's `best_score` if higher.
  SetSkillScore(f64),
  CompleteModule(String),
  SetDifficultyOverride(Option<String>),
  SetAssessmentPending(bool),
  IncrementAttempts { module_id: String },
  IncrementHints { module_id: String },
  IncrementSolutions { module_id: String },
  /// Ignored if the objective id or todo id is already recorded for the module.
  RecordCompletion { module_id: String, completion: ObjectiveCompletion },
  UpsertTodo(TodoPatch),
  RecordMistake(UserMistake),
  ResetModuleProgress { module_id: String, confirm: bool },
}

/// Apply one mutation in memory. Returns whether anything changed.
pub fn apply_mutation(state: &mut StateData, mutation: StateMutation, now: DateTime<Utc>) -> Result<bool> {
  match mutation {
    StateMutation::SetCurrentModule(id) => {
      state.current_module_id = id;
    }
    StateMutation::SetSkillScore(score) => {
      let current = state.current_module_id.clone();
      state.skill_scores.insert(current.clone(), score);
      let progress = state.progress_mut(&current);
      if score > progress.best_score {
        progress.best_score = score;
      }
    }
    StateMutation::CompleteModule(id) => return Ok(state.mark_completed(&id)),
    StateMutation::SetDifficultyOverride(level) => {
      state.difficulty_override = level;
    }
    StateMutation::SetAssessmentPending(pending) => {
      state.assessment_pending = Some(pending);
    }
    StateMutation::IncrementAttempts { module_id } => {
      state.progress_mut(&module_id).attempts += 1;
    }
    StateMutation::IncrementHints { module_id } => {
      state.progress_mut(&module_id).hints_used += 1;
    }
    StateMutation::IncrementSolutions { module_id } => {
      state.progress_mut(&module_id).solutions_used += 1;
    }
    StateMutation::RecordCompletion { module_id, completion } => {
      let progress = state.progress_mut(&module_id);
      if progress.has_completion(&completion.objective_id, completion.todo_id.as_deref()) {
        debug!(target: "store", %module_id, objective = %completion.objective_id, "Duplicate completion ignored");
        return Ok(false);
      }
      progress.objectives_completed.push(completion);
    }
    StateMutation::UpsertTodo(patch) => match state.todos.get_mut(&patch.id) {
      Some(existing) => existing.merge(patch, now),
      None => {
        let record = patch.into_record(now);
        state.todos.insert(record.id.clone(), record);
      }
    },
    StateMutation::RecordMistake(mistake) => {
      state.user_mistakes.push(mistake);
    }
    StateMutation::ResetModuleProgress { module_id, confirm } => {
      if !confirm {
        return Err(TandemError::ConfirmationRequired(format!(
          "resetting progress for module '{}' requires confirm=true",
          module_id
        )));
      }
      state.module_progress.insert(module_id, crate::domain::ModuleProgress::empty());
    }
  }
  Ok(true)
}

/// Registry key for `path`: canonical parent directory plus file name, so the key is the
/// same before and after the file exists.
fn lock_key(path: &Path) -> PathBuf {
  let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  match (std::fs::canonicalize(parent), path.file_name()) {
    (Ok(dir), Some(name)) => dir.join(name),
    _ => path.to_path_buf(),
  }
}

/// Session-scoped handle over state documents, constructed once and passed by reference.
#[derive(Default)]
pub struct ProgressStore {
  locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ProgressStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
    let key = lock_key(path);
    let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
    locks.entry(key).or_default().clone()
  }

  /// Create the initial document for a freshly generated curriculum.
  #[instrument(level = "info", skip(self), fields(path = %path.display()))]
  pub fn initialize_state(&self, path: &Path, first_module_id: &str, total_modules: usize) -> Result<StateData> {
    let lock = self.path_lock(path);
    let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());
    let state = StateData::new(first_module_id, total_modules);
    write_json_atomic(path, &state)?;
    info!(target: "store", %first_module_id, total_modules, "State initialized");
    Ok(state)
  }

  pub fn load_state(&self, path: &Path) -> Result<StateData> {
    load_state(path)
  }

  /// One read-modify-write cycle. `f` runs on the loaded document; the document is
  /// written back (with a fresh `updated_at`) only if `f` succeeds.
  pub fn mutate<T>(&self, path: &Path, f: impl FnOnce(&mut StateData) -> Result<T>) -> Result<(StateData, T)> {
    let lock = self.path_lock(path);
    let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

    let mut state = load_state(path)?;
    let out = f(&mut state)?;
    state.updated_at = Utc::now();
    write_json_atomic(path, &state)?;
    Ok((state, out))
  }

  /// Apply `mutations` in order as a single all-or-nothing update.
  #[instrument(level = "info", skip(self, mutations), fields(path = %path.display(), count = mutations.len()))]
  pub fn update_state(&self, path: &Path, mutations: Vec<StateMutation>) -> Result<StateData> {
    let (state, changed) = self.mutate(path, |state| {
      let now = Utc::now();
      let mut changed = 0usize;
      for m in mutations {
        if apply_mutation(state, m, now)? { changed += 1; }
      }
      Ok(changed)
    })?;
    debug!(target: "store", changed, "State updated");
    Ok(state)
  }
}
