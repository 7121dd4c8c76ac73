//! Command flows behind the HTTP handlers.
//!
//! Each flow loads what it needs, calls the reviewer (OpenAI or local fallback) outside
//! any state lock, and then applies its state changes in one read-modify-write cycle.
//! Store cycles run on tokio's blocking pool.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::curriculum::{find_module, generate_modules_document};
use crate::domain::{objective_marker, parse_objective_marker, Module, ReviewResult, StateData, TodoPatch};
use crate::error::{Result, TandemError};
use crate::extractor::{extract_marked_code, find_all_markers, Extraction, MarkerSelector};
use crate::gating::{
  apply_manual_advance, apply_submission, curriculum_complete, module_status, next_objective_index,
  remaining_objectives, resolve_objective, scaffolding_level, todo_key, Submission,
};
use crate::protocol::*;
use crate::review::{
  build_hint_prompt, build_review_prompt, build_solution_prompt, local_hint, local_review, local_solution,
  ReviewContext,
};
use crate::state::AppState;
use crate::store::{ProgressStore, StateMutation};
use crate::util::display_path;

/// Run one store operation on the blocking pool; it does file IO under the path lock.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T>
where
  F: FnOnce(&ProgressStore) -> Result<T> + Send + 'static,
  T: Send + 'static,
{
  let store = Arc::clone(&state.store);
  tokio::task::spawn_blocking(move || f(&store))
    .await
    .map_err(|e| TandemError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
}

#[instrument(level = "info", skip(state), fields(%curriculum_path, force))]
pub async fn init_project(state: &AppState, curriculum_path: &str, force: bool) -> Result<InitOut> {
  let state_path = state.state_path();
  if state_path.exists() && !force {
    return Err(TandemError::ConfirmationRequired(format!(
      "state document {} already exists; pass force=true to overwrite it",
      state_path.display()
    )));
  }
  let source = state.paths.resolve(curriculum_path);
  let modules = generate_modules_document(&source, &state.paths.modules_path())?;
  // generate_modules_document refuses an empty curriculum.
  let first = modules
    .first()
    .ok_or_else(|| TandemError::InvalidStructure("curriculum has no modules".into()))?;
  let (first_id, total) = (first.id.clone(), modules.len());
  let initial = with_store(state, move |store| store.initialize_state(&state_path, &first_id, total)).await?;
  info!(target: "codetandem", modules = modules.len(), first = %first.id, "Project initialized");
  Ok(InitOut { modules, state: initial })
}

#[instrument(level = "info", skip(state))]
pub async fn progress_summary(state: &AppState) -> Result<ProgressOut> {
  let modules = state.modules()?;
  let st = state.store.load_state(&state.state_path())?;
  let settings = state.settings()?;
  let module = find_module(&modules, &st.current_module_id)?;
  let progress = st.progress(&module.id);

  let remaining = remaining_objectives(&st, module);
  let objectives = module
    .objectives
    .iter()
    .enumerate()
    .map(|(i, text)| {
      let id = objective_marker(i + 1);
      let completed = !remaining.iter().any(|(r, _)| *r == id);
      ObjectiveOut { id, index: i + 1, text: text.clone(), completed }
    })
    .collect();

  Ok(ProgressOut {
    current_module_id: module.id.clone(),
    current_module_title: module.title.clone(),
    objectives,
    remaining_objectives: remaining.into_iter().map(|(id, _)| id).collect(),
    next_objective: next_objective_index(&st, module),
    skill_scores: st.skill_scores.clone(),
    best_score: progress.best_score,
    attempts: progress.attempts,
    hints_used: progress.hints_used,
    solutions_used: progress.solutions_used,
    penalty: state.gating.penalty(progress.hints_used, progress.solutions_used),
    scaffolding_level: scaffolding_level(&st, &module.id),
    difficulty_override: st.difficulty_override.clone(),
    assessment_pending: st.assessment_pending.unwrap_or(false),
    completed_modules: st.completed_modules.clone(),
    modules: modules
      .iter()
      .map(|m| ModuleOut { id: m.id.clone(), title: m.title.clone(), status: module_status(&st, &m.id) })
      .collect(),
    curriculum_complete: curriculum_complete(&st, &modules),
    settings,
  })
}

#[instrument(level = "info", skip(state), fields(%file_path))]
pub async fn list_markers(state: &AppState, file_path: &str) -> MarkersOut {
  let markers = find_all_markers(&state.paths.resolve(file_path));
  debug!(target: "codetandem", count = markers.len(), "Markers listed");
  MarkersOut { file_path: file_path.to_string(), markers }
}

/// Register every `obj-N` marker of the current module found in `file_path`.
#[instrument(level = "info", skip(state), fields(%file_path))]
pub async fn scan_todos(state: &AppState, file_path: &str) -> Result<ScanOut> {
  let modules = state.modules()?;
  let path = state.paths.resolve(file_path);
  let st = state.store.load_state(&state.state_path())?;
  let module = find_module(&modules, &st.current_module_id)?;

  let mut patches = Vec::new();
  let mut skipped = 0usize;
  for marker in find_all_markers(&path) {
    let index = marker.id.as_deref().and_then(parse_objective_marker);
    let (Some(id), Some(index)) = (marker.id.as_deref(), index) else {
      skipped += 1;
      continue;
    };
    let Some(objective) = module.objective(index) else {
      warn!(target: "codetandem", marker = %id, module = %module.id, "Marker names an objective the module does not have");
      skipped += 1;
      continue;
    };
    let criteria = extract_marked_code(&path, &MarkerSelector::Id(id.to_string()))
      .map(|ex| ex.success_criteria)
      .unwrap_or_default();
    let task = if marker.text.is_empty() { objective.to_string() } else { marker.text.clone() };
    patches.push(TodoPatch {
      id: todo_key(&module.id, id),
      module_id: Some(module.id.clone()),
      objective_index: Some(index),
      task: Some(task),
      success_criteria: Some(criteria),
      file_path: Some(display_path(std::path::Path::new(file_path))),
      line: Some(marker.line),
      status: None,
    });
  }

  if patches.is_empty() {
    return Ok(ScanOut { registered: Vec::new(), skipped });
  }
  let ids: Vec<String> = patches.iter().map(|p| p.id.clone()).collect();
  let state_path = state.state_path();
  let mutations: Vec<StateMutation> = patches.into_iter().map(StateMutation::UpsertTodo).collect();
  let updated = with_store(state, move |store| store.update_state(&state_path, mutations)).await?;
  let registered = ids.iter().filter_map(|id| updated.todos.get(id).cloned()).collect();
  info!(target: "codetandem", registered = ids.len(), skipped, "TODO markers registered");
  Ok(ScanOut { registered, skipped })
}

fn selector_for(req: &SubmitIn) -> MarkerSelector {
  if let Some(id) = req.marker_id.as_deref().filter(|s| !s.trim().is_empty()) {
    MarkerSelector::Id(id.trim().to_string())
  } else if let Some(text) = req.todo.as_deref().filter(|s| !s.trim().is_empty()) {
    MarkerSelector::Text(text.trim().to_string())
  } else if let Some(i) = req.index {
    MarkerSelector::Index(i)
  } else {
    MarkerSelector::default()
  }
}

async fn review_extraction(
  state: &AppState,
  module: &Module,
  objective: Option<&str>,
  extraction: &Extraction,
) -> (ReviewResult, &'static str) {
  if let Some(oa) = &state.openai {
    let prompt = build_review_prompt(&state.prompts, &ReviewContext { module, objective, extraction });
    match oa.review_code(&state.prompts, &prompt).await {
      Ok(r) => return (r, "openai"),
      Err(e) => {
        error!(target: "review", module = %module.id, error = %e, "OpenAI review failed; using local rubric.");
      }
    }
  }
  (local_review(extraction), "local")
}

/// Extract the selected marker's code, review it, and gate the result.
#[instrument(level = "info", skip(state, req), fields(file_path = %req.file_path))]
pub async fn submit(state: &AppState, req: &SubmitIn) -> Result<SubmitOut> {
  let modules = state.modules()?;
  let state_path = state.state_path();
  let snapshot = state.store.load_state(&state_path)?;
  let settings = state.settings()?;

  let path = state.paths.resolve(&req.file_path);
  let selector = selector_for(req);
  let extraction = extract_marked_code(&path, &selector).ok_or_else(|| {
    TandemError::InvalidStructure(format!("no TODO marker matching {:?} in {}", selector, req.file_path))
  })?;

  let module = find_module(&modules, &snapshot.current_module_id)?;
  let objective = resolve_objective(&snapshot, module, extraction.marker_id.as_deref())?;
  let (review, reviewer) =
    review_extraction(state, module, objective.as_ref().map(|o| o.text.as_str()), &extraction).await;
  debug!(target: "review", reviewer, success = review.success, score = ?review.score, "Review received");

  let (marker_id, reviewed, policy) = (extraction.marker_id.clone(), review.clone(), state.gating);
  let auto_advance = settings.auto_progress;
  let (_, outcome) = with_store(state, move |store| {
    let sub = Submission { modules: &modules, marker_id: marker_id.as_deref(), review: &reviewed, auto_advance };
    store.mutate(&state_path, |st| apply_submission(st, &sub, &policy, Utc::now()))
  })
  .await?;

  Ok(SubmitOut { extraction, review, reviewer, outcome })
}

/// Objective, task text, criteria and language an assist request is about.
struct AssistTarget {
  module: Module,
  objective: String,
  task: String,
  language: String,
  criteria: Vec<String>,
}

fn assist_target(state: &AppState, st: &StateData, modules: &[Module], req: &AssistIn) -> Result<AssistTarget> {
  let module = find_module(modules, &st.current_module_id)?.clone();
  let extraction = req.file_path.as_deref().and_then(|fp| {
    let selector = match req.marker_id.as_deref() {
      Some(id) => MarkerSelector::Id(id.to_string()),
      None => MarkerSelector::default(),
    };
    extract_marked_code(&state.paths.resolve(fp), &selector)
  });

  let linked = match &extraction {
    Some(ex) => resolve_objective(st, &module, ex.marker_id.as_deref())?,
    None => resolve_objective(st, &module, req.marker_id.as_deref())?,
  };
  let objective = match linked {
    Some(o) => o.text,
    None => next_objective_index(st, &module)
      .and_then(|i| module.objective(i))
      .or_else(|| module.objective(1))
      .unwrap_or(module.title.as_str())
      .to_string(),
  };

  Ok(match extraction {
    Some(ex) => AssistTarget {
      task: if ex.marker_text.is_empty() { objective.clone() } else { ex.marker_text },
      objective,
      language: ex.language,
      criteria: ex.success_criteria,
      module,
    },
    None => AssistTarget { task: objective.clone(), objective, language: "unknown".into(), criteria: Vec::new(), module },
  })
}

/// Hint for the current objective. The hint counter is bumped before anything else.
#[instrument(level = "info", skip(state, req))]
pub async fn hint(state: &AppState, req: &AssistIn) -> Result<AssistOut> {
  let modules = state.modules()?;
  let state_path = state.state_path();
  let current = state.store.load_state(&state_path)?.current_module_id;
  find_module(&modules, &current)?;
  let bump = vec![StateMutation::IncrementHints { module_id: current.clone() }];
  let st = with_store(state, move |store| store.update_state(&state_path, bump)).await?;
  let progress = st.progress(&current);
  let previous_hints = progress.hints_used.saturating_sub(1);

  let target = assist_target(state, &st, &modules, req)?;
  let settings = state.settings()?;
  let mut source = "local";
  let mut text = None;
  if let Some(oa) = &state.openai {
    let prompt = build_hint_prompt(
      &state.prompts,
      &target.module,
      &target.objective,
      &target.task,
      settings.coding_bias,
      previous_hints,
    );
    match oa.hint(&state.prompts, &prompt).await {
      Ok(t) => {
        source = "openai";
        text = Some(t);
      }
      Err(e) => error!(target: "codetandem", error = %e, "OpenAI hint failed; using local hint."),
    }
  }
  let text = text.unwrap_or_else(|| local_hint(&target.module, &target.objective, &target.criteria, previous_hints));
  info!(target: "codetandem", module = %current, hints_used = progress.hints_used, source, "Hint served");

  Ok(AssistOut {
    text,
    source,
    module_id: current,
    objective: target.objective,
    hints_used: progress.hints_used,
    solutions_used: progress.solutions_used,
    penalty: state.gating.penalty(progress.hints_used, progress.solutions_used),
  })
}

/// Reference solution for the current objective. The solution counter is bumped first.
#[instrument(level = "info", skip(state, req))]
pub async fn solution(state: &AppState, req: &AssistIn) -> Result<AssistOut> {
  let modules = state.modules()?;
  let state_path = state.state_path();
  let current = state.store.load_state(&state_path)?.current_module_id;
  find_module(&modules, &current)?;
  let bump = vec![StateMutation::IncrementSolutions { module_id: current.clone() }];
  let st = with_store(state, move |store| store.update_state(&state_path, bump)).await?;
  let progress = st.progress(&current);

  let target = assist_target(state, &st, &modules, req)?;
  let mut source = "local";
  let mut text = None;
  if let Some(oa) = &state.openai {
    let prompt = build_solution_prompt(
      &state.prompts,
      &target.module,
      &target.objective,
      &target.task,
      &target.language,
      &target.criteria,
    );
    match oa.solution(&state.prompts, &prompt).await {
      Ok(t) => {
        source = "openai";
        text = Some(t);
      }
      Err(e) => error!(target: "codetandem", error = %e, "OpenAI solution failed; using local stand-in."),
    }
  }
  let text = text.unwrap_or_else(|| local_solution(&target.objective, &target.criteria));
  info!(target: "codetandem", module = %current, solutions_used = progress.solutions_used, source, "Solution served");

  Ok(AssistOut {
    text,
    source,
    module_id: current,
    objective: target.objective,
    hints_used: progress.hints_used,
    solutions_used: progress.solutions_used,
    penalty: state.gating.penalty(progress.hints_used, progress.solutions_used),
  })
}

/// `easy|medium|hard` sets the override; `auto` (or empty) clears it.
#[instrument(level = "info", skip(state), fields(%difficulty))]
pub async fn set_level(state: &AppState, difficulty: &str) -> Result<LevelOut> {
  let level = match difficulty.trim().to_ascii_lowercase().as_str() {
    "" | "auto" | "none" => None,
    d @ ("easy" | "medium" | "hard") => Some(d.to_string()),
    other => {
      return Err(TandemError::InvalidStructure(format!(
        "unknown difficulty '{}'; expected easy, medium, hard or auto",
        other
      )))
    }
  };
  let state_path = state.state_path();
  let st = with_store(state, move |store| {
    store.update_state(&state_path, vec![StateMutation::SetDifficultyOverride(level)])
  })
  .await?;
  Ok(LevelOut {
    difficulty_override: st.difficulty_override.clone(),
    scaffolding_level: scaffolding_level(&st, &st.current_module_id),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn advance(state: &AppState) -> Result<AdvanceOut> {
  let modules = state.modules()?;
  let (state_path, policy) = (state.state_path(), state.gating);
  let (st, (can_progress, advancement)) = with_store(state, move |store| {
    store.mutate(&state_path, |st| apply_manual_advance(st, &modules, &policy, Utc::now()))
  })
  .await?;
  if !can_progress {
    info!(target: "gating", module = %st.current_module_id, "Advance requested but module is not finished");
  }
  Ok(AdvanceOut { can_progress, current_module_id: st.current_module_id, advancement })
}

#[instrument(level = "info", skip(state), fields(%module_id, confirm))]
pub async fn reset_module(state: &AppState, module_id: &str, confirm: bool) -> Result<ResetOut> {
  let modules = state.modules()?;
  find_module(&modules, module_id)?;
  let state_path = state.state_path();
  let reset = vec![StateMutation::ResetModuleProgress { module_id: module_id.to_string(), confirm }];
  let st = with_store(state, move |store| store.update_state(&state_path, reset)).await?;
  warn!(target: "codetandem", %module_id, "Module progress reset");
  Ok(ResetOut { module_id: module_id.to_string(), progress: st.progress(module_id) })
}
