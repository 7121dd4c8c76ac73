//! Proficiency scoring and module advancement.
//!
//! A submission's raw review score (0-10, or 0-100 rescaled) is reduced by a penalty for
//! hints and solutions used in the module. A passing submission (review success and an
//! adjusted score at or above the threshold) records a completion receipt for its
//! objective. Once every objective of the module has a receipt, a passing submission
//! completes the module and moves the pointer to the next one.
//!
//! All functions here operate on an in-memory `StateData`; persistence happens around
//! them in `ProgressStore::mutate`, so a failure here never reaches the disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::curriculum::{find_module, next_module};
use crate::domain::{
    objective_marker, parse_objective_marker, Module, ObjectiveCompletion, ReviewResult, StateData,
    TodoPatch, TodoStatus, UserMistake,
};
use crate::error::{Result, TandemError};
use crate::store::{apply_mutation, StateMutation};

pub const HINT_PENALTY: f64 = 0.5;
pub const SOLUTION_PENALTY: f64 = 1.5;
pub const PENALTY_CAP: f64 = 3.0;
pub const PASS_THRESHOLD: f64 = 7.0;

/// Scoring constants. Defaults are the contract values; TOML may override them.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatingPolicy {
    pub hint_penalty: f64,
    pub solution_penalty: f64,
    pub penalty_cap: f64,
    pub pass_threshold: f64,
}

impl Default for GatingPolicy {
    fn default() -> Self {
        Self {
            hint_penalty: HINT_PENALTY,
            solution_penalty: SOLUTION_PENALTY,
            penalty_cap: PENALTY_CAP,
            pass_threshold: PASS_THRESHOLD,
        }
    }
}

impl GatingPolicy {
    pub fn penalty(&self, hints: u32, solutions: u32) -> f64 {
        let raw = hints as f64 * self.hint_penalty + solutions as f64 * self.solution_penalty;
        raw.min(self.penalty_cap)
    }

    pub fn adjusted(&self, raw_score: f64, hints: u32, solutions: u32) -> f64 {
        (raw_score - self.penalty(hints, solutions)).max(0.0)
    }

    pub fn passes(&self, adjusted: f64, success: bool) -> bool {
        success && adjusted >= self.pass_threshold
    }

    pub fn can_progress(&self, completed: usize, total: usize, adjusted: f64, success: bool) -> bool {
        completed >= total && self.passes(adjusted, success)
    }
}

pub fn calculate_penalty(hints: u32, solutions: u32) -> f64 {
    GatingPolicy::default().penalty(hints, solutions)
}

pub fn adjusted_score(raw_score: f64, hints: u32, solutions: u32) -> f64 {
    GatingPolicy::default().adjusted(raw_score, hints, solutions)
}

/// Scores reaching gating should already be on 0-10 (see `review::parse_scaled_review`).
/// Anything above 10 is still read as 0-100. A missing score counts as 0.
pub fn normalize_review_score(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() => {
            let s = s.max(0.0);
            if s > 10.0 { (s / 10.0).min(10.0) } else { s }
        }
        _ => 0.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    Completed,
}

pub fn module_status(state: &StateData, module_id: &str) -> ModuleStatus {
    if state.is_completed(module_id) {
        ModuleStatus::Completed
    } else if state.current_module_id == module_id || state.module_progress.contains_key(module_id) {
        ModuleStatus::InProgress
    } else {
        ModuleStatus::NotStarted
    }
}

/// True once every module of a non-empty curriculum is completed.
pub fn curriculum_complete(state: &StateData, modules: &[Module]) -> bool {
    !modules.is_empty() && modules.iter().all(|m| state.is_completed(&m.id))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaffoldingLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Level of guidance for a module: from the difficulty override if set, else its skill score.
pub fn scaffolding_level(state: &StateData, module_id: &str) -> ScaffoldingLevel {
    let score = match state.difficulty_override.as_deref() {
        Some("easy") => 2.0,
        Some("medium") => 5.0,
        Some("hard") => 8.0,
        _ => state.skill_score(module_id),
    };
    if score < 3.0 {
        ScaffoldingLevel::Beginner
    } else if score < PASS_THRESHOLD {
        ScaffoldingLevel::Intermediate
    } else {
        ScaffoldingLevel::Advanced
    }
}

/// Todo record key for a marker inside a module.
pub fn todo_key(module_id: &str, marker_id: &str) -> String {
    format!("{}:{}", module_id, marker_id.trim().to_ascii_lowercase())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveRef {
    pub objective_id: String,
    pub index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo_id: Option<String>,
}

/// Map a marker id (`obj-N` or a todo record id) onto an objective of `module`.
/// Unrecognized ids yield `None`; `obj-N` beyond the module's objectives is an error.
pub fn resolve_objective(state: &StateData, module: &Module, marker_id: Option<&str>) -> Result<Option<ObjectiveRef>> {
    let Some(id) = marker_id.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let (index, todo_id) = if let Some(todo) = state.todos.get(id).filter(|t| t.module_id == module.id) {
        (todo.objective_index, Some(todo.id.clone()))
    } else if let Some(n) = parse_objective_marker(id) {
        let key = todo_key(&module.id, id);
        (n, state.todos.contains_key(&key).then_some(key))
    } else {
        debug!(target: "gating", %id, "Marker id does not name an objective");
        return Ok(None);
    };

    let text = module
        .objective(index)
        .ok_or_else(|| TandemError::ObjectiveNotFound { module_id: module.id.clone(), index })?;
    Ok(Some(ObjectiveRef { objective_id: objective_marker(index), index, text: text.to_string(), todo_id }))
}

/// Objectives of `module` without a completion receipt, as `(marker id, text)`.
pub fn remaining_objectives(state: &StateData, module: &Module) -> Vec<(String, String)> {
    let progress = state.module_progress.get(&module.id);
    module
        .objectives
        .iter()
        .enumerate()
        .map(|(i, text)| (objective_marker(i + 1), text.clone()))
        .filter(|(id, _)| !progress.is_some_and(|p| p.has_completion(id, None)))
        .collect()
}

/// 1-based index of the first objective still to do.
pub fn next_objective_index(state: &StateData, module: &Module) -> Option<usize> {
    remaining_objectives(state, module)
        .first()
        .and_then(|(id, _)| parse_objective_marker(id))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advancement {
    pub module_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_to: Option<String>,
    pub curriculum_complete: bool,
}

/// Complete `module_id` and move to the next module, or enter the terminal state.
/// No-op when the module is already completed.
fn advance(state: &mut StateData, modules: &[Module], module_id: &str, now: DateTime<Utc>) -> Result<Advancement> {
    let mut out = Advancement::default();
    if state.is_completed(module_id) {
        out.curriculum_complete = curriculum_complete(state, modules);
        return Ok(out);
    }
    apply_mutation(state, StateMutation::CompleteModule(module_id.to_string()), now)?;
    out.module_completed = true;

    match next_module(modules, module_id) {
        Some(next) => {
            apply_mutation(state, StateMutation::SetCurrentModule(next.id.clone()), now)?;
            apply_mutation(state, StateMutation::SetAssessmentPending(true), now)?;
            info!(target: "gating", from = %module_id, to = %next.id, "Module completed; advanced");
            out.advanced_to = Some(next.id.clone());
        }
        None => {
            info!(target: "gating", module = %module_id, "Final module completed; curriculum complete");
        }
    }
    out.curriculum_complete = curriculum_complete(state, modules);
    Ok(out)
}

/// Inputs of one gated submission.
pub struct Submission<'a> {
    pub modules: &'a [Module],
    /// Id carried by the reviewed marker, if any.
    pub marker_id: Option<&'a str>,
    pub review: &'a ReviewResult,
    /// When false the advance rule is evaluated but the module pointer is left alone.
    pub auto_advance: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateOutcome {
    pub module_id: String,
    pub raw_score: f64,
    pub penalty: f64,
    pub adjusted_score: f64,
    pub best_score: f64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<ObjectiveRef>,
    pub objective_recorded: bool,
    pub objectives_completed: usize,
    pub total_objectives: usize,
    pub remaining_objectives: Vec<String>,
    pub can_progress: bool,
    #[serde(flatten)]
    pub advancement: Advancement,
}

/// Fold one reviewed submission into `state` for the current module.
pub fn apply_submission(
    state: &mut StateData,
    sub: &Submission<'_>,
    policy: &GatingPolicy,
    now: DateTime<Utc>,
) -> Result<GateOutcome> {
    let module = find_module(sub.modules, &state.current_module_id)?.clone();
    let objective = resolve_objective(state, &module, sub.marker_id)?;

    let progress = state.progress(&module.id);
    let raw_score = normalize_review_score(sub.review.score);
    let penalty = policy.penalty(progress.hints_used, progress.solutions_used);
    let adjusted = policy.adjusted(raw_score, progress.hints_used, progress.solutions_used);
    let passed = policy.passes(adjusted, sub.review.success);

    apply_mutation(state, StateMutation::IncrementAttempts { module_id: module.id.clone() }, now)?;
    apply_mutation(state, StateMutation::SetSkillScore(adjusted), now)?;

    let mut objective_recorded = false;
    if let Some(obj) = &objective {
        if passed {
            let completion = ObjectiveCompletion {
                objective_id: obj.objective_id.clone(),
                objective_text: obj.text.clone(),
                todo_id: obj.todo_id.clone(),
                completed_at: now,
                score: adjusted,
                hints_used: progress.hints_used,
                solutions_used: progress.solutions_used,
            };
            objective_recorded = apply_mutation(
                state,
                StateMutation::RecordCompletion { module_id: module.id.clone(), completion },
                now,
            )?;
        }
        if let Some(todo_id) = &obj.todo_id {
            let status = if passed { TodoStatus::Completed } else { TodoStatus::Failed };
            apply_mutation(state, StateMutation::UpsertTodo(TodoPatch::status(todo_id.clone(), status)), now)?;
        }
    }

    if !passed {
        let mistake = UserMistake {
            id: Uuid::new_v4().to_string(),
            module_id: module.id.clone(),
            objective_index: objective.as_ref().map(|o| o.index),
            todo_id: objective.as_ref().and_then(|o| o.todo_id.clone()),
            timestamp: now,
            weakness_area: objective.as_ref().map(|o| o.text.clone()).unwrap_or_else(|| "general".into()),
            description: format!(
                "Submission scored {:.1}/10 (raw {:.1}, penalty {:.1}); pass requires {:.1} and a successful review",
                adjusted, raw_score, penalty, policy.pass_threshold
            ),
            review_feedback: sub.review.feedback.clone(),
            review_score: raw_score,
            suggestions: sub.review.suggestions.clone(),
        };
        apply_mutation(state, StateMutation::RecordMistake(mistake), now)?;
    }

    let objectives_completed = state.progress(&module.id).objectives_completed.len();
    let total_objectives = module.objectives.len();
    let can_progress = policy.can_progress(objectives_completed, total_objectives, adjusted, sub.review.success);

    let advancement = if can_progress && sub.auto_advance {
        advance(state, sub.modules, &module.id, now)?
    } else {
        if passed && !can_progress {
            debug!(target: "gating", module = %module.id, objectives_completed, total_objectives, "Objective passed; module still open");
        }
        Advancement { curriculum_complete: curriculum_complete(state, sub.modules), ..Default::default() }
    };

    let remaining = remaining_objectives(state, &module).into_iter().map(|(id, _)| id).collect();
    info!(
        target: "gating",
        module = %module.id,
        raw = raw_score,
        penalty,
        adjusted,
        passed,
        objective_recorded,
        can_progress,
        "Submission gated"
    );

    Ok(GateOutcome {
        module_id: module.id.clone(),
        raw_score,
        penalty,
        adjusted_score: adjusted,
        best_score: state.progress(&module.id).best_score,
        passed,
        objective,
        objective_recorded,
        objectives_completed,
        total_objectives,
        remaining_objectives: remaining,
        can_progress,
        advancement,
    })
}

/// Advance on request, using the module's stored skill score. Completion receipts are
/// only ever written for successful reviews, so a full set stands in for review success.
pub fn apply_manual_advance(
    state: &mut StateData,
    modules: &[Module],
    policy: &GatingPolicy,
    now: DateTime<Utc>,
) -> Result<(bool, Advancement)> {
    let module = find_module(modules, &state.current_module_id)?.clone();
    let completed = state.progress(&module.id).objectives_completed.len();
    let score = state.skill_score(&module.id);
    let can = policy.can_progress(completed, module.objectives.len(), score, completed > 0);
    if !can {
        return Ok((false, Advancement { curriculum_complete: curriculum_complete(state, modules), ..Default::default() }));
    }
    Ok((true, advance(state, modules, &module.id, now)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModuleProgress;

    fn modules() -> Vec<Module> {
        vec![
            Module { id: "basics".into(), title: "Basics".into(), objectives: vec!["Variables".into(), "Loops".into()] },
            Module { id: "ownership".into(), title: "Ownership".into(), objectives: vec!["Moves".into()] },
        ]
    }

    fn review(success: bool, score: f64) -> ReviewResult {
        ReviewResult { success, feedback: "fb".into(), score: Some(score), suggestions: vec!["s".into()] }
    }

    fn submit(state: &mut StateData, mods: &[Module], marker: Option<&str>, r: &ReviewResult) -> GateOutcome {
        let sub = Submission { modules: mods, marker_id: marker, review: r, auto_advance: true };
        apply_submission(state, &sub, &GatingPolicy::default(), Utc::now()).unwrap()
    }

    #[test]
    fn penalty_table_and_cap() {
        assert_eq!(calculate_penalty(0, 0), 0.0);
        assert_eq!(calculate_penalty(1, 0), 0.5);
        assert_eq!(calculate_penalty(0, 1), 1.5);
        assert_eq!(calculate_penalty(2, 1), 2.5);
        assert_eq!(calculate_penalty(10, 10), 3.0);
    }

    #[test]
    fn penalty_is_monotonic_in_both_arguments() {
        for h in 0..8 {
            for s in 0..8 {
                let p = calculate_penalty(h, s);
                assert!(calculate_penalty(h + 1, s) >= p);
                assert!(calculate_penalty(h, s + 1) >= p);
                assert!(p <= PENALTY_CAP);
            }
        }
    }

    #[test]
    fn adjusted_score_never_negative() {
        assert_eq!(adjusted_score(8.0, 2, 0), 7.0);
        assert_eq!(adjusted_score(1.0, 0, 2), 0.0);
    }

    #[test]
    fn review_scores_are_rescaled() {
        assert_eq!(normalize_review_score(Some(80.0)), 8.0);
        assert_eq!(normalize_review_score(Some(7.5)), 7.5);
        assert_eq!(normalize_review_score(Some(250.0)), 10.0);
        assert_eq!(normalize_review_score(Some(-3.0)), 0.0);
        assert_eq!(normalize_review_score(None), 0.0);
        assert_eq!(normalize_review_score(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn low_percentage_ai_score_does_not_pass() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        let r = crate::review::parse_scaled_review(r#"{"success": true, "feedback": "barely", "score": 9}"#, 100.0);
        let out = submit(&mut state, &mods, Some("obj-1"), &r);

        assert!(!out.passed);
        assert!(!out.objective_recorded);
        assert!((out.adjusted_score - 0.9).abs() < 1e-9);
        assert!(state.progress("basics").objectives_completed.is_empty());
        assert_eq!(scaffolding_level(&state, "basics"), ScaffoldingLevel::Beginner);
    }

    #[test]
    fn cannot_progress_with_objectives_outstanding() {
        let p = GatingPolicy::default();
        assert!(!p.can_progress(1, 2, 10.0, true));
        assert!(!p.can_progress(0, 1, 10.0, true));
        assert!(p.can_progress(2, 2, 7.0, true));
        assert!(!p.can_progress(2, 2, 6.9, true));
        assert!(!p.can_progress(2, 2, 9.0, false));
    }

    #[test]
    fn partial_progress_records_objective_without_advancing() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        let out = submit(&mut state, &mods, Some("obj-1"), &review(true, 80.0));

        assert!(out.passed);
        assert!(out.objective_recorded);
        assert!(!out.can_progress);
        assert_eq!(out.remaining_objectives, vec!["obj-2"]);
        assert_eq!(state.current_module_id, "basics");
        assert!(state.completed_modules.is_empty());
        assert_eq!(state.skill_score("basics"), 8.0);
        assert_eq!(state.progress("basics").attempts, 1);
    }

    #[test]
    fn completing_all_objectives_advances_to_next_module() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        submit(&mut state, &mods, Some("obj-1"), &review(true, 80.0));
        let out = submit(&mut state, &mods, Some("obj-2"), &review(true, 90.0));

        assert!(out.can_progress);
        assert!(out.advancement.module_completed);
        assert_eq!(out.advancement.advanced_to.as_deref(), Some("ownership"));
        assert_eq!(state.completed_modules, vec!["basics"]);
        assert_eq!(state.current_module_id, "ownership");
        assert_eq!(state.assessment_pending, Some(true));
        assert_eq!(state.skill_score("basics"), 9.0);
        assert_eq!(module_status(&state, "basics"), ModuleStatus::Completed);
        assert_eq!(module_status(&state, "ownership"), ModuleStatus::InProgress);
    }

    #[test]
    fn replayed_completion_is_not_double_counted() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        submit(&mut state, &mods, Some("obj-1"), &review(true, 9.0));
        let out = submit(&mut state, &mods, Some("obj-1"), &review(true, 9.5));
        assert!(!out.objective_recorded);
        assert_eq!(out.objectives_completed, 1);
        assert_eq!(state.progress("basics").best_score, 9.5);
    }

    #[test]
    fn final_module_enters_terminal_state() {
        let mods = modules();
        let mut state = StateData::new("ownership", 2);
        state.completed_modules.push("basics".into());
        let out = submit(&mut state, &mods, Some("obj-1"), &review(true, 10.0));

        assert!(out.advancement.module_completed);
        assert!(out.advancement.advanced_to.is_none());
        assert!(out.advancement.curriculum_complete);
        assert_eq!(state.current_module_id, "ownership");

        let again = submit(&mut state, &mods, Some("obj-1"), &review(true, 10.0));
        assert!(!again.advancement.module_completed);
        assert_eq!(state.completed_modules, vec!["basics", "ownership"]);
    }

    #[test]
    fn penalties_can_sink_a_passing_review() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        state.module_progress.insert(
            "basics".into(),
            ModuleProgress { hints_used: 2, solutions_used: 1, ..ModuleProgress::empty() },
        );
        let out = submit(&mut state, &mods, Some("obj-1"), &review(true, 9.0));

        assert_eq!(out.penalty, 2.5);
        assert_eq!(out.adjusted_score, 6.5);
        assert!(!out.passed);
        assert_eq!(out.objectives_completed, 0);
        assert_eq!(state.user_mistakes.len(), 1);
        assert_eq!(state.user_mistakes[0].weakness_area, "Variables");
        assert_eq!(state.user_mistakes[0].objective_index, Some(1));
    }

    #[test]
    fn failed_review_never_records_completion() {
        let mods = modules();
        let mut state = StateData::new("ownership", 2);
        let out = submit(&mut state, &mods, Some("obj-1"), &review(false, 10.0));
        assert!(!out.passed);
        assert!(!out.can_progress);
        assert!(state.completed_modules.is_empty());
    }

    #[test]
    fn out_of_range_objective_is_an_error() {
        let mods = modules();
        let mut state = StateData::new("ownership", 2);
        let r = review(true, 9.0);
        let sub = Submission { modules: &mods, marker_id: Some("obj-5"), review: &r, auto_advance: true };
        let err = apply_submission(&mut state, &sub, &GatingPolicy::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, TandemError::ObjectiveNotFound { index: 5, .. }));
    }

    #[test]
    fn unknown_current_module_is_an_error() {
        let mods = modules();
        let mut state = StateData::new("gone", 2);
        let r = review(true, 9.0);
        let sub = Submission { modules: &mods, marker_id: None, review: &r, auto_advance: true };
        let err = apply_submission(&mut state, &sub, &GatingPolicy::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, TandemError::ModuleNotFound(_)));
    }

    #[test]
    fn todo_ids_resolve_and_track_status() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        let key = todo_key("basics", "obj-2");
        apply_mutation(
            &mut state,
            StateMutation::UpsertTodo(TodoPatch {
                id: key.clone(),
                module_id: Some("basics".into()),
                objective_index: Some(2),
                ..Default::default()
            }),
            Utc::now(),
        )
        .unwrap();

        submit(&mut state, &mods, Some(key.as_str()), &review(false, 3.0));
        assert_eq!(state.todos[&key].status, TodoStatus::Failed);

        let out = submit(&mut state, &mods, Some("obj-2"), &review(true, 8.0));
        assert_eq!(out.objective.as_ref().and_then(|o| o.todo_id.as_deref()), Some(key.as_str()));
        assert_eq!(state.todos[&key].status, TodoStatus::Completed);
        assert!(state.todos[&key].completed_at.is_some());
    }

    #[test]
    fn manual_mode_defers_and_advance_applies_later() {
        let mods = modules();
        let mut state = StateData::new("ownership", 2);
        let r = review(true, 9.0);
        let sub = Submission { modules: &mods, marker_id: Some("obj-1"), review: &r, auto_advance: false };
        let out = apply_submission(&mut state, &sub, &GatingPolicy::default(), Utc::now()).unwrap();
        assert!(out.can_progress);
        assert!(!out.advancement.module_completed);
        assert!(state.completed_modules.is_empty());

        let (can, adv) = apply_manual_advance(&mut state, &mods, &GatingPolicy::default(), Utc::now()).unwrap();
        assert!(can);
        assert!(adv.module_completed);
        assert_eq!(state.completed_modules, vec!["ownership"]);
    }

    #[test]
    fn manual_advance_refuses_incomplete_module() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        state.skill_scores.insert("basics".into(), 9.0);
        let (can, adv) = apply_manual_advance(&mut state, &mods, &GatingPolicy::default(), Utc::now()).unwrap();
        assert!(!can);
        assert_eq!(adv, Advancement::default());
    }

    #[test]
    fn scaffolding_follows_override_then_score() {
        let mut state = StateData::new("basics", 1);
        assert_eq!(scaffolding_level(&state, "basics"), ScaffoldingLevel::Beginner);
        state.skill_scores.insert("basics".into(), 7.5);
        assert_eq!(scaffolding_level(&state, "basics"), ScaffoldingLevel::Advanced);
        state.difficulty_override = Some("medium".into());
        assert_eq!(scaffolding_level(&state, "basics"), ScaffoldingLevel::Intermediate);
    }

    #[test]
    fn next_objective_skips_completed_ones() {
        let mods = modules();
        let mut state = StateData::new("basics", 2);
        assert_eq!(next_objective_index(&state, &mods[0]), Some(1));
        submit(&mut state, &mods, Some("obj-1"), &review(true, 9.0));
        assert_eq!(next_objective_index(&state, &mods[0]), Some(2));
    }
}
