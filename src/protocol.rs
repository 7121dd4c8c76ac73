//! Public protocol structs for the HTTP endpoints (serde ready, camelCase on the wire).
//! Keep this small and stable so clients can evolve independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Module, ModuleProgress, ReviewResult, Settings, StateData, TodoRecord};
use crate::extractor::{Extraction, Marker};
use crate::gating::{Advancement, GateOutcome, ModuleStatus, ScaffoldingLevel};

// ---- Requests ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitIn {
    pub curriculum_path: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
    pub file_path: String,
}

/// Which marker a submission targets. Precedence: `markerId`, then `todo` text, then `index`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    pub file_path: String,
    #[serde(default)]
    pub todo: Option<String>,
    #[serde(default)]
    pub marker_id: Option<String>,
    #[serde(default)]
    pub index: Option<isize>,
}

/// Hint/solution request. Without a file, the next open objective is used.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistIn {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub marker_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LevelIn {
    pub difficulty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetIn {
    pub module_id: String,
    #[serde(default)]
    pub confirm: bool,
}

// ---- Responses ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub ok: bool,
    pub version: &'static str,
    pub ai_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct InitOut {
    pub modules: Vec<Module>,
    pub state: StateData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveOut {
    pub id: String,
    pub index: usize,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ModuleOut {
    pub id: String,
    pub title: String,
    pub status: ModuleStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOut {
    pub current_module_id: String,
    pub current_module_title: String,
    pub objectives: Vec<ObjectiveOut>,
    pub remaining_objectives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_objective: Option<usize>,
    pub skill_scores: BTreeMap<String, f64>,
    pub best_score: f64,
    pub attempts: u32,
    pub hints_used: u32,
    pub solutions_used: u32,
    pub penalty: f64,
    pub scaffolding_level: ScaffoldingLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_override: Option<String>,
    pub assessment_pending: bool,
    pub completed_modules: Vec<String>,
    pub modules: Vec<ModuleOut>,
    pub curriculum_complete: bool,
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkersOut {
    pub file_path: String,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOut {
    pub registered: Vec<TodoRecord>,
    /// Markers without an `obj-N` id of the current module.
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    pub extraction: Extraction,
    pub review: ReviewResult,
    /// "openai" or "local".
    pub reviewer: &'static str,
    pub outcome: GateOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistOut {
    pub text: String,
    pub source: &'static str,
    pub module_id: String,
    pub objective: String,
    pub hints_used: u32,
    pub solutions_used: u32,
    pub penalty: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_override: Option<String>,
    pub scaffolding_level: ScaffoldingLevel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOut {
    pub can_progress: bool,
    pub current_module_id: String,
    #[serde(flatten)]
    pub advancement: Advancement,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOut {
    pub module_id: String,
    pub progress: ModuleProgress,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: &'static str,
    pub message: String,
}
