//! Review prompts, review-response parsing and the offline fallbacks.
//!
//! Parsing never fails: an unparseable response becomes a failed `ReviewResult` whose
//! feedback carries the parse error and the raw text, so gating always sees a well-formed
//! result.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Prompts;
use crate::domain::{CodingBias, Module, ReviewResult};
use crate::error::{Result, TandemError};
use crate::extractor::Extraction;
use crate::util::{fill_template, trunc_for_log};

/// Everything a prompt needs to know about the work being reviewed.
pub struct ReviewContext<'a> {
  pub module: &'a Module,
  /// Objective text when the marker names one.
  pub objective: Option<&'a str>,
  pub extraction: &'a Extraction,
}

impl ReviewContext<'_> {
  fn objective_text(&self) -> &str {
    self.objective.unwrap_or("(not linked to a module objective)")
  }

  fn criteria_text(&self) -> String {
    if self.extraction.success_criteria.is_empty() {
      "(none given)".to_string()
    } else {
      self.extraction.success_criteria.iter().map(|c| format!("- {}", c)).collect::<Vec<_>>().join("\n")
    }
  }
}

pub fn build_review_prompt(prompts: &Prompts, ctx: &ReviewContext<'_>) -> String {
  let ex = ctx.extraction;
  let start = ex.start_line.to_string();
  let end = ex.end_line.to_string();
  let criteria = ctx.criteria_text();
  fill_template(
    &prompts.review_user_template,
    &[
      ("module_title", ctx.module.title.as_str()),
      ("objective", ctx.objective_text()),
      ("task", ex.marker_text.as_str()),
      ("criteria", criteria.as_str()),
      ("file_path", ex.file_path.as_str()),
      ("start_line", start.as_str()),
      ("end_line", end.as_str()),
      ("language", ex.language.as_str()),
      ("code", ex.code.as_str()),
    ],
  )
}

fn strip_code_fence(text: &str) -> &str {
  let mut t = text.trim();
  if let Some(rest) = t.strip_prefix("```json") {
    t = rest;
  } else if let Some(rest) = t.strip_prefix("```") {
    t = rest;
  }
  if let Some(rest) = t.strip_suffix("```") {
    t = rest;
  }
  t.trim()
}

fn number(v: &Value) -> Option<f64> {
  match v {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn decode_review(body: &str) -> Result<ReviewResult> {
  let data: Value = serde_json::from_str(body).map_err(|e| TandemError::ParseFailure(e.to_string()))?;
  let Value::Object(obj) = data else {
    return Err(TandemError::ParseFailure("expected a JSON object".into()));
  };

  let suggestions = match obj.get("suggestions") {
    Some(Value::Array(items)) => items
      .iter()
      .filter_map(|s| match s {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
      })
      .collect(),
    _ => Vec::new(),
  };
  Ok(ReviewResult {
    success: obj.get("success").and_then(Value::as_bool).unwrap_or(false),
    feedback: obj
      .get("feedback")
      .and_then(Value::as_str)
      .unwrap_or("No feedback provided")
      .to_string(),
    score: obj.get("score").and_then(number),
    suggestions,
  })
}

/// Parse a reviewer's JSON reply, tolerating markdown fences and loose field types.
pub fn parse_review_response(text: &str) -> ReviewResult {
  let body = strip_code_fence(text);
  match decode_review(body) {
    Ok(r) => r,
    Err(TandemError::ParseFailure(msg)) => {
      warn!(target: "review", error = %msg, preview = %trunc_for_log(body, 120), "Unparseable review response");
      ReviewResult::failed(format!("Failed to parse review response: {}\n\nRaw response:\n{}", msg, body))
    }
    Err(e) => ReviewResult::failed(format!("Failed to parse review response: {}", e)),
  }
}

/// Parse a reviewer reply scored out of `score_max` and bring the score onto 0-10.
pub fn parse_scaled_review(text: &str, score_max: f64) -> ReviewResult {
  let mut review = parse_review_response(text);
  if score_max.is_finite() && score_max > 0.0 {
    review.score = review.score.map(|s| s * 10.0 / score_max);
  }
  review
}

const PLACEHOLDERS: &[&str] = &[
  "todo!(", "unimplemented!(", "notimplementederror", "not implemented", "raise notimplemented",
  "throw new error(\"todo", "panic(\"todo", "your code here",
];

fn is_placeholder_body(code: &str) -> bool {
  let meaningful: Vec<String> = code
    .lines()
    .map(|l| l.trim().to_lowercase())
    .filter(|l| !l.is_empty() && !crate::grammar::is_comment_line(l))
    .collect();
  if meaningful.is_empty() { return true; }
  if meaningful.iter().all(|l| matches!(l.as_str(), "pass" | "..." | "{}" | "}" | "{")) { return true; }
  meaningful.iter().any(|l| PLACEHOLDERS.iter().any(|p| l.contains(p)))
}

fn keywords(criterion: &str) -> Vec<String> {
  criterion
    .split(|c: char| !c.is_alphanumeric() && c != '_')
    .filter(|w| w.len() >= 4)
    .map(str::to_lowercase)
    .collect()
}

/// Deterministic rubric used when no AI reviewer is configured. Scores on the 0-10 scale.
pub fn local_review(extraction: &Extraction) -> ReviewResult {
  let code = extraction.code.to_lowercase();
  if code.trim().is_empty() {
    return ReviewResult {
      success: false,
      feedback: "(local) No code found below the marker.".into(),
      score: Some(0.0),
      suggestions: vec!["Write your solution directly under the TODO line.".into()],
    };
  }
  if is_placeholder_body(&extraction.code) {
    return ReviewResult {
      success: false,
      feedback: "(local) The marked block still holds placeholder code.".into(),
      score: Some(2.0),
      suggestions: vec!["Replace the placeholder with a working implementation.".into()],
    };
  }

  let mut missing = Vec::new();
  for criterion in &extraction.success_criteria {
    let words = keywords(criterion);
    if !words.is_empty() && !words.iter().any(|w| code.contains(w.as_str())) {
      missing.push(criterion.clone());
    }
  }
  let total = extraction.success_criteria.len();
  let score = if total == 0 {
    8.0
  } else {
    let covered = (total - missing.len()) as f64 / total as f64;
    (5.0 + 5.0 * covered).min(10.0)
  };
  debug!(target: "review", score, criteria = total, missing = missing.len(), "Local rubric applied");

  let success = missing.is_empty();
  let feedback = if success {
    "(local) The block is implemented and mentions every success criterion.".to_string()
  } else {
    format!("(local) {} of {} success criteria are not visibly addressed.", missing.len(), total)
  };
  ReviewResult {
    success,
    feedback,
    score: Some(score),
    suggestions: missing.into_iter().map(|c| format!("Address: {}", c)).collect(),
  }
}

/// Hint prompts get more specific with every hint already taken in the module.
pub fn level_instruction(hints_used: u32) -> &'static str {
  match hints_used {
    0 => "Please provide a general hint to get me started.",
    1 => "Please provide a more specific hint.",
    _ => "Please provide a very detailed hint.",
  }
}

fn bias_label(bias: CodingBias) -> &'static str {
  match bias {
    CodingBias::Guided => "guided (step-by-step help welcome)",
    CodingBias::Balanced => "balanced",
    CodingBias::Independent => "independent (nudge only)",
  }
}

pub fn build_hint_prompt(
  prompts: &Prompts,
  module: &Module,
  objective: &str,
  task: &str,
  bias: CodingBias,
  hints_used: u32,
) -> String {
  fill_template(
    &prompts.hint_user_template,
    &[
      ("module_title", module.title.as_str()),
      ("objective", objective),
      ("task", task),
      ("coding_bias", bias_label(bias)),
      ("level_instruction", level_instruction(hints_used)),
    ],
  )
}

pub fn build_solution_prompt(
  prompts: &Prompts,
  module: &Module,
  objective: &str,
  task: &str,
  language: &str,
  criteria: &[String],
) -> String {
  let criteria = if criteria.is_empty() {
    "(none given)".to_string()
  } else {
    criteria.iter().map(|c| format!("- {}", c)).collect::<Vec<_>>().join("\n")
  };
  fill_template(
    &prompts.solution_user_template,
    &[
      ("module_title", module.title.as_str()),
      ("objective", objective),
      ("task", task),
      ("language", language),
      ("criteria", criteria.as_str()),
    ],
  )
}

/// Offline hint: restates the objective, more concretely as hints accumulate.
pub fn local_hint(module: &Module, objective: &str, criteria: &[String], hints_used: u32) -> String {
  match hints_used {
    0 => format!("Focus on the objective \"{}\" from {}. Start small and get one case working.", objective, module.title),
    1 if !criteria.is_empty() => format!("Your code must satisfy: {}.", criteria.join("; ")),
    1 => format!("Break \"{}\" into steps and write the first one under the TODO marker.", objective),
    _ => {
      let mut out = format!("Objective: {}.", objective);
      for (i, c) in criteria.iter().enumerate() {
        out.push_str(&format!("\n{}. Make sure that {}.", i + 1, c));
      }
      out.push_str("\nWrite the code directly below the TODO line, then submit again.");
      out
    }
  }
}

/// Offline stand-in for a reference solution.
pub fn local_solution(objective: &str, criteria: &[String]) -> String {
  let mut out = format!(
    "No AI reviewer is configured, so no reference solution is available.\nObjective: {}",
    objective
  );
  if !criteria.is_empty() {
    out.push_str("\nA complete solution satisfies:");
    for c in criteria {
      out.push_str(&format!("\n- {}", c));
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn extraction(code: &str, criteria: &[&str]) -> Extraction {
    Extraction {
      file_path: "src/lib.rs".into(),
      language: "rust".into(),
      marker_line: 3,
      marker_text: "sum the list".into(),
      marker_id: Some("obj-1".into()),
      code: code.into(),
      start_line: 4,
      end_line: 4 + code.lines().count().saturating_sub(1),
      success_criteria: criteria.iter().map(|s| s.to_string()).collect(),
    }
  }

  #[test]
  fn parses_fenced_json() {
    let r = parse_review_response("```json\n{\"success\": true, \"feedback\": \"ok\", \"score\": 85, \"suggestions\": [\"x\"]}\n```");
    assert!(r.success);
    assert_eq!(r.feedback, "ok");
    assert_eq!(r.score, Some(85.0));
    assert_eq!(r.suggestions, vec!["x"]);
  }

  #[test]
  fn missing_fields_get_defaults() {
    let r = parse_review_response(r#"{"score": "7.5"}"#);
    assert!(!r.success);
    assert_eq!(r.feedback, "No feedback provided");
    assert_eq!(r.score, Some(7.5));
    assert!(r.suggestions.is_empty());
  }

  #[test]
  fn unparseable_response_becomes_failed_result() {
    let r = parse_review_response("Looks great to me!");
    assert!(!r.success);
    assert!(r.feedback.starts_with("Failed to parse review response"));
    assert!(r.feedback.contains("Looks great to me!"));
    assert_eq!(r.score, None);

    let r = parse_review_response("[1, 2]");
    assert!(!r.success);
  }

  #[test]
  fn scaled_review_divides_by_the_declared_range() {
    let r = parse_scaled_review(r#"{"success": true, "feedback": "barely", "score": 9}"#, 100.0);
    assert_eq!(r.score, Some(0.9));
    let r = parse_scaled_review(r#"{"success": true, "score": 85}"#, 100.0);
    assert_eq!(r.score, Some(8.5));
    let r = parse_scaled_review(r#"{"success": true, "score": 7}"#, 10.0);
    assert_eq!(r.score, Some(7.0));
    assert_eq!(parse_scaled_review("nope", 100.0).score, None);
  }

  #[test]
  fn review_prompt_fills_every_placeholder() {
    let module = Module { id: "m".into(), title: "Iterators".into(), objectives: vec!["Use fold".into()] };
    let ex = extraction("xs.iter().sum()", &["returns the total"]);
    let prompt = build_review_prompt(
      &Prompts::default(),
      &ReviewContext { module: &module, objective: Some("Use fold"), extraction: &ex },
    );
    assert!(prompt.contains("Iterators"));
    assert!(prompt.contains("Use fold"));
    assert!(prompt.contains("- returns the total"));
    assert!(prompt.contains("xs.iter().sum()"));
    assert!(prompt.contains("lines 4-4"));
    assert!(!prompt.contains("{code}"));
  }

  #[test]
  fn local_rubric_rejects_empty_and_placeholder_bodies() {
    assert_eq!(local_review(&extraction("", &[])).score, Some(0.0));
    let r = local_review(&extraction("    todo!()", &[]));
    assert!(!r.success);
    assert_eq!(r.score, Some(2.0));
    assert!(!local_review(&extraction("    pass", &[])).success);
  }

  #[test]
  fn local_rubric_checks_criteria_keywords() {
    let ok = local_review(&extraction("let total = xs.iter().sum::<i32>();\ntotal", &["returns the total"]));
    assert!(ok.success);
    assert_eq!(ok.score, Some(10.0));
    assert!(ok.feedback.starts_with("(local)"));

    let partial = local_review(&extraction("let n = 1;", &["returns the total", "handles empty input"]));
    assert!(!partial.success);
    assert_eq!(partial.score, Some(5.0));
    assert_eq!(partial.suggestions.len(), 2);
  }

  #[test]
  fn hints_escalate() {
    assert!(level_instruction(0).contains("general"));
    assert!(level_instruction(1).contains("more specific"));
    assert!(level_instruction(5).contains("very detailed"));

    let module = Module { id: "m".into(), title: "Basics".into(), objectives: vec![] };
    let criteria = vec!["prints hello".to_string()];
    assert!(local_hint(&module, "Print", &criteria, 0).contains("Basics"));
    assert!(local_hint(&module, "Print", &criteria, 1).contains("prints hello"));
    assert!(local_hint(&module, "Print", &criteria, 2).contains("1. Make sure that prints hello"));
  }
}
