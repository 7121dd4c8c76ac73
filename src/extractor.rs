//! Locates objective markers in learner files and slices out the code each marker owns.
//!
//! Extraction never fails loudly: an unreadable file or one without markers yields
//! `None` / an empty list, meaning "nothing to review".

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::grammar::{is_comment_line, strip_comment_prefix, success_criteria_pattern, syntax_for_path, todo_pattern};

/// One `TODO` marker line. `line` is 1-based.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
  pub line: usize,
  pub text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
}

/// Which marker to extract when a file holds several.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkerSelector {
  /// Position in file order; negative counts from the end (`-1` is the last marker).
  Index(isize),
  /// First marker whose task text contains this, case-insensitively.
  Text(String),
  /// First marker whose bracketed id equals this, case-insensitively.
  Id(String),
}

impl Default for MarkerSelector {
  fn default() -> Self { MarkerSelector::Index(-1) }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
  pub file_path: String,
  pub language: String,
  pub marker_line: usize,
  pub marker_text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub marker_id: Option<String>,
  pub code: String,
  /// 1-based, inclusive; `end_line < start_line` when the body is empty.
  pub start_line: usize,
  pub end_line: usize,
  pub success_criteria: Vec<String>,
}

fn scan_markers(lines: &[&str]) -> Vec<Marker> {
  let re = todo_pattern();
  lines
    .iter()
    .enumerate()
    .filter_map(|(i, line)| {
      let caps = re.captures(line)?;
      let id = caps
        .get(1)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
      let text = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
      Some(Marker { line: i + 1, text, id })
    })
    .collect()
}

fn read_lines(path: &Path) -> Option<String> {
  match std::fs::read_to_string(path) {
    Ok(s) => Some(s),
    Err(e) => {
      debug!(target: "codetandem", path = %path.display(), error = %e, "Cannot read file for markers");
      None
    }
  }
}

/// Every marker in file order. Unreadable files yield an empty list.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn find_all_markers(path: &Path) -> Vec<Marker> {
  match read_lines(path) {
    Some(content) => scan_markers(&content.lines().collect::<Vec<_>>()),
    None => Vec::new(),
  }
}

fn select<'a>(markers: &'a [Marker], selector: &MarkerSelector) -> Option<(usize, &'a Marker)> {
  match selector {
    MarkerSelector::Text(needle) => {
      let needle = needle.to_lowercase();
      markers.iter().enumerate().find(|(_, m)| m.text.to_lowercase().contains(&needle))
    }
    MarkerSelector::Id(id) => markers
      .iter()
      .enumerate()
      .find(|(_, m)| m.id.as_deref().is_some_and(|mid| mid.eq_ignore_ascii_case(id))),
    MarkerSelector::Index(i) => {
      let pos = if *i < 0 { markers.len() as isize + i } else { *i };
      if pos < 0 { return None; }
      let pos = pos as usize;
      markers.get(pos).map(|m| (pos, m))
    }
  }
}

/// Criteria live in the unbroken comment block right above the marker, headed by
/// `SUCCESS CRITERIA for [<id>]`. Blank lines may sit in between; code may not.
fn success_criteria(lines: &[&str], marker_line: usize, id: &str) -> Vec<String> {
  let header = match success_criteria_pattern(id) {
    Some(re) => re,
    None => return Vec::new(),
  };
  let marker_idx = marker_line - 1;

  let mut header_idx = None;
  for i in (0..marker_idx).rev() {
    let line = lines[i];
    if line.trim().is_empty() { continue; }
    if !is_comment_line(line) { break; }
    if header.is_match(line) {
      header_idx = Some(i);
      break;
    }
  }

  let Some(start) = header_idx else { return Vec::new() };
  lines[start + 1..marker_idx]
    .iter()
    .filter(|l| is_comment_line(l) && !l.contains("TODO:"))
    .map(|l| strip_comment_prefix(l).trim_start_matches('-').trim().to_string())
    .filter(|s| !s.is_empty())
    .collect()
}

/// Extract the code owned by the selected marker: from the line after it up to the line
/// before the next marker (or end of file), with trailing blank lines trimmed.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), ?selector))]
pub fn extract_marked_code(path: &Path, selector: &MarkerSelector) -> Option<Extraction> {
  let content = read_lines(path)?;
  let lines: Vec<&str> = content.lines().collect();
  let markers = scan_markers(&lines);
  if markers.is_empty() {
    debug!(target: "codetandem", "No markers in file");
    return None;
  }

  let (pos, marker) = select(&markers, selector)?;
  let body_end = markers.get(pos + 1).map(|next| next.line - 1).unwrap_or(lines.len());

  let mut body: Vec<&str> = lines[marker.line..body_end].to_vec();
  while body.last().is_some_and(|l| l.trim().is_empty()) {
    body.pop();
  }

  let success_criteria = marker
    .id
    .as_deref()
    .map(|id| success_criteria(&lines, marker.line, id))
    .unwrap_or_default();

  let extraction = Extraction {
    file_path: path.display().to_string(),
    language: syntax_for_path(path).language.to_string(),
    marker_line: marker.line,
    marker_text: marker.text.clone(),
    marker_id: marker.id.clone(),
    code: body.join("\n"),
    start_line: marker.line + 1,
    end_line: marker.line + body.len(),
    success_criteria,
  };
  debug!(
    target: "codetandem",
    marker_line = extraction.marker_line,
    start = extraction.start_line,
    end = extraction.end_line,
    criteria = extraction.success_criteria.len(),
    "Extracted marked code"
  );
  Some(extraction)
}
