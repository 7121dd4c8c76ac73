//! Markdown curriculum parsing and the modules document.
//!
//! Format: a `# Title` line opens a module, `- item` / `* item` lines under it are objectives.
//! `##` and deeper headings, prose and blank lines are ignored. Modules without objectives
//! are dropped.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::domain::Module;
use crate::error::{Result, TandemError};
use crate::store::write_json_atomic;

/// Deterministic module id: lowercase, non-alphanumerics stripped, whitespace runs become `-`.
pub fn slugify(title: &str) -> String {
  let mut out = String::with_capacity(title.len());
  for ch in title.to_lowercase().chars() {
    if ch.is_ascii_alphanumeric() {
      out.push(ch);
    } else if (ch.is_whitespace() || ch == '-') && !out.is_empty() && !out.ends_with('-') {
      out.push('-');
    }
  }
  while out.ends_with('-') { out.pop(); }
  out
}

/// Parse curriculum Markdown into modules, in document order. Never fails.
pub fn parse_curriculum(text: &str) -> Vec<Module> {
  let mut modules = Vec::new();
  let mut current: Option<Module> = None;

  for line in text.lines() {
    let line = line.trim_end();
    if let Some(title) = line.strip_prefix("# ") {
      flush(&mut modules, current.take());
      let title = title.trim().to_string();
      current = Some(Module { id: slugify(&title), title, objectives: Vec::new() });
    } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
      if let Some(m) = current.as_mut() {
        let item = item.trim();
        if !item.is_empty() { m.objectives.push(item.to_string()); }
      }
    }
  }
  flush(&mut modules, current);
  modules
}

fn flush(modules: &mut Vec<Module>, module: Option<Module>) {
  if let Some(m) = module {
    if !m.objectives.is_empty() { modules.push(m); }
  }
}

/// Reject modules documents where two modules share an id.
fn ensure_unique_ids(modules: &[Module]) -> Result<()> {
  let mut seen = HashSet::new();
  for m in modules {
    if !seen.insert(m.id.as_str()) {
      return Err(TandemError::InvalidStructure(format!("duplicate module id '{}'", m.id)));
    }
  }
  Ok(())
}

/// Parse the curriculum at `curriculum_path` and write the modules document to `output_path`.
#[instrument(level = "info", skip_all, fields(curriculum = %curriculum_path.display(), output = %output_path.display()))]
pub fn generate_modules_document(curriculum_path: &Path, output_path: &Path) -> Result<Vec<Module>> {
  let text = std::fs::read_to_string(curriculum_path)
    .map_err(|e| TandemError::from_io(curriculum_path, e))?;
  let modules = parse_curriculum(&text);
  if modules.is_empty() {
    return Err(TandemError::InvalidStructure("curriculum contains no modules with objectives".into()));
  }
  ensure_unique_ids(&modules)?;
  write_json_atomic(output_path, &modules)?;
  info!(target: "codetandem", modules = modules.len(), "Modules document written");
  Ok(modules)
}

/// Load and validate the modules document.
///
/// The canonical shape is a JSON array of modules; the older `{ "modules": [...] }`
/// wrapper is unwrapped here and never seen past this function.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_modules(path: &Path) -> Result<Vec<Module>> {
  let raw = std::fs::read_to_string(path).map_err(|e| TandemError::from_io(path, e))?;
  let value: Value = serde_json::from_str(&raw)?;
  let items = match value {
    Value::Array(items) => items,
    Value::Object(mut obj) => match obj.remove("modules") {
      Some(Value::Array(items)) => {
        warn!(target: "codetandem", "Legacy modules document wrapper; normalizing");
        items
      }
      _ => return Err(TandemError::InvalidStructure("modules document must be an array".into())),
    },
    _ => return Err(TandemError::InvalidStructure("modules document must be an array".into())),
  };

  let mut modules = Vec::with_capacity(items.len());
  for (i, item) in items.into_iter().enumerate() {
    let module: Module = serde_json::from_value(item)
      .map_err(|e| TandemError::InvalidStructure(format!("module #{}: {}", i, e)))?;
    modules.push(module);
  }
  ensure_unique_ids(&modules)?;
  Ok(modules)
}

pub fn find_module<'a>(modules: &'a [Module], id: &str) -> Result<&'a Module> {
  modules
    .iter()
    .find(|m| m.id == id)
    .ok_or_else(|| TandemError::ModuleNotFound(id.to_string()))
}

/// The module that follows `id` in curriculum order, if any.
pub fn next_module<'a>(modules: &'a [Module], id: &str) -> Option<&'a Module> {
  let pos = modules.iter().position(|m| m.id == id)?;
  modules.get(pos + 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  const CURRICULUM: &str = "\
# Rust Basics
- Variables and mutability
* Control flow

## Notes
Some prose that is ignored.

# Empty Module

# Ownership & Borrowing
- Move semantics
-
- References
";

  #[test]
  fn slugify_examples() {
    assert_eq!(slugify("Advanced C++ Programming!"), "advanced-c-programming");
    assert_eq!(slugify("  Hello   World  "), "hello-world");
    assert_eq!(slugify("Ownership & Borrowing"), "ownership-borrowing");
    assert_eq!(slugify("a -- b"), "a-b");
    assert_eq!(slugify("!!!"), "");
  }

  #[test]
  fn slugify_is_idempotent() {
    for title in ["Advanced C++ Programming!", "Ownership & Borrowing", "x-y  z"] {
      let once = slugify(title);
      assert_eq!(slugify(&once), once);
    }
  }

  #[test]
  fn parse_drops_empty_modules_and_ignores_subheadings() {
    let modules = parse_curriculum(CURRICULUM);
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].id, "rust-basics");
    assert_eq!(modules[0].objectives, vec!["Variables and mutability", "Control flow"]);
    assert_eq!(modules[1].id, "ownership-borrowing");
    assert_eq!(modules[1].objectives, vec!["Move semantics", "References"]);
  }

  #[test]
  fn list_items_before_any_heading_are_ignored() {
    let modules = parse_curriculum("- stray\n## Sub\n- also stray\n");
    assert!(modules.is_empty());
  }

  #[test]
  fn double_hash_does_not_open_a_module() {
    let modules = parse_curriculum("# One\n- a\n## Two\n- b\n");
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].objectives, vec!["a", "b"]);
  }

  #[test]
  fn generate_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let cur = dir.path().join("curriculum.md");
    let out = dir.path().join("modules.json");
    std::fs::write(&cur, CURRICULUM).unwrap();

    let written = generate_modules_document(&cur, &out).unwrap();
    let loaded = load_modules(&out).unwrap();
    assert_eq!(written, loaded);
  }

  #[test]
  fn generate_rejects_duplicate_slugs() {
    let dir = tempfile::tempdir().unwrap();
    let cur = dir.path().join("curriculum.md");
    std::fs::write(&cur, "# C++ Basics\n- a\n# C Basics\n- b\n").unwrap();
    let err = generate_modules_document(&cur, &dir.path().join("m.json")).unwrap_err();
    assert!(matches!(err, TandemError::InvalidStructure(_)));
    assert!(!dir.path().join("m.json").exists());
  }

  #[test]
  fn load_modules_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(load_modules(&missing), Err(TandemError::NotFound { .. })));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"[{"id":"a","title":"A","objectives":"nope"}]"#).unwrap();
    assert!(matches!(load_modules(&bad), Err(TandemError::InvalidStructure(_))));

    std::fs::write(&bad, r#"{"id":"a"}"#).unwrap();
    assert!(matches!(load_modules(&bad), Err(TandemError::InvalidStructure(_))));
  }

  #[test]
  fn load_modules_accepts_legacy_wrapper() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modules.json");
    std::fs::write(&path, r#"{"modules":[{"id":"m","title":"M","objectives":["x"]}]}"#).unwrap();
    let modules = load_modules(&path).unwrap();
    assert_eq!(modules[0].objective(1), Some("x"));
  }

  #[test]
  fn next_module_follows_document_order() {
    let modules = parse_curriculum(CURRICULUM);
    assert_eq!(next_module(&modules, "rust-basics").map(|m| m.id.as_str()), Some("ownership-borrowing"));
    assert!(next_module(&modules, "ownership-borrowing").is_none());
    assert!(matches!(find_module(&modules, "nope"), Err(TandemError::ModuleNotFound(_))));
  }
}
