//! Comment syntax per language and the marker grammar built on top of it.
//!
//! Marker lines look like `// TODO: [obj-2] implement the parser`, optionally preceded by
//! a criteria block headed `// SUCCESS CRITERIA for [obj-2]:`. Matching accepts every known
//! comment prefix regardless of the file's language, so mixed-syntax files still parse.
//! Annotated learner files depend on this grammar; keep it stable.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Every prefix the grammar recognizes. Longer prefixes first.
pub const KNOWN_PREFIXES: &[&str] = &["//", "--", "#", ";", "%"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommentSyntax {
  pub language: &'static str,
  pub prefix: &'static str,
}

const DEFAULT_SYNTAX: CommentSyntax = CommentSyntax { language: "unknown", prefix: "//" };

const LANGUAGES: &[(&str, CommentSyntax)] = &[
  ("rs", CommentSyntax { language: "rust", prefix: "//" }),
  ("c", CommentSyntax { language: "c", prefix: "//" }),
  ("h", CommentSyntax { language: "c", prefix: "//" }),
  ("cc", CommentSyntax { language: "cpp", prefix: "//" }),
  ("cpp", CommentSyntax { language: "cpp", prefix: "//" }),
  ("hpp", CommentSyntax { language: "cpp", prefix: "//" }),
  ("cs", CommentSyntax { language: "csharp", prefix: "//" }),
  ("go", CommentSyntax { language: "go", prefix: "//" }),
  ("java", CommentSyntax { language: "java", prefix: "//" }),
  ("kt", CommentSyntax { language: "kotlin", prefix: "//" }),
  ("scala", CommentSyntax { language: "scala", prefix: "//" }),
  ("swift", CommentSyntax { language: "swift", prefix: "//" }),
  ("dart", CommentSyntax { language: "dart", prefix: "//" }),
  ("js", CommentSyntax { language: "javascript", prefix: "//" }),
  ("mjs", CommentSyntax { language: "javascript", prefix: "//" }),
  ("jsx", CommentSyntax { language: "javascript", prefix: "//" }),
  ("ts", CommentSyntax { language: "typescript", prefix: "//" }),
  ("tsx", CommentSyntax { language: "typescript", prefix: "//" }),
  ("php", CommentSyntax { language: "php", prefix: "//" }),
  ("zig", CommentSyntax { language: "zig", prefix: "//" }),
  ("py", CommentSyntax { language: "python", prefix: "#" }),
  ("rb", CommentSyntax { language: "ruby", prefix: "#" }),
  ("sh", CommentSyntax { language: "shell", prefix: "#" }),
  ("bash", CommentSyntax { language: "shell", prefix: "#" }),
  ("zsh", CommentSyntax { language: "shell", prefix: "#" }),
  ("pl", CommentSyntax { language: "perl", prefix: "#" }),
  ("r", CommentSyntax { language: "r", prefix: "#" }),
  ("jl", CommentSyntax { language: "julia", prefix: "#" }),
  ("ex", CommentSyntax { language: "elixir", prefix: "#" }),
  ("exs", CommentSyntax { language: "elixir", prefix: "#" }),
  ("yml", CommentSyntax { language: "yaml", prefix: "#" }),
  ("yaml", CommentSyntax { language: "yaml", prefix: "#" }),
  ("toml", CommentSyntax { language: "toml", prefix: "#" }),
  ("sql", CommentSyntax { language: "sql", prefix: "--" }),
  ("lua", CommentSyntax { language: "lua", prefix: "--" }),
  ("hs", CommentSyntax { language: "haskell", prefix: "--" }),
  ("elm", CommentSyntax { language: "elm", prefix: "--" }),
  ("clj", CommentSyntax { language: "clojure", prefix: ";" }),
  ("lisp", CommentSyntax { language: "lisp", prefix: ";" }),
  ("scm", CommentSyntax { language: "scheme", prefix: ";" }),
  ("el", CommentSyntax { language: "elisp", prefix: ";" }),
  ("asm", CommentSyntax { language: "assembly", prefix: ";" }),
  ("erl", CommentSyntax { language: "erlang", prefix: "%" }),
  ("m", CommentSyntax { language: "matlab", prefix: "%" }),
  ("tex", CommentSyntax { language: "latex", prefix: "%" }),
];

/// Resolve comment syntax from the file extension. Unknown extensions use `//`.
pub fn syntax_for_path(path: &Path) -> CommentSyntax {
  let ext = match path.extension().and_then(|e| e.to_str()) {
    Some(e) => e.to_ascii_lowercase(),
    None => return DEFAULT_SYNTAX,
  };
  LANGUAGES
    .iter()
    .find(|(e, _)| *e == ext)
    .map(|(_, s)| *s)
    .unwrap_or(DEFAULT_SYNTAX)
}

fn prefix_alternation() -> String {
  KNOWN_PREFIXES.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|")
}

/// `<prefix> TODO[:] [<id>] <task>`; group 1 is the id, group 2 the task text.
pub fn todo_pattern() -> &'static Regex {
  static TODO: OnceLock<Regex> = OnceLock::new();
  TODO.get_or_init(|| {
    let pattern = format!(
      r"(?i)^\s*(?:{})\s*TODO\b:?\s*(?:\[([^\]]*)\])?\s*(.*?)\s*$",
      prefix_alternation()
    );
    Regex::new(&pattern).expect("static TODO pattern compiles")
  })
}

/// `<prefix> SUCCESS CRITERIA for [<id>][:]`, id matched literally and case-insensitively.
pub fn success_criteria_pattern(id: &str) -> Option<Regex> {
  let pattern = format!(
    r"(?i)^\s*(?:{})\s*SUCCESS\s+CRITERIA\s+for\s+\[{}\]\s*:?\s*$",
    prefix_alternation(),
    regex::escape(id)
  );
  Regex::new(&pattern).ok()
}

pub fn is_comment_line(line: &str) -> bool {
  let t = line.trim_start();
  KNOWN_PREFIXES.iter().any(|p| t.starts_with(p))
}

/// Text after the comment prefix, or the trimmed line if it is not a comment.
pub fn strip_comment_prefix(line: &str) -> &str {
  let t = line.trim_start();
  for p in KNOWN_PREFIXES {
    if let Some(rest) = t.strip_prefix(p) {
      return rest.trim();
    }
  }
  t.trim()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_prefix_by_extension() {
    assert_eq!(syntax_for_path(Path::new("src/main.rs")).prefix, "//");
    assert_eq!(syntax_for_path(Path::new("app.PY")).prefix, "#");
    assert_eq!(syntax_for_path(Path::new("q.sql")).prefix, "--");
    assert_eq!(syntax_for_path(Path::new("core.clj")).prefix, ";");
    assert_eq!(syntax_for_path(Path::new("notes.xyz")), DEFAULT_SYNTAX);
    assert_eq!(syntax_for_path(Path::new("Makefile")).prefix, "//");
  }

  #[test]
  fn todo_pattern_accepts_any_prefix_and_optional_parts() {
    let re = todo_pattern();

    let c = re.captures("    // TODO: [obj-1] write the loop").unwrap();
    assert_eq!(c.get(1).map(|m| m.as_str()), Some("obj-1"));
    assert_eq!(&c[2], "write the loop");

    let c = re.captures("# todo implement parser").unwrap();
    assert!(c.get(1).is_none());
    assert_eq!(&c[2], "implement parser");

    let c = re.captures("-- TODO:[obj-3]query").unwrap();
    assert_eq!(&c[1], "obj-3");
    assert_eq!(&c[2], "query");

    assert!(re.is_match("; TODO [x] lisp"));
    assert!(!re.is_match("let todo = 1; // not a marker TODO"));
    assert!(!re.is_match("// TODOS are fun"));
  }

  #[test]
  fn criteria_header_matches_only_its_id() {
    let re = success_criteria_pattern("obj-1").unwrap();
    assert!(re.is_match("// SUCCESS CRITERIA for [obj-1]:"));
    assert!(re.is_match("#   success criteria for [OBJ-1]"));
    assert!(!re.is_match("// SUCCESS CRITERIA for [obj-12]:"));
    assert!(!re.is_match("SUCCESS CRITERIA for [obj-1]:"));
  }

  #[test]
  fn comment_classification_and_stripping() {
    assert!(is_comment_line("   // hello"));
    assert!(is_comment_line("-- sql"));
    assert!(!is_comment_line("let x = 1;"));
    assert_eq!(strip_comment_prefix("  //   - must return true"), "- must return true");
  }
}
