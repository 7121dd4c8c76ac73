//! Error taxonomy shared by the parser, the store and the gating engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TandemError {
  /// Missing state, modules, settings or curriculum file.
  #[error("File not found: {}", path.display())]
  NotFound { path: PathBuf },

  /// Malformed JSON or a schema violation.
  #[error("Invalid structure: {0}")]
  InvalidStructure(String),

  #[error("Module not found: {0}")]
  ModuleNotFound(String),

  #[error("Objective {index} not found in module {module_id}")]
  ObjectiveNotFound { module_id: String, index: usize },

  /// Unparseable review payload. Recovered locally by `review::parse_review_response`.
  #[error("Parse failure: {0}")]
  ParseFailure(String),

  /// Destructive operation requested without an explicit confirm flag.
  #[error("Confirmation required: {0}")]
  ConfirmationRequired(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl TandemError {
  pub fn not_found(path: &Path) -> Self {
    Self::NotFound { path: path.to_path_buf() }
  }

  /// Stable machine-readable kind, used in HTTP error bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::NotFound { .. } => "not_found",
      Self::InvalidStructure(_) => "invalid_structure",
      Self::ModuleNotFound(_) => "module_not_found",
      Self::ObjectiveNotFound { .. } => "objective_not_found",
      Self::ParseFailure(_) => "parse_failure",
      Self::ConfirmationRequired(_) => "confirmation_required",
      Self::Io(_) => "io",
    }
  }

  /// Map an IO error on `path` to `NotFound` when the file is absent.
  pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
    if err.kind() == std::io::ErrorKind::NotFound {
      Self::not_found(path)
    } else {
      Self::Io(err)
    }
  }
}

impl From<serde_json::Error> for TandemError {
  fn from(e: serde_json::Error) -> Self {
    Self::InvalidStructure(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, TandemError>;
