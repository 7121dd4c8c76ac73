//! codetandem · progress and gating engine for AI-paired coding lessons.
//!
//! A curriculum is parsed into modules and objectives, learner files are scanned for
//! `TODO` markers, the marked code is reviewed, and the gating rules decide when the
//! learner may move on. State lives in JSON documents next to the learner's project.

pub mod config;
pub mod curriculum;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod gating;
pub mod grammar;
pub mod logic;
pub mod openai;
pub mod protocol;
pub mod review;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;

pub use error::{Result, TandemError};
